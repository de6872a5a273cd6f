//! PBKDF2-HMAC-SHA256 password hashing.
//!
//! Encoded form: `pbkdf2:sha256:<rounds>$<salt hex>$<hash hex>`. The round
//! count travels with the hash, so raising [`DEFAULT_ROUNDS`] does not
//! invalidate existing accounts.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

pub const DEFAULT_ROUNDS: u32 = 600_000;

const SCHEME: &str = "pbkdf2:sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

#[must_use]
pub fn hash_password(password: &str, rounds: u32) -> String {
    let salt: [u8; SALT_LEN] = rand::random();
    let rounds = rounds.max(1);
    let hash = derive(password, &salt, rounds);
    format!(
        "{SCHEME}:{rounds}${}${}",
        hex::encode(salt),
        hex::encode(hash)
    )
}

/// Checks `password` against an encoded hash. Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let Some((rounds, salt, expected)) = parse_encoded(encoded) else {
        tracing::warn!("stored password hash has an unrecognized format");
        return false;
    };
    let derived = derive(password, &salt, rounds);
    derived[..].ct_eq(&expected[..]).into()
}

/// Verifies against a fixed hash that no password matches, so a failed
/// account lookup costs the same key derivation as a real check.
#[must_use]
pub fn verify_against_placeholder(password: &str, rounds: u32) -> bool {
    verify_password(password, &placeholder_hash(rounds))
}

fn placeholder_hash(rounds: u32) -> String {
    format!(
        "{SCHEME}:{}${}${}",
        rounds.max(1),
        hex::encode([0u8; SALT_LEN]),
        hex::encode([0u8; HASH_LEN])
    )
}

fn derive(password: &str, salt: &[u8], rounds: u32) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut out);
    out
}

fn parse_encoded(encoded: &str) -> Option<(u32, Vec<u8>, [u8; HASH_LEN])> {
    let mut parts = encoded.split('$');
    let method = parts.next()?;
    let salt = hex::decode(parts.next()?).ok()?;
    let hash = hex::decode(parts.next()?).ok()?;
    if parts.next().is_some() {
        return None;
    }

    let rounds = method.strip_prefix(SCHEME)?.strip_prefix(':')?.parse().ok()?;
    if rounds == 0 {
        return None;
    }
    let hash: [u8; HASH_LEN] = hash.try_into().ok()?;
    Some((rounds, salt, hash))
}
