//! Server-side login sessions keyed by an opaque cookie token.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use tokio::sync::Mutex;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: i64,
    expires_at: Instant,
}

/// In-memory session table shared by all handlers.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    cookie_name: Arc<str>,
    ttl: Duration,
    secure: bool,
}

impl SessionStore {
    #[must_use]
    pub fn new(cookie_name: &str, ttl: Duration, secure: bool) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            cookie_name: Arc::from(cookie_name),
            ttl,
            secure,
        }
    }

    /// Starts a session for `user_id` and returns its token.
    pub async fn create(&self, user_id: i64) -> String {
        let token = new_token();
        let session = Session {
            user_id,
            expires_at: Instant::now() + self.ttl,
        };
        self.sessions.lock().await.insert(token.clone(), session);
        token
    }

    /// Resolves a token to its user. Expired sessions are dropped on sight.
    pub async fn user_id(&self, token: &str) -> Option<i64> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(token) {
            Some(s) if s.expires_at > Instant::now() => Some(s.user_id),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    pub async fn remove(&self, token: &str) {
        self.sessions.lock().await.remove(token);
    }

    /// Drops every expired session and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Finds this store's cookie among the request's `Cookie` headers.
    #[must_use]
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == &*self.cookie_name)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// `Set-Cookie` value binding `token` to the client.
    #[must_use]
    pub fn session_cookie(&self, token: &str) -> HeaderValue {
        self.cookie_header(token, self.ttl.as_secs())
    }

    /// `Set-Cookie` value that expires the client's cookie immediately.
    #[must_use]
    pub fn cleared_cookie(&self) -> HeaderValue {
        self.cookie_header("", 0)
    }

    fn cookie_header(&self, value: &str, max_age: u64) -> HeaderValue {
        let mut cookie = format!(
            "{}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
            self.cookie_name
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        match HeaderValue::from_str(&cookie) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    cookie_name = %self.cookie_name,
                    "session cookie is not a valid header value; sending an empty Set-Cookie"
                );
                HeaderValue::from_static("")
            }
        }
    }
}

fn new_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}
