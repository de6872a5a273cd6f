//! Session-based signup, login and logout.

use std::sync::LazyLock;

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderName, HeaderValue},
    Extension, Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;
use crate::password::{hash_password, verify_against_placeholder, verify_password};

use super::{map_db_error, ApiError, ApiResponse, AppState};

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 120;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("valid email regex")
});

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct UserData {
    user: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct LogoutData {
    logged_out: bool,
}

type WithCookie<T> = ([(HeaderName, HeaderValue); 1], Json<ApiResponse<T>>);

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn normalize_email(req_id: &str, raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(&email) {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "email must be a valid address",
        ));
    }
    Ok(email)
}

fn validate_name(req_id: &str, raw: &str) -> Result<String, ApiError> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "name must be between 1 and 100 characters",
        ));
    }
    Ok(name.to_owned())
}

fn invalid_credentials(req_id: &str) -> ApiError {
    ApiError::new(req_id, "unauthorized", "Invalid email or password")
}

async fn start_session(state: &AppState, user_id: i64) -> [(HeaderName, HeaderValue); 1] {
    let token = state.sessions.create(user_id).await;
    [(SET_COOKIE, state.sessions.session_cookie(&token))]
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup: register and log in.
pub(super) async fn signup(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SignupRequest>,
) -> Result<WithCookie<UserData>, ApiError> {
    let rid = &req_id.0;

    let name = validate_name(rid, &body.name)?;
    let email = normalize_email(rid, &body.email)?;
    if body.password.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "password must not be empty",
        ));
    }

    let rounds = state.password_rounds;
    let password = body.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, rounds))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing task failed");
            ApiError::new(rid, "internal_error", "could not create account")
        })?;

    let user = lumina_db::create_user(
        &state.pool,
        lumina_db::NewUser {
            name: &name,
            email: &email,
            password_hash: &password_hash,
        },
    )
    .await
    .map_err(|e| match e {
        lumina_db::DbError::Conflict(_) => {
            ApiError::new(rid, "conflict", "Email already registered")
        }
        other => map_db_error(rid.clone(), &other),
    })?;

    tracing::info!(user_id = user.id, "user registered");
    let cookie = start_session(&state, user.id).await;

    Ok((
        cookie,
        Json(ApiResponse::new(
            UserData {
                user: Some(user.name),
            },
            req_id.0,
        )),
    ))
}

/// POST /api/v1/auth/login: verify credentials and start a session.
pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<WithCookie<UserData>, ApiError> {
    let rid = &req_id.0;

    let email = body.email.trim().to_lowercase();
    let user = lumina_db::get_user_by_email(&state.pool, &email)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    // Unknown emails still pay for a full key derivation.
    let stored = user.as_ref().map(|u| u.password_hash.clone());
    let rounds = state.password_rounds;
    let password = body.password;
    let verified = tokio::task::spawn_blocking(move || match stored {
        Some(hash) => verify_password(&password, &hash),
        None => verify_against_placeholder(&password, rounds),
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "password verification task failed");
        ApiError::new(rid, "internal_error", "could not verify credentials")
    })?;

    let Some(user) = user.filter(|_| verified) else {
        tracing::warn!("login attempt with unknown email or wrong password");
        return Err(invalid_credentials(rid));
    };

    let cookie = start_session(&state, user.id).await;

    Ok((
        cookie,
        Json(ApiResponse::new(
            UserData {
                user: Some(user.name),
            },
            req_id.0,
        )),
    ))
}

/// POST /api/v1/auth/logout: drop the current session, if any.
pub(super) async fn logout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> WithCookie<LogoutData> {
    if let Some(token) = state.sessions.token_from_headers(&headers) {
        state.sessions.remove(&token).await;
    }

    (
        [(SET_COOKIE, state.sessions.cleared_cookie())],
        Json(ApiResponse::new(LogoutData { logged_out: true }, req_id.0)),
    )
}

/// GET /api/v1/auth/me: name of the logged-in user, or `null`.
pub(super) async fn me(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let user_id = match state.sessions.token_from_headers(&headers) {
        Some(token) => state.sessions.user_id(&token).await,
        None => None,
    };

    let user = match user_id {
        Some(id) => lumina_db::get_user_by_id(&state.pool, id)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?
            .map(|row| row.name),
        None => None,
    };

    Ok(Json(ApiResponse::new(UserData { user }, req_id.0)))
}
