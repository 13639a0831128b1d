//! Account signup, login, and logout.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::{CurrentUser, RequestId};
use crate::password::{hash_password, verify_password};

use super::{map_db_error, map_unique_violation, ApiError, ApiResponse, AppState, ResponseMeta};

const MIN_PASSWORD_LEN: usize = 8;

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
pub(super) struct AccountResponse {
    id: i64,
    email: String,
    name: String,
    is_owner: bool,
}

type WithCookie<T> = (StatusCode, [(axum::http::HeaderName, String); 1], Json<ApiResponse<T>>);

fn validate_signup(rid: &str, body: &SignupRequest) -> Result<(), ApiError> {
    let name = body.name.trim();
    if name.is_empty() || name.chars().count() > 100 {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "name must be 1-100 characters",
        ));
    }
    let email = body.email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed || email.len() > 254 {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "email must be a valid address",
        ));
    }
    if body.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

/// POST /auth/signup — create an account and log it in.
pub(super) async fn signup(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SignupRequest>,
) -> Result<WithCookie<AccountResponse>, ApiError> {
    let rid = &req_id.0;
    validate_signup(rid, &body)?;

    let password = body.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(anyhow::Error::from)
        .and_then(|r| r)
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            ApiError::new(rid, "internal_error", "could not create account")
        })?;

    let user = farmdrop_db::create_user(&state.pool, &body.email, &body.name, &password_hash)
        .await
        .map_err(|e| map_unique_violation(rid, &e, "an account with that email already exists"))?;

    let session = state.sessions.create(user.id).await;
    state
        .sessions
        .push_flash(&session.token, format!("Welcome to the farm, {}!", user.name))
        .await;
    tracing::info!(user_id = user.id, "account created");

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, state.sessions.cookie_header(&session))],
        Json(ApiResponse {
            data: AccountResponse {
                id: user.id,
                email: user.email,
                name: user.name,
                is_owner: user.is_owner,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// POST /auth/login — verify credentials and start a session.
pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<WithCookie<AccountResponse>, ApiError> {
    let rid = &req_id.0;
    let invalid = || ApiError::new(rid, "unauthorized", "invalid email or password");

    let user = farmdrop_db::get_user_by_email(&state.pool, &body.email)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(invalid)?;

    let password = body.password;
    let stored = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .unwrap_or(false);
    if !matches {
        tracing::info!(user_id = user.id, "login rejected");
        return Err(invalid());
    }

    let session = state.sessions.create(user.id).await;
    state
        .sessions
        .push_flash(&session.token, format!("Welcome back, {}!", user.name))
        .await;
    tracing::info!(user_id = user.id, "logged in");

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, state.sessions.cookie_header(&session))],
        Json(ApiResponse {
            data: AccountResponse {
                id: user.id,
                email: user.email,
                name: user.name,
                is_owner: user.is_owner,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// POST /auth/logout — end the current session, if any.
pub(super) async fn logout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    user: Option<Extension<CurrentUser>>,
) -> WithCookie<serde_json::Value> {
    if let Some(Extension(user)) = user {
        state.sessions.destroy(&user.session_token).await;
    }

    (
        StatusCode::OK,
        [(SET_COOKIE, state.sessions.clear_cookie_header())],
        Json(ApiResponse {
            data: serde_json::json!({ "logged_out": true }),
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}
