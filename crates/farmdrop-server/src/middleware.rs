use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::COOKIE, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::AppState;
use crate::session::session_cookie_value;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The logged-in account, inserted by [`load_session`] when the request
/// carries a valid session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub is_owner: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub session_token: String,
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Sliding fixed-window limiter for simple API protection.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    state: Arc<Mutex<RateLimitWindow>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(RateLimitWindow {
                started_at: Instant::now(),
                count: 0,
            })),
        }
    }
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

fn middleware_error(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            error: MiddlewareError { code, message },
        }),
    )
        .into_response()
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Resolves the session cookie to a [`CurrentUser`] extension.
///
/// Requests without a valid session pass through anonymously. A session whose
/// account no longer exists is destroyed.
pub async fn load_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let cookie = req
        .headers()
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_cookie_value)
        .map(ToOwned::to_owned);

    if let Some(cookie) = cookie {
        if let Some(session) = state.sessions.resolve(&cookie).await {
            match farmdrop_db::get_user_by_id(&state.pool, session.user_id).await {
                Ok(Some(user)) => {
                    req.extensions_mut().insert(CurrentUser {
                        id: user.id,
                        email: user.email,
                        name: user.name,
                        is_owner: user.is_owner,
                        created_at: user.created_at,
                        session_token: session.token,
                    });
                }
                Ok(None) => state.sessions.destroy(&session.token).await,
                Err(e) => {
                    tracing::error!(error = %e, "failed to load session user");
                    return middleware_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        "database query failed",
                    );
                }
            }
        }
    }

    next.run(req).await
}

/// Rejects anonymous requests with 401.
pub async fn require_login(req: Request, next: Next) -> Response {
    if req.extensions().get::<CurrentUser>().is_none() {
        return middleware_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "log in to continue",
        );
    }
    next.run(req).await
}

/// Rejects anonymous requests with 401 and non-owners with 403.
pub async fn require_owner(req: Request, next: Next) -> Response {
    match req.extensions().get::<CurrentUser>() {
        None => middleware_error(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "log in to continue",
        ),
        Some(user) if !user.is_owner => {
            tracing::warn!(user_id = user.id, "non-owner attempted owner-only route");
            middleware_error(
                StatusCode::FORBIDDEN,
                "forbidden",
                "only the farm owner can do that",
            )
        }
        Some(_) => next.run(req).await,
    }
}

/// Middleware enforcing a fixed request-per-window limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let mut window = rate_limit.state.lock().await;
    let elapsed = window.started_at.elapsed();

    if elapsed >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        return middleware_error(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded",
        );
    }

    window.count += 1;
    drop(window);

    next.run(req).await
}
