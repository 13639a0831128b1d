use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderName},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::middleware::{CurrentUser, RequestId};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ProfileResponse {
    id: i64,
    email: String,
    name: String,
    is_owner: bool,
    member_since: DateTime<Utc>,
}

/// GET /api/v1/profile — the logged-in account, plus any pending alerts.
pub(super) async fn get_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Json<ApiResponse<ProfileResponse>> {
    let alerts = state.sessions.take_flash(&user.session_token).await;

    Json(ApiResponse {
        data: ProfileResponse {
            id: user.id,
            email: user.email,
            name: user.name,
            is_owner: user.is_owner,
            member_since: user.created_at,
        },
        meta: ResponseMeta::with_alerts(req_id.0, alerts),
    })
}

/// DELETE /api/v1/profile — delete the account and every session it holds.
///
/// Orders cascade with the account.
pub(super) async fn delete_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<CurrentUser>,
) -> Result<([(HeaderName, String); 1], Json<ApiResponse<serde_json::Value>>), ApiError> {
    farmdrop_db::delete_user(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    state.sessions.destroy_user(user.id).await;
    tracing::info!(user_id = user.id, "account deleted");

    Ok((
        [(SET_COOKIE, state.sessions.clear_cookie_header())],
        Json(ApiResponse {
            data: serde_json::json!({ "deleted": true }),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
