//! HTTP API.

use crate::share::{SessionRef, Share, ShareError, ShareService};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Header carrying the authenticated user, set by the auth layer in front of us.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub shares: Arc<ShareService>,
    /// Base of share links, without trailing slash.
    pub public_url: String,
}

impl AppState {
    fn share_url(&self, share_token: &str) -> String {
        format!("{}/shared/{}", self.public_url, share_token)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/campaigns/{campaign_id}/vtts/{vtt_id}/share",
            get(get_share).post(create_share).delete(deactivate_shares),
        )
        .route("/api/shared/{share_token}", get(resolve_share))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    NotFound,
    Share(ShareError),
}

impl From<ShareError> for ApiError {
    fn from(e: ShareError) -> Self {
        ApiError::Share(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "missing user identity".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "access not available".to_string()),
            ApiError::Share(ShareError::PermissionDenied) => {
                (StatusCode::FORBIDDEN, "permission denied".to_string())
            }
            ApiError::Share(ShareError::Conflict) => {
                (StatusCode::CONFLICT, "session is busy, try again".to_string())
            }
            ApiError::Share(ShareError::Store(e)) => {
                tracing::error!("share store failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct CreateShareResponse {
    share_token: String,
    share_url: String,
}

#[derive(Debug, Serialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
struct ShareInfo {
    share_token: String,
    share_url: String,
    created_by: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ShareInfoResponse {
    share: Option<ShareInfo>,
}

#[derive(Debug, Serialize)]
struct ResolvedShareResponse {
    campaign_id: String,
    vtt_id: String,
}

fn requester(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ApiError::Unauthorized)
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

async fn create_share(
    State(state): State<AppState>,
    Path((campaign_id, vtt_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<CreateShareResponse>), ApiError> {
    let user = requester(&headers)?;
    let session_ref = SessionRef::new(campaign_id, vtt_id);
    let share = state.shares.create_share(&session_ref, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateShareResponse {
            share_url: state.share_url(&share.share_token),
            share_token: share.share_token,
        }),
    ))
}

async fn deactivate_shares(
    State(state): State<AppState>,
    Path((campaign_id, vtt_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let user = requester(&headers)?;
    let session_ref = SessionRef::new(campaign_id, vtt_id);
    state.shares.deactivate_shares(&session_ref, &user).await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn get_share(
    State(state): State<AppState>,
    Path((campaign_id, vtt_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<ShareInfoResponse>, ApiError> {
    let user = requester(&headers)?;
    let session_ref = SessionRef::new(campaign_id, vtt_id);
    state.shares.ensure_can_manage(&session_ref, &user)?;

    let share = state
        .shares
        .find_active_share(&session_ref)?
        .map(|share: Share| ShareInfo {
            share_url: state.share_url(&share.share_token),
            share_token: share.share_token,
            created_by: share.created_by,
            created_at: share.created_at,
        });
    Ok(Json(ShareInfoResponse { share }))
}

async fn resolve_share(
    State(state): State<AppState>,
    Path(share_token): Path<String>,
) -> Result<Json<ResolvedShareResponse>, ApiError> {
    let share = state
        .shares
        .resolve_share(&share_token)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(ResolvedShareResponse {
        campaign_id: share.session_ref.campaign_id,
        vtt_id: share.session_ref.vtt_id,
    }))
}
