// Shared-secret gate for mutating API requests.
// GET / HEAD pass through; everything else needs the x-tracker-secret header
// when a secret is configured.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::AppState;

pub const SECRET_HEADER: &str = "x-tracker-secret";

pub async fn require_secret(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if matches!(*req.method(), Method::GET | Method::HEAD) {
        return next.run(req).await;
    }

    if let Some(secret) = state.config.secret.as_deref() {
        let supplied = req
            .headers()
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if supplied != Some(secret) {
            tracing::warn!(method = %req.method(), uri = %req.uri(), "rejected request without secret");
            return AppError::Forbidden.into_response();
        }
    }

    next.run(req).await
}
