//! services/api/src/web/middleware.rs
//!
//! Session assignment and error rendering middleware.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use cats_core::ports::{DatabaseService, PortResult};
use chrono::Duration;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::RuntimeMode;
use crate::error::{internal_body, InternalDetail};
use crate::web::state::{AppState, SessionContext};

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session_id";
/// Lifetime of the session cookie.
pub const SESSION_COOKIE_DAYS: i64 = 180;

/// Middleware that resolves the caller's anonymous session.
///
/// A missing, malformed, or unknown `session_id` cookie gets a freshly minted
/// session and a `Set-Cookie` on the response. A known one has its
/// last-used timestamp refreshed. The resolved `SessionContext` is inserted
/// into request extensions for handlers to use.
pub async fn assign_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    // 1. Parse session ID from cookie
    let cookie_id = session_id_from_headers(req.headers());

    // 2. Refresh the session, or mint a new one
    let session = match resolve_session(state.db.as_ref(), cookie_id).await {
        Ok(session) => session,
        Err(e) => {
            error!("Session error: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Session management error" })),
            )
                .into_response();
        }
    };

    // 3. Insert the session into request extensions and continue to the handler
    req.extensions_mut().insert(session);
    let mut response = next.run(req).await;

    // 4. Hand the new id to the browser
    if session.is_new {
        match HeaderValue::from_str(&session_cookie(session.id, state.config.mode)) {
            Ok(cookie) => {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            Err(e) => error!("Failed to build session cookie: {:?}", e),
        }
    }
    response
}

async fn resolve_session(
    db: &dyn DatabaseService,
    cookie_id: Option<Uuid>,
) -> PortResult<SessionContext> {
    if let Some(id) = cookie_id {
        if db.touch_session(id).await? {
            return Ok(SessionContext { id, is_new: false });
        }
        debug!("Session {} from cookie is unknown, minting a new one", id);
    }

    let id = Uuid::new_v4();
    db.create_session(id).await?;
    debug!("Assigned new session {}", id);
    Ok(SessionContext { id, is_new: true })
}

/// Extracts the session id from the `Cookie` headers. Values that are not
/// UUIDs are ignored.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| c.trim().strip_prefix("session_id="))
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
}

/// Builds the `Set-Cookie` value for a session.
pub fn session_cookie(session_id: Uuid, mode: RuntimeMode) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        SESSION_COOKIE,
        session_id,
        Duration::days(SESSION_COOKIE_DAYS).num_seconds()
    );
    if mode.is_production() {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Middleware that renders internal failures.
///
/// Outside production the 500 body carries the failure detail; in production
/// it keeps the generic message set by `HandlerError`.
pub async fn render_errors(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    if state.config.mode.is_production() {
        return response;
    }
    let detail = response
        .extensions()
        .get::<InternalDetail>()
        .map(|d| d.0.clone());
    match detail {
        Some(detail) => (response.status(), Json(internal_body(&detail))).into_response(),
        None => response,
    }
}
