//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-request session context.

use crate::config::Config;
use cats_core::ports::{DatabaseService, ImageGateway};
use std::sync::Arc;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub images: Arc<dyn ImageGateway>,
    pub config: Arc<Config>,
}

//=========================================================================================
// SessionContext (Specific to One Request)
//=========================================================================================

/// The caller's session, resolved by the session middleware and handed to
/// handlers as `Extension<SessionContext>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    pub id: Uuid,
    /// `true` when the session was minted for this request and a cookie must be set.
    pub is_new: bool,
}
