//! crates/cats_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete database and the third-party image API.

use crate::domain::{CatImage, Favourite, PageRequest, Session};
use async_trait::async_trait;
use std::collections::HashSet;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The (session, image) pair is already stored under `existing_id`.
    #[error("Already exists with id {existing_id}")]
    Conflict { existing_id: i64 },
    #[error("Invalid input: {0}")]
    Invalid(String),
    /// The upstream service answered with a non-success status.
    #[error("Upstream error: {status} - {body}")]
    Upstream { status: u16, body: String },
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Session Management ---

    /// Refreshes `last_used` for the session. Returns `false` if no such session exists.
    async fn touch_session(&self, session_id: Uuid) -> PortResult<bool>;

    /// Inserts a session, or refreshes it if a concurrent request already did.
    async fn create_session(&self, session_id: Uuid) -> PortResult<Session>;

    // --- Favourites ---

    /// All favourites of the session, newest first.
    async fn list_favourites(&self, session_id: Uuid) -> PortResult<Vec<Favourite>>;

    async fn favourite_image_ids(&self, session_id: Uuid) -> PortResult<HashSet<String>>;

    async fn find_favourite(
        &self,
        session_id: Uuid,
        image_id: &str,
    ) -> PortResult<Option<Favourite>>;

    /// Stores a new favourite.
    ///
    /// Fails with `PortError::Conflict` when the session already has this image,
    /// including when a concurrent insert got there first.
    async fn insert_favourite(
        &self,
        session_id: Uuid,
        image_id: &str,
        url: &str,
    ) -> PortResult<Favourite>;

    /// Deletes the favourite only if it belongs to the session.
    /// Returns the deleted id, or `None` when nothing matched.
    async fn delete_favourite(&self, session_id: Uuid, favourite_id: i64) -> PortResult<Option<i64>>;
}

#[async_trait]
pub trait ImageGateway: Send + Sync {
    /// Lists randomly ordered images that carry breed metadata.
    async fn search_images(&self, page: PageRequest) -> PortResult<Vec<CatImage>>;

    /// Looks up one image by id. A non-success upstream answer is `PortError::NotFound`.
    async fn get_image(&self, image_id: &str) -> PortResult<CatImage>;
}
