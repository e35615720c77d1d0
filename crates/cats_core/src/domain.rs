//! crates/cats_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// Page used when the caller does not ask for one.
pub const DEFAULT_PAGE: u32 = 0;
/// Number of images per page when the caller does not ask for a size.
pub const DEFAULT_LIMIT: u32 = 20;

/// An anonymous browser identity, correlated through the `session_id` cookie.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub last_used: DateTime<Utc>,
}

/// A cat image the owning session has marked as a favourite.
///
/// Rows are always read through a session scope, so the owner is not carried here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favourite {
    pub id: i64,
    pub image_id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// An image as reported by the upstream cat API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatImage {
    pub id: String,
    /// Empty when the upstream omitted it.
    pub url: String,
}

/// An upstream image annotated with the caller's favourite status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedImage {
    pub id: String,
    pub url: String,
    pub is_favorite: bool,
}

/// Pagination parameters passed through to the upstream image listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Builds a request from raw query-string values.
    ///
    /// Absent, unparsable and zero values all fall back to the defaults.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: parse_positive(page).unwrap_or(DEFAULT_PAGE),
            limit: parse_positive(limit).unwrap_or(DEFAULT_LIMIT),
        }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
}

/// Marks every image whose id is among the session's favourited image ids.
/// Upstream order is preserved.
pub fn annotate(images: Vec<CatImage>, favourite_ids: &HashSet<String>) -> Vec<AnnotatedImage> {
    images
        .into_iter()
        .map(|img| AnnotatedImage {
            is_favorite: favourite_ids.contains(&img.id),
            id: img.id,
            url: img.url,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str) -> CatImage {
        CatImage {
            id: id.to_string(),
            url: format!("https://cdn.example/{id}.jpg"),
        }
    }

    #[test]
    fn page_request_defaults_when_absent() {
        assert_eq!(PageRequest::from_raw(None, None), PageRequest::new(0, 20));
    }

    #[test]
    fn page_request_parses_values() {
        assert_eq!(
            PageRequest::from_raw(Some("3"), Some("10")),
            PageRequest::new(3, 10)
        );
    }

    #[test]
    fn page_request_falls_back_on_garbage_and_zero() {
        assert_eq!(
            PageRequest::from_raw(Some("abc"), Some("0")),
            PageRequest::new(0, 20)
        );
        assert_eq!(
            PageRequest::from_raw(Some("-2"), Some("")),
            PageRequest::new(0, 20)
        );
    }

    #[test]
    fn annotate_marks_only_favourited_images() {
        let favs: HashSet<String> = ["b".to_string()].into_iter().collect();
        let out = annotate(vec![image("a"), image("b"), image("c")], &favs);

        let flags: Vec<(&str, bool)> = out.iter().map(|i| (i.id.as_str(), i.is_favorite)).collect();
        assert_eq!(flags, vec![("a", false), ("b", true), ("c", false)]);
        assert_eq!(out[1].url, "https://cdn.example/b.jpg");
    }
}
