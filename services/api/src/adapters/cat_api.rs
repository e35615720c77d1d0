//! services/api/src/adapters/cat_api.rs
//!
//! This module contains the adapter for the third-party cat image API.
//! It implements the `ImageGateway` port from the `core` crate.

use async_trait::async_trait;
use cats_core::domain::{CatImage, PageRequest};
use cats_core::ports::{ImageGateway, PortError, PortResult};
use reqwest::{Client, Url};
use serde::Deserialize;

const API_KEY_HEADER: &str = "x-api-key";

/// Stored ids live in a `VARCHAR(255)` column.
const MAX_IMAGE_ID_LEN: usize = 255;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ImageGateway` port over HTTP.
#[derive(Clone)]
pub struct CatApiAdapter {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CatApiAdapter {
    /// Creates a new `CatApiAdapter`.
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn base(&self) -> PortResult<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| PortError::Unexpected(format!("Invalid cat API base URL: {}", e)))
    }

    fn endpoint(&self, segments: &[&str]) -> PortResult<Url> {
        let mut url = self.base()?;
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected("Cat API base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn search_url(&self, page: PageRequest) -> PortResult<Url> {
        let mut url = self.endpoint(&["images", "search"])?;
        url.query_pairs_mut()
            .append_pair("limit", &page.limit.to_string())
            .append_pair("page", &page.page.to_string())
            .append_pair("has_breeds", "1")
            .append_pair("order", "RAND");
        Ok(url)
    }

    /// `.` and `..` would be resolved as dot segments and `search` names the
    /// listing endpoint, so none of them can address a single image.
    pub(crate) fn image_url(&self, image_id: &str) -> PortResult<Url> {
        let addressable = !image_id.is_empty()
            && image_id.len() <= MAX_IMAGE_ID_LEN
            && !matches!(image_id, "." | ".." | "search");
        if !addressable {
            return Err(PortError::NotFound(format!("Image {} not found in CatAPI", image_id)));
        }
        self.endpoint(&["images", image_id])
    }
}

//=========================================================================================
// Upstream Payloads
//=========================================================================================

#[derive(Deserialize)]
struct ImageRecord {
    id: String,
    #[serde(default)]
    url: Option<String>,
}
impl ImageRecord {
    fn to_domain(self) -> CatImage {
        CatImage {
            id: self.id,
            url: self.url.unwrap_or_default(),
        }
    }
}

//=========================================================================================
// `ImageGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl ImageGateway for CatApiAdapter {
    async fn search_images(&self, page: PageRequest) -> PortResult<Vec<CatImage>> {
        let response = self
            .client
            .get(self.search_url(page)?)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PortError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let records: Vec<ImageRecord> = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed cat API listing: {}", e)))?;
        Ok(records.into_iter().map(ImageRecord::to_domain).collect())
    }

    async fn get_image(&self, image_id: &str) -> PortResult<CatImage> {
        let response = self
            .client
            .get(self.image_url(image_id)?)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PortError::NotFound(format!("Image {} not found in CatAPI", image_id)));
        }

        let record: ImageRecord = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed cat API image: {}", e)))?;
        Ok(record.to_domain())
    }
}
