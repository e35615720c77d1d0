//! services/api/src/client.rs
//!
//! A typed HTTP client for the cats REST API. The cookie store keeps the
//! `session_id` cookie across calls, so one client is one browsing session.

use crate::web::rest::{
    AddFavouriteRequest, ErrorResponse, FavouriteResponse, ImageResponse, RemovedResponse,
    WelcomeResponse,
};
use cats_core::domain::{AnnotatedImage, Favourite, PageRequest};
use cats_core::ports::{PortError, PortResult};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

#[derive(Clone)]
pub struct CatsClient {
    http: Client,
    base_url: String,
}

impl CatsClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Opens (or resumes) the session and returns its id.
    pub async fn welcome(&self) -> PortResult<Uuid> {
        let response = self.http.get(self.url("/")).send().await.map_err(transport)?;
        let body: WelcomeResponse = read_json(response).await?;
        Ok(body.session_id)
    }

    pub async fn list_images(&self, page: PageRequest) -> PortResult<Vec<AnnotatedImage>> {
        let response = self
            .http
            .get(self.url("/images"))
            .query(&[("page", page.page), ("limit", page.limit)])
            .send()
            .await
            .map_err(transport)?;
        let images: Vec<ImageResponse> = read_json(response).await?;
        Ok(images.into_iter().map(AnnotatedImage::from).collect())
    }

    pub async fn list_favourites(&self) -> PortResult<Vec<Favourite>> {
        let response = self
            .http
            .get(self.url("/favourites"))
            .send()
            .await
            .map_err(transport)?;
        let favourites: Vec<FavouriteResponse> = read_json(response).await?;
        Ok(favourites.into_iter().map(Favourite::from).collect())
    }

    pub async fn add_favourite(&self, image_id: &str) -> PortResult<Favourite> {
        let response = self
            .http
            .post(self.url("/favourites"))
            .json(&AddFavouriteRequest {
                image_id: Some(image_id.to_string()),
            })
            .send()
            .await
            .map_err(transport)?;
        let favourite: FavouriteResponse = read_json(response).await?;
        Ok(favourite.into())
    }

    pub async fn remove_favourite(&self, favourite_id: i64) -> PortResult<i64> {
        let response = self
            .http
            .delete(self.url(&format!("/favourites/{}", favourite_id)))
            .send()
            .await
            .map_err(transport)?;
        let removed: RemovedResponse = read_json(response).await?;
        Ok(removed.id)
    }
}

fn transport(e: reqwest::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

async fn read_json<T: DeserializeOwned>(response: Response) -> PortResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed API response: {}", e)));
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_from_status(status, &body))
}

/// Maps a non-success API response onto the port error taxonomy.
pub fn error_from_status(status: StatusCode, body: &str) -> PortError {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok();
    let message = parsed
        .as_ref()
        .map(|e| e.error.clone())
        .unwrap_or_else(|| body.to_string());

    match status {
        StatusCode::NOT_FOUND => PortError::NotFound(message),
        StatusCode::BAD_REQUEST => PortError::Invalid(message),
        StatusCode::CONFLICT => match parsed.and_then(|e| e.id) {
            Some(existing_id) => PortError::Conflict { existing_id },
            None => PortError::Upstream {
                status: status.as_u16(),
                body: body.to_string(),
            },
        },
        _ => PortError::Upstream {
            status: status.as_u16(),
            body: body.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_carries_existing_id() {
        let err = error_from_status(
            StatusCode::CONFLICT,
            r#"{"error":"Cat already in favorites","id":12}"#,
        );
        assert!(matches!(err, PortError::Conflict { existing_id: 12 }));
    }

    #[test]
    fn client_errors_keep_the_message() {
        let err = error_from_status(StatusCode::NOT_FOUND, r#"{"error":"Favorite not found"}"#);
        assert!(matches!(err, PortError::NotFound(m) if m == "Favorite not found"));

        let err = error_from_status(StatusCode::BAD_REQUEST, r#"{"error":"image_id is required"}"#);
        assert!(matches!(err, PortError::Invalid(m) if m == "image_id is required"));
    }

    #[test]
    fn server_errors_keep_status_and_body() {
        let err = error_from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, PortError::Upstream { status: 500, body } if body == "boom"));
    }
}
