//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::HandlerError;
use crate::web::state::{AppState, SessionContext};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use cats_core::domain::{annotate, AnnotatedImage, Favourite, PageRequest};
use cats_core::ports::PortError;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        root_handler,
        list_images_handler,
        list_favourites_handler,
        add_favourite_handler,
        remove_favourite_handler,
    ),
    components(
        schemas(
            WelcomeResponse,
            ImageResponse,
            FavouriteResponse,
            AddFavouriteRequest,
            RemovedResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "Cats API", description = "Browse cat images and keep per-session favourites.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,
}

/// An upstream image with the caller's favourite flag.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImageResponse {
    pub id: String,
    pub url: String,
    pub is_favorite: bool,
}

impl From<AnnotatedImage> for ImageResponse {
    fn from(img: AnnotatedImage) -> Self {
        Self {
            id: img.id,
            url: img.url,
            is_favorite: img.is_favorite,
        }
    }
}

impl From<ImageResponse> for AnnotatedImage {
    fn from(img: ImageResponse) -> Self {
        Self {
            id: img.id,
            url: img.url,
            is_favorite: img.is_favorite,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FavouriteResponse {
    pub id: i64,
    pub image_id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl From<Favourite> for FavouriteResponse {
    fn from(fav: Favourite) -> Self {
        Self {
            id: fav.id,
            image_id: fav.image_id,
            url: fav.url,
            created_at: fav.created_at,
        }
    }
}

impl From<FavouriteResponse> for Favourite {
    fn from(fav: FavouriteResponse) -> Self {
        Self {
            id: fav.id,
            image_id: fav.image_id,
            url: fav.url,
            created_at: fav.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AddFavouriteRequest {
    pub image_id: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RemovedResponse {
    pub message: String,
    pub id: i64,
}

/// Body of every 4xx/5xx response. `id` is only set on conflicts.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImagesQuery {
    /// Page number, 0 when absent or invalid.
    pub page: Option<String>,
    /// Page size, 20 when absent, invalid, or zero.
    pub limit: Option<String>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Greets the caller and reports their session id.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Session assigned", body = WelcomeResponse)
    )
)]
pub async fn root_handler(Extension(session): Extension<SessionContext>) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to Cats Pinterest!".to_string(),
        session_id: session.id,
    })
}

/// List a page of random cat images, annotated with the caller's favourites.
#[utoipa::path(
    get,
    path = "/images",
    params(ImagesQuery),
    responses(
        (status = 200, description = "Annotated images", body = [ImageResponse]),
        (status = 500, description = "Cat API or database failure", body = ErrorResponse)
    )
)]
pub async fn list_images_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<ImagesQuery>,
) -> Result<Json<Vec<ImageResponse>>, HandlerError> {
    let page = PageRequest::from_raw(query.page.as_deref(), query.limit.as_deref());
    let images = app_state.images.search_images(page).await?;
    let favourite_ids = app_state.db.favourite_image_ids(session.id).await?;

    let annotated = annotate(images, &favourite_ids)
        .into_iter()
        .map(ImageResponse::from)
        .collect();
    Ok(Json(annotated))
}

/// List the caller's favourites, newest first.
#[utoipa::path(
    get,
    path = "/favourites",
    responses(
        (status = 200, description = "Favourites, newest first", body = [FavouriteResponse]),
        (status = 500, description = "Database failure", body = ErrorResponse)
    )
)]
pub async fn list_favourites_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Vec<FavouriteResponse>>, HandlerError> {
    let favourites = app_state.db.list_favourites(session.id).await?;
    Ok(Json(favourites.into_iter().map(FavouriteResponse::from).collect()))
}

/// Add an image to the caller's favourites after verifying it upstream.
#[utoipa::path(
    post,
    path = "/favourites",
    request_body = AddFavouriteRequest,
    responses(
        (status = 201, description = "Favourite created", body = FavouriteResponse),
        (status = 400, description = "Missing image_id or invalid upstream URL", body = ErrorResponse),
        (status = 404, description = "Image not found in the cat API", body = ErrorResponse),
        (status = 409, description = "Already a favourite; `id` names the existing row", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn add_favourite_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<FavouriteResponse>), HandlerError> {
    // 1. Require an image id
    let image_id = payload
        .ok()
        .and_then(|Json(body)| image_id_from(&body))
        .ok_or_else(|| HandlerError::BadRequest("image_id is required".to_string()))?;

    // 2. Verify the image upstream
    let image = app_state
        .images
        .get_image(&image_id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => HandlerError::NotFound("Image not found in CatAPI".to_string()),
            other => other.into(),
        })?;

    // 3. Only keep well-formed URLs
    if !is_valid_image_url(&image.url) {
        return Err(HandlerError::BadRequest(
            "Invalid image URL from CatAPI".to_string(),
        ));
    }

    // 4. Reject duplicates
    if let Some(existing) = app_state.db.find_favourite(session.id, &image_id).await? {
        return Err(already_favourite(existing.id));
    }

    // 5. Store it; a concurrent insert of the same pair surfaces as a conflict
    let favourite = app_state
        .db
        .insert_favourite(session.id, &image_id, &image.url)
        .await
        .map_err(|e| match e {
            PortError::Conflict { existing_id } => already_favourite(existing_id),
            other => other.into(),
        })?;

    info!("Session {} favourited image {}", session.id, favourite.image_id);
    Ok((StatusCode::CREATED, Json(favourite.into())))
}

/// Remove one of the caller's favourites.
#[utoipa::path(
    delete,
    path = "/favourites/{id}",
    params(
        ("id" = i64, Path, description = "Id of the favourite row")
    ),
    responses(
        (status = 200, description = "Favourite removed", body = RemovedResponse),
        (status = 404, description = "No such favourite for this session", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn remove_favourite_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session): Extension<SessionContext>,
    Path(raw_id): Path<String>,
) -> Result<Json<RemovedResponse>, HandlerError> {
    let not_found = || HandlerError::NotFound("Favorite not found".to_string());

    let favourite_id = raw_id.parse::<i64>().map_err(|_| not_found())?;
    let deleted = app_state
        .db
        .delete_favourite(session.id, favourite_id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(RemovedResponse {
        message: "Favorite removed".to_string(),
        id: deleted,
    }))
}

fn already_favourite(id: i64) -> HandlerError {
    HandlerError::Conflict {
        message: "Cat already in favorites".to_string(),
        id,
    }
}

/// Reads `image_id` from an add-favourite body. Non-empty strings are taken as
/// is and non-zero numbers by their decimal text; anything else is missing.
fn image_id_from(body: &Value) -> Option<String> {
    match body.get("image_id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts absolute `http`/`https` URLs that name a host.
pub fn is_valid_image_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}
