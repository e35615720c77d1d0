//! In-memory stand-ins for the database and the cat API, plus request helpers.

#![allow(dead_code)]

use api_lib::config::Config;
use api_lib::web::{router, state::AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use cats_core::domain::{CatImage, Favourite, PageRequest, Session};
use cats_core::ports::{DatabaseService, ImageGateway, PortError, PortResult};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

//=========================================================================================
// Fake Database
//=========================================================================================

#[derive(Default)]
struct DbState {
    sessions: HashMap<Uuid, DateTime<Utc>>,
    favourites: Vec<(Uuid, Favourite)>,
    next_id: i64,
    ticks: i64,
}

impl DbState {
    /// A clock that moves forward one second per reading.
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(self.ticks)
    }
}

#[derive(Default)]
pub struct FakeDb {
    state: Mutex<DbState>,
    pub fail_sessions: bool,
    /// Lookups miss rows that inserts still collide with, as when another
    /// request commits the same favourite between the two queries.
    pub lookups_lag_inserts: bool,
}

impl FakeDb {
    pub fn failing_sessions() -> Self {
        Self {
            fail_sessions: true,
            ..Self::default()
        }
    }

    pub fn lagging_lookups() -> Self {
        Self {
            lookups_lag_inserts: true,
            ..Self::default()
        }
    }

    pub fn session_count(&self) -> usize {
        self.state.lock().unwrap().sessions.len()
    }

    pub fn last_used(&self, id: Uuid) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().sessions.get(&id).copied()
    }

    pub fn favourite_count(&self, session_id: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .favourites
            .iter()
            .filter(|(owner, _)| *owner == session_id)
            .count()
    }
}

#[async_trait]
impl DatabaseService for FakeDb {
    async fn touch_session(&self, session_id: Uuid) -> PortResult<bool> {
        if self.fail_sessions {
            return Err(PortError::Unexpected("connection refused".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let now = state.now();
        match state.sessions.get_mut(&session_id) {
            Some(last_used) => {
                *last_used = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_session(&self, session_id: Uuid) -> PortResult<Session> {
        if self.fail_sessions {
            return Err(PortError::Unexpected("connection refused".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let now = state.now();
        state.sessions.insert(session_id, now);
        Ok(Session {
            id: session_id,
            last_used: now,
        })
    }

    async fn list_favourites(&self, session_id: Uuid) -> PortResult<Vec<Favourite>> {
        let state = self.state.lock().unwrap();
        let mut list: Vec<Favourite> = state
            .favourites
            .iter()
            .filter(|(owner, _)| *owner == session_id)
            .map(|(_, fav)| fav.clone())
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn favourite_image_ids(&self, session_id: Uuid) -> PortResult<HashSet<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .favourites
            .iter()
            .filter(|(owner, _)| *owner == session_id)
            .map(|(_, fav)| fav.image_id.clone())
            .collect())
    }

    async fn find_favourite(&self, session_id: Uuid, image_id: &str) -> PortResult<Option<Favourite>> {
        if self.lookups_lag_inserts {
            return Ok(None);
        }
        let state = self.state.lock().unwrap();
        Ok(state
            .favourites
            .iter()
            .find(|(owner, fav)| *owner == session_id && fav.image_id == image_id)
            .map(|(_, fav)| fav.clone()))
    }

    async fn insert_favourite(&self, session_id: Uuid, image_id: &str, url: &str) -> PortResult<Favourite> {
        let mut state = self.state.lock().unwrap();
        if let Some((_, existing)) = state
            .favourites
            .iter()
            .find(|(owner, fav)| *owner == session_id && fav.image_id == image_id)
        {
            return Err(PortError::Conflict {
                existing_id: existing.id,
            });
        }
        state.next_id += 1;
        let favourite = Favourite {
            id: state.next_id,
            image_id: image_id.to_string(),
            url: url.to_string(),
            created_at: state.now(),
        };
        state.favourites.push((session_id, favourite.clone()));
        Ok(favourite)
    }

    async fn delete_favourite(&self, session_id: Uuid, favourite_id: i64) -> PortResult<Option<i64>> {
        let mut state = self.state.lock().unwrap();
        let position = state
            .favourites
            .iter()
            .position(|(owner, fav)| *owner == session_id && fav.id == favourite_id);
        Ok(position.map(|i| state.favourites.remove(i).1.id))
    }
}

//=========================================================================================
// Fake Cat API
//=========================================================================================

#[derive(Default)]
pub struct FakeCatApi {
    images: Vec<CatImage>,
    pub search_failure: Option<(u16, String)>,
}

impl FakeCatApi {
    pub fn with_images(images: &[(&str, &str)]) -> Self {
        Self {
            images: images
                .iter()
                .map(|(id, url)| CatImage {
                    id: id.to_string(),
                    url: url.to_string(),
                })
                .collect(),
            search_failure: None,
        }
    }
}

#[async_trait]
impl ImageGateway for FakeCatApi {
    async fn search_images(&self, page: PageRequest) -> PortResult<Vec<CatImage>> {
        if let Some((status, body)) = &self.search_failure {
            return Err(PortError::Upstream {
                status: *status,
                body: body.clone(),
            });
        }
        Ok(self
            .images
            .iter()
            .skip((page.page * page.limit) as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn get_image(&self, image_id: &str) -> PortResult<CatImage> {
        self.images
            .iter()
            .find(|img| img.id == image_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Image {} not found in CatAPI", image_id)))
    }
}

//=========================================================================================
// Harness
//=========================================================================================

pub fn config(mode: &str) -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://unused/cats".to_string()),
        "APP_ENV" => Some(mode.to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn app_with(db: Arc<FakeDb>, images: FakeCatApi, mode: &str) -> Router {
    app_with_gateway(db, Arc::new(images), mode)
}

pub fn app_with_gateway(db: Arc<FakeDb>, images: Arc<dyn ImageGateway>, mode: &str) -> Router {
    router(Arc::new(AppState {
        db,
        images,
        config: Arc::new(config(mode)),
    }))
}

pub fn app(db: Arc<FakeDb>, images: FakeCatApi) -> Router {
    app_with(db, images, "development")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The session id handed out through `Set-Cookie`, if any.
    pub fn session_cookie(&self) -> Option<Uuid> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| v.strip_prefix("session_id="))
            .and_then(|rest| rest.split(';').next())
            .and_then(|id| Uuid::parse_str(id).ok())
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn get(uri: &str, session: Option<Uuid>) -> Request<Body> {
    with_cookie(Request::get(uri), session)
        .body(Body::empty())
        .unwrap()
}

pub fn delete(uri: &str, session: Option<Uuid>) -> Request<Body> {
    with_cookie(Request::delete(uri), session)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, session: Option<Uuid>, body: Value) -> Request<Body> {
    with_cookie(Request::post(uri), session)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_cookie(builder: axum::http::request::Builder, session: Option<Uuid>) -> axum::http::request::Builder {
    match session {
        Some(id) => builder.header(header::COOKIE, format!("session_id={}", id)),
        None => builder,
    }
}

/// Opens a session and returns its id.
pub async fn open_session(app: &Router) -> Uuid {
    send(app, get("/", None))
        .await
        .session_cookie()
        .expect("new visitors get a session cookie")
}
