//! HTTP layer: the dashboard page, its JSON snapshot and the two feed proxies.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use log::{error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::{
    dashboard::Dashboard,
    feeds::{self, FeedError, RssEntry, Tweet},
    model::DashboardBox,
};

const INDEX_HTML: &str = include_str!("../ui/index.html");
const APP_JS: &str = include_str!("../ui/app.js");

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub http: Client,
    pub twitter_endpoint: String,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            dashboard: Arc::new(dashboard),
            http: Client::new(),
            twitter_endpoint: feeds::TWITTER_SEARCH_URL.to_string(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/static/app.js", get(serve_app_js))
        .route("/api/dashboard", get(dashboard_snapshot))
        .route("/fetch_rss", get(fetch_rss))
        .route("/search_tweets", get(search_tweets))
        .route("/health", get(health_check))
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    UnknownBox(String),
    Upstream(FeedError),
}

impl From<FeedError> for ApiError {
    fn from(e: FeedError) -> Self {
        ApiError::Upstream(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::UnknownBox(id) => (StatusCode::NOT_FOUND, format!("No box with id '{}'", id)),
            ApiError::Upstream(e) => {
                error!("Feed proxy failed: {}", e);
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn serve_app_js() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/javascript")],
        APP_JS,
    )
        .into_response()
}

/// GET /api/dashboard
async fn dashboard_snapshot(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.dashboard.view()))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "hibo".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct RssQuery {
    pub id: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RssResponse {
    pub entries: Vec<RssEntry>,
}

fn lookup<'a>(state: &'a AppState, id: &str) -> Result<&'a DashboardBox, ApiError> {
    state
        .dashboard
        .find_box(id)
        .ok_or_else(|| ApiError::UnknownBox(id.to_string()))
}

fn required_parameter<'a>(dash_box: &'a DashboardBox, key: &str) -> Result<&'a str, ApiError> {
    dash_box.parameter_str(key).ok_or_else(|| {
        ApiError::BadRequest(format!("Box '{}' has no '{}' parameter", dash_box.id, key))
    })
}

/// GET /fetch_rss?id=BOX or /fetch_rss?url=FEED
///
/// With `id`, the feed url comes from that box's `url` parameter.
async fn fetch_rss(
    State(state): State<AppState>,
    Query(query): Query<RssQuery>,
) -> Result<Json<RssResponse>, ApiError> {
    let url = match (&query.id, &query.url) {
        (Some(id), _) => required_parameter(lookup(&state, id)?, "url")?.to_string(),
        (None, Some(url)) => url.clone(),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Either 'id' or 'url' is required".to_string(),
            ));
        }
    };

    let entries = feeds::fetch_rss(&state.http, &url).await?;
    Ok(Json(RssResponse { entries }))
}

#[derive(Debug, Deserialize)]
pub struct TweetQuery {
    pub id: Option<String>,
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TweetResponse {
    pub tweets: Vec<Tweet>,
}

/// GET /search_tweets?id=BOX[&query=TEXT]
///
/// Credentials and the default query come from the box's parameters.
async fn search_tweets(
    State(state): State<AppState>,
    Query(query): Query<TweetQuery>,
) -> Result<Json<TweetResponse>, ApiError> {
    let id = query
        .id
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("'id' is required".to_string()))?;
    let dash_box = lookup(&state, id)?;
    let token = required_parameter(dash_box, "bearer_token")?;
    let search = match &query.query {
        Some(q) => q.as_str(),
        None => required_parameter(dash_box, "query")?,
    };
    let max_results = dash_box.parameters.get("max_results").and_then(Value::as_u64);

    info!("Tweet search for box {}", dash_box.id);
    let tweets = feeds::search_tweets(
        &state.http,
        &state.twitter_endpoint,
        token,
        search,
        max_results,
    )
    .await?;
    Ok(Json(TweetResponse { tweets }))
}
