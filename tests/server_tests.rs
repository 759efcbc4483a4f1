//! Router-level tests: snapshot endpoint, box lookup and both feed proxies.

use axum::{
    Router,
    body::Body,
    extract::RawQuery,
    http::{Request, StatusCode, header},
    routing::get,
};
use hibo::{
    Config, Dashboard,
    server::{AppState, build_router},
};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Local</title><link>http://local/</link><description>d</description>
<item><title>Local news</title><link>http://local/1</link></item>
</channel></rss>"#;

fn dashboard(feed_url: &str) -> Dashboard {
    let config = Config::from_value(json!({
        "title": "Test wall",
        "boxes": [
            {"title": "News", "sizes": "0,0,2,1", "color": "red", "widget": "rss",
             "parameters": {"url": feed_url}},
            {"id": "custom-1", "title": "Mentions", "sizes": "2,0,1,1", "color": "blue",
             "widget": "tweet",
             "parameters": {"query": "rust", "bearer_token": "t0ken", "max_results": 10}},
            {"title": "No params", "sizes": "0,1,1,1", "color": "green", "widget": "tweet"}
        ]
    }))
    .unwrap();
    Dashboard::from_config(config).unwrap()
}

fn app_with(state: AppState) -> Router {
    build_router(state)
}

fn app(feed_url: &str) -> Router {
    app_with(AppState::new(dashboard(feed_url)))
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Serves FEED on an ephemeral local port and returns its url.
async fn spawn_feed_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let upstream = Router::new().route(
        "/feed.xml",
        get(|| async { ([(header::CONTENT_TYPE, "application/rss+xml")], FEED) }),
    );
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });
    format!("http://{}/feed.xml", addr)
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = app("http://unused").oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "hibo");
}

#[tokio::test]
async fn test_index_and_script_are_served() {
    let response = app("http://unused").oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app("http://unused")
        .oneshot(get_request("/static/app.js"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/javascript"
    );
}

#[tokio::test]
async fn test_dashboard_snapshot() {
    let response = app("http://unused")
        .oneshot(get_request("/api/dashboard"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["config"], json!({"title": "Test wall"}));
    let ids: Vec<_> = body["boxes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(0), json!("custom-1"), json!(2)]);
    assert_eq!(body["boxes"][0]["geometry"], json!({"x": 0, "y": 0, "width": 2, "height": 1}));
}

#[tokio::test]
async fn test_fetch_rss_by_box_id() {
    let feed_url = spawn_feed_server().await;
    let response = app(&feed_url)
        .oneshot(get_request("/fetch_rss?id=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body,
        json!({"entries": [{"title": "Local news", "url": "http://local/1"}]})
    );
}

#[tokio::test]
async fn test_fetch_rss_by_direct_url() {
    let feed_url = spawn_feed_server().await;
    let uri = format!("/fetch_rss?url={}", feed_url);
    let response = app("http://unused").oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["entries"][0]["title"], "Local news");
}

#[tokio::test]
async fn test_fetch_rss_errors() {
    let response = app("http://unused")
        .oneshot(get_request("/fetch_rss"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app("http://unused")
        .oneshot(get_request("/fetch_rss?id=nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("nope"));

    // nothing listens on port 1
    let response = app("http://127.0.0.1:1/feed.xml")
        .oneshot(get_request("/fetch_rss?id=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_search_tweets_needs_credentials() {
    let response = app("http://unused")
        .oneshot(get_request("/search_tweets?id=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("bearer_token"));

    let response = app("http://unused")
        .oneshot(get_request("/search_tweets?id=7"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Twitter-like upstream on an ephemeral port.
///
/// `/search` echoes the authorization header and raw query string back as tweet texts,
/// `/broken` answers 500 and `/garbage` answers 200 with a body that is not JSON.
async fn spawn_search_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let upstream = Router::new()
        .route(
            "/search",
            get(
                |headers: axum::http::HeaderMap, RawQuery(raw): RawQuery| async move {
                    let auth = headers
                        .get(header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    axum::Json(json!({"data": [
                        {"id": "1", "text": auth},
                        {"id": "2", "text": raw.unwrap_or_default()}
                    ]}))
                },
            ),
        )
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route("/garbage", get(|| async { "<html>not json</html>" }));
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });
    format!("http://{}", addr)
}

fn search_app(endpoint: String) -> Router {
    let mut state = AppState::new(dashboard("http://unused"));
    state.twitter_endpoint = endpoint;
    app_with(state)
}

#[tokio::test]
async fn test_search_tweets_uses_box_parameters() {
    let base = spawn_search_server().await;
    let response = search_app(format!("{}/search", base))
        .oneshot(get_request("/search_tweets?id=custom-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["tweets"][0]["text"], "Bearer t0ken");
    assert_eq!(body["tweets"][0]["url"], "https://twitter.com/i/web/status/1");

    let forwarded = body["tweets"][1]["text"].as_str().unwrap();
    assert!(forwarded.contains("query=rust"), "{forwarded}");
    assert!(forwarded.contains("max_results=10"), "{forwarded}");
}

#[tokio::test]
async fn test_search_tweets_request_query_overrides_box_query() {
    let base = spawn_search_server().await;
    let response = search_app(format!("{}/search", base))
        .oneshot(get_request("/search_tweets?id=custom-1&query=ferris"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let forwarded = body["tweets"][1]["text"].as_str().unwrap();
    assert!(forwarded.contains("query=ferris"), "{forwarded}");
    assert!(!forwarded.contains("query=rust"), "{forwarded}");
}

#[tokio::test]
async fn test_search_tweets_upstream_failures_are_bad_gateway() {
    let base = spawn_search_server().await;
    for path in ["/broken", "/garbage"] {
        let response = search_app(format!("{}{}", base, path))
            .oneshot(get_request("/search_tweets?id=custom-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY, "{path}");
        let body = extract_json(response.into_body()).await;
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_search_tweets_without_id_is_json_bad_request() {
    let response = app("http://unused")
        .oneshot(get_request("/search_tweets"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "'id' is required");
}

#[tokio::test]
async fn test_fetch_rss_unparsable_feed_is_bad_gateway() {
    let base = spawn_search_server().await;
    let response = app(&format!("{}/garbage", base))
        .oneshot(get_request("/fetch_rss?id=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
