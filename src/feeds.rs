//! Upstream feed proxies: RSS/Atom documents and Twitter recent search.
//!
//! Each proxy is one best-effort GET; nothing is retried or cached.

use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TWITTER_SEARCH_URL: &str = "https://api.twitter.com/2/tweets/search/recent";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not parse upstream response: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RssEntry {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
    text: String,
}

/// Reshapes an RSS or Atom document into title/link pairs.
pub fn parse_rss(body: &[u8]) -> Result<Vec<RssEntry>, FeedError> {
    let feed = feed_rs::parser::parse(body).map_err(|e| FeedError::Parse(e.to_string()))?;

    Ok(feed
        .entries
        .into_iter()
        .map(|entry| RssEntry {
            title: entry.title.map(|t| t.content).unwrap_or_default(),
            url: entry
                .links
                .into_iter()
                .next()
                .map(|link| link.href)
                .unwrap_or_default(),
        })
        .collect())
}

/// Reshapes a Twitter v2 search payload. A payload without `data` has no matches.
pub fn parse_tweets(body: &[u8]) -> Result<Vec<Tweet>, FeedError> {
    let response: SearchResponse =
        serde_json::from_slice(body).map_err(|e| FeedError::Parse(e.to_string()))?;

    Ok(response
        .data
        .into_iter()
        .map(|hit| Tweet {
            url: format!("https://twitter.com/i/web/status/{}", hit.id),
            id: hit.id,
            text: hit.text,
        })
        .collect())
}

pub async fn fetch_rss(client: &Client, url: &str) -> Result<Vec<RssEntry>, FeedError> {
    debug!("Fetching feed {}", url);
    let body = client.get(url).send().await?.error_for_status()?.bytes().await?;
    let entries = parse_rss(&body)?;
    info!("Fetched {} entries from {}", entries.len(), url);
    Ok(entries)
}

pub async fn search_tweets(
    client: &Client,
    endpoint: &str,
    bearer_token: &str,
    query: &str,
    max_results: Option<u64>,
) -> Result<Vec<Tweet>, FeedError> {
    debug!("Searching tweets for {:?}", query);
    let mut params = vec![("query", query.to_string())];
    if let Some(n) = max_results {
        params.push(("max_results", n.to_string()));
    }

    let body = client
        .get(endpoint)
        .bearer_auth(bearer_token)
        .query(&params)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let tweets = parse_tweets(&body)?;
    info!("Found {} tweets for {:?}", tweets.len(), query);
    Ok(tweets)
}
