//! Feed sources: one request for one query over one date window.
//!
//! `GoogleNewsSource` talks to the Google News RSS search endpoint. The
//! `FeedSource` trait lets tests and offline runs swap in scripted sources.

use chrono::NaiveDate;
use std::time::Duration;

use super::error::FetchError;
use crate::domain::Article;

pub(crate) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const GOOGLE_NEWS_RSS: &str = "https://news.google.com/rss/search";

/// A search phrase scoped to `[window_start, window_end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub query: String,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
}

impl FeedQuery {
    /// Window of `lookback_days` days ending at `window_end`.
    pub fn new(query: impl Into<String>, window_end: NaiveDate, lookback_days: u32) -> Self {
        Self {
            query: query.into(),
            window_start: window_end - chrono::Duration::days(i64::from(lookback_days)),
            window_end,
        }
    }

    /// Search text with the date operators appended.
    pub fn search_text(&self) -> String {
        format!(
            "{} after:{} before:{}",
            self.query,
            self.window_start.format("%Y-%m-%d"),
            self.window_end.format("%Y-%m-%d")
        )
    }
}

/// A single attempt at retrieving and parsing a feed. No retries here.
pub trait FeedSource: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(&self, query: &FeedQuery) -> Result<Vec<Article>, FetchError>;
}

pub struct GoogleNewsSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl GoogleNewsSource {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_base_url(GOOGLE_NEWS_RSS, timeout)
    }

    /// Point the source at another RSS search endpoint (mirrors, local fixtures).
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn feed_url(&self, query: &FeedQuery) -> Result<reqwest::Url, FetchError> {
        let search = query.search_text();
        reqwest::Url::parse_with_params(
            &self.base_url,
            &[
                ("q", search.as_str()),
                ("hl", "en-US"),
                ("gl", "US"),
                ("ceid", "US:en"),
            ],
        )
        .map_err(|e| FetchError::FetchTransportError(format!("invalid feed url: {e}")))
    }
}

impl FeedSource for GoogleNewsSource {
    fn name(&self) -> &str {
        "google_news_rss"
    }

    fn fetch(&self, query: &FeedQuery) -> Result<Vec<Article>, FetchError> {
        let url = self.feed_url(query)?;
        tracing::info!(query = %query.query, date = %query.window_end, "fetching feed");

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::from_transport(&e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::FetchHttpError {
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().map_err(|e| FetchError::from_transport(&e))?;
        let articles = parse_feed(&body)?;
        tracing::info!(
            query = %query.query,
            date = %query.window_end,
            count = articles.len(),
            "fetched articles"
        );
        Ok(articles)
    }
}

/// Parse an RSS/Atom document into articles, preserving feed order.
///
/// An empty body is a valid feed with no entries. Missing links, titles, or
/// summaries become empty strings.
pub fn parse_feed(body: &[u8]) -> Result<Vec<Article>, FetchError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }

    let feed = feed_rs::parser::parse(body).map_err(|e| FetchError::FeedParseError(e.to_string()))?;

    Ok(feed
        .entries
        .into_iter()
        .map(|entry| Article {
            url: entry.links.first().map(|l| l.href.clone()).unwrap_or_default(),
            title: entry.title.map(|t| strip_markup(&t.content)).unwrap_or_default(),
            summary: entry.summary.map(|s| strip_markup(&s.content)).unwrap_or_default(),
            published: entry.published.or(entry.updated),
        })
        .collect())
}

/// Drop HTML tags, decode the common entities, and collapse whitespace.
pub fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
