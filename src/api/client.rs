//! HTTP client for the reader server.
//!
//! Every operation maps to exactly one request. There are no retries and
//! no request cancellation: the toggle protocol's compensation logic lives
//! in the caller, keyed off the response's `success` field. A transport
//! failure therefore surfaces as an `Err` and the caller decides what (if
//! anything) to do about the optimistic state it already applied.

use futures::StreamExt;
use thiserror::Error;

use super::types::{FeedMoreResponse, FeedQuery, ReadAllRequest, ToggleResponse};

/// Upper bound for listing pages and feed fragments.
const MAX_BODY_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// The three per-post status flags the server can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Read,
    Saved,
    Loved,
}

impl Flag {
    /// Endpoint segment for this flag's toggle route.
    fn endpoint(self) -> &'static str {
        match self {
            Flag::Read => "readit",
            Flag::Saved => "saveit",
            Flag::Loved => "loveit",
        }
    }

    /// Human-readable name for logs and status messages.
    pub fn name(self) -> &'static str {
        match self {
            Flag::Read => "read",
            Flag::Saved => "saved",
            Flag::Loved => "loved",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    #[error("Invalid server URL: {0}")]
    InvalidBaseUrl(String),
}

/// Typed wrapper over the reader server's endpoints.
///
/// Cheap to clone; the inner `reqwest::Client` is an `Arc` internally, so
/// spawned tasks clone the whole `ApiClient` and move it freely.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: String,
}

impl ApiClient {
    /// Creates a client for the server at `base_url`.
    ///
    /// The URL must be http or https; a trailing slash is tolerated.
    /// Self-hosted readers commonly live on a LAN, so plain http is
    /// accepted for any host.
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ApiError::InvalidBaseUrl(format!(
                    "unsupported scheme '{}'",
                    scheme
                )));
            }
        }
        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Toggles one status flag on one post.
    ///
    /// `POST {base}/{readit|saveit|loveit}/{id}` with no payload beyond the
    /// identifier in the path. Returns the server's `success` verdict;
    /// transport problems and non-2xx statuses are `Err`.
    pub async fn toggle(&self, flag: Flag, id: &str) -> Result<bool, ApiError> {
        let url = format!("{}/{}/{}", self.base, flag.endpoint(), id);
        tracing::debug!(post_id = id, flag = flag.name(), "Toggling flag");

        let response = self.client.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }

        let body = response.text().await?;
        let parsed: ToggleResponse = serde_json::from_str(&body)?;
        if !parsed.success {
            tracing::warn!(post_id = id, flag = flag.name(), "Server rejected toggle");
        }
        Ok(parsed.success)
    }

    /// Marks every listed post as read in one batch request.
    ///
    /// `posts` must be in rendered feed order; the server applies them as
    /// a single update. Returns the server's `success` verdict.
    pub async fn read_all(&self, posts: Vec<String>) -> Result<bool, ApiError> {
        let url = format!("{}/readall", self.base);
        let count = posts.len();

        let response = self
            .client
            .post(&url)
            .json(&ReadAllRequest { posts })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }

        let body = response.text().await?;
        let parsed: ToggleResponse = serde_json::from_str(&body)?;
        tracing::info!(count, success = parsed.success, "Batch mark-read completed");
        Ok(parsed.success)
    }

    /// Requests a fresh feed fragment for the given filter values.
    ///
    /// The fragment in the response replaces the client's feed wholesale.
    pub async fn feed_more(&self, query: &FeedQuery) -> Result<FeedMoreResponse, ApiError> {
        let url = format!("{}/feedmore", self.base);
        tracing::debug!(
            subreddit = %query.subreddit,
            max_age = %query.max_age,
            "Requesting feed fragment"
        );

        let response = self.client.post(&url).json(query).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }

        let body = read_limited_text(response, MAX_BODY_SIZE).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetches the listing page the filter form submits to.
    ///
    /// An empty `subreddit` targets the front listing (`/`), anything else
    /// `/r/{subreddit}`. `params` is the guard-filtered parameter list from
    /// the filter form, applied in order.
    pub async fn fetch_listing(
        &self,
        subreddit: &str,
        params: &[(String, String)],
    ) -> Result<String, ApiError> {
        let url = if subreddit.is_empty() {
            format!("{}/", self.base)
        } else {
            format!("{}/r/{}", self.base, subreddit)
        };

        let response = self.client.get(&url).query(params).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }

        read_limited_text(response, MAX_BODY_SIZE).await
    }
}

/// Reads a response body up to `limit` bytes, streaming chunks so an
/// oversized body is rejected without buffering it whole.
async fn read_limited_text(response: reqwest::Response, limit: usize) -> Result<String, ApiError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| ApiError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn test_client(server: &MockServer) -> ApiClient {
        ApiClient::new(reqwest::Client::new(), &server.uri()).unwrap()
    }

    #[tokio::test]
    async fn toggle_hits_flag_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/readit/t3_abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let api = test_client(&server).await;
        let success = api.toggle(Flag::Read, "t3_abc").await.unwrap();
        assert!(success);
    }

    #[tokio::test]
    async fn toggle_reports_server_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/saveit/t3_abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": false}"#))
            .mount(&server)
            .await;

        let api = test_client(&server).await;
        let success = api.toggle(Flag::Saved, "t3_abc").await.unwrap();
        assert!(!success);
    }

    #[tokio::test]
    async fn toggle_http_error_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let api = test_client(&server).await;
        let result = api.toggle(Flag::Loved, "t3_abc").await;
        assert!(matches!(result, Err(ApiError::HttpStatus(500))));
    }

    #[tokio::test]
    async fn read_all_sends_ordered_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/readall"))
            .and(body_json(serde_json::json!({
                "posts": ["t3_a", "t3_b", "t3_c"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let api = test_client(&server).await;
        let success = api
            .read_all(vec!["t3_a".into(), "t3_b".into(), "t3_c".into()])
            .await
            .unwrap();
        assert!(success);
    }

    #[tokio::test]
    async fn feed_more_sends_exact_filter_values() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/feedmore"))
            .and(body_json(serde_json::json!({
                "subreddit": "pics",
                "max_age": "24h"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success": true, "html": "<div class=\"post\" data-id=\"x\"></div>"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let api = test_client(&server).await;
        let resp = api
            .feed_more(&FeedQuery {
                subreddit: "pics".into(),
                max_age: "24h".into(),
            })
            .await
            .unwrap();
        assert!(resp.success);
        assert_eq!(
            resp.html.as_deref(),
            Some(r#"<div class="post" data-id="x"></div>"#)
        );
    }

    #[tokio::test]
    async fn fetch_listing_front_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>feed</html>"))
            .mount(&server)
            .await;

        let api = test_client(&server).await;
        let body = api.fetch_listing("", &[]).await.unwrap();
        assert_eq!(body, "<html>feed</html>");
    }

    #[tokio::test]
    async fn fetch_listing_subreddit_path_and_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/rust"))
            .and(wiremock::matchers::query_param("unread", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let api = test_client(&server).await;
        let body = api
            .fetch_listing("rust", &[("unread".to_string(), "0".to_string())])
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let api = test_client(&server).await;
        let result = api.toggle(Flag::Read, "t3_abc").await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let result = ApiClient::new(reqwest::Client::new(), "file:///etc/passwd");
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl(_))));
    }

    #[test]
    fn trailing_slash_tolerated() {
        let api = ApiClient::new(reqwest::Client::new(), "http://127.0.0.1:8000/").unwrap();
        assert_eq!(api.base, "http://127.0.0.1:8000");
    }
}
