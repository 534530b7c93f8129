use crate::{
    config::ApiConfig,
    error::{ReaderError, Result},
    models::listing::{ListingPage, ListingResponse},
};
use reqwest::{
    Client, StatusCode, Url,
    header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT},
};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};
use utils::errors::HTTP_CLIENT_BUILD_FAILED;

/// Upper bound on any single wait, whether computed or asked for by `Retry-After`.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Waits between attempts: doubling from `initial`, never above [`MAX_BACKOFF`].
#[derive(Debug, Clone)]
struct Backoff {
    next: Duration,
    retries_left: usize,
}

impl Backoff {
    fn new(initial: Duration, max_retries: usize) -> Self {
        Self {
            next: initial.min(MAX_BACKOFF),
            retries_left: max_retries,
        }
    }

    /// How long to wait before retrying, or `None` once the retries are spent.
    /// A server hint replaces the computed wait for this attempt only.
    fn next_wait(&mut self, hint: Option<Duration>) -> Option<Duration> {
        if self.retries_left == 0 {
            return None;
        }
        self.retries_left -= 1;

        let wait = hint.unwrap_or(self.next).min(MAX_BACKOFF);
        self.next = self.next.max(wait).saturating_mul(2).min(MAX_BACKOFF);
        Some(wait)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Thin client for the `/r/{source}/new/.json` listing endpoint.
#[derive(Clone)]
pub struct ListingApi {
    client: Client,
    base_url: Url,
    max_retries: usize,
    initial_backoff: Duration,
}

impl ListingApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .default_headers(Self::default_headers(&config.user_agent)?)
            .build()
            .map_err(|e| ReaderError::Config(format!("{HTTP_CLIENT_BUILD_FAILED}: {e}")))?;

        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ReaderError::Config(format!("invalid base url {}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ReaderError::Config(format!(
                "base url {} cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff(),
        })
    }

    fn default_headers(user_agent: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|e| ReaderError::Config(format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, user_agent);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// `{base}/r/{source}/new/.json?limit=N[&after=T]`, with `source` and the
    /// token percent-encoded. Empty tokens are left off.
    pub fn listing_url(&self, source: &str, limit: u32, after: Option<&str>) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ReaderError::Config(format!("base url {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(["r", source, "new", ".json"]);

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            if let Some(token) = after.filter(|token| !token.is_empty()) {
                query.append_pair("after", token);
            }
        }
        Ok(url)
    }

    /// Fetches one page of the newest items of `source`.
    #[instrument(skip(self), fields(source = %source, limit = limit))]
    pub async fn fetch_page(
        &self,
        source: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<ListingPage> {
        let url = self.listing_url(source, limit, after)?;
        debug!(%url, "Fetching listing page");

        let body = self.execute_request(&url).await?;
        let response: ListingResponse =
            serde_json::from_str(&body).map_err(|e| ReaderError::MalformedResponse {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(response.into())
    }

    /// GETs `url` and returns the body of a 200 response. Rate limits, server
    /// errors and transport failures are retried while the backoff allows.
    async fn execute_request(&self, url: &Url) -> Result<String> {
        let mut backoff = Backoff::new(self.initial_backoff, self.max_retries);
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let (failure, hint) = match self.client.get(url.clone()).send().await {
                Ok(response) if response.status() == StatusCode::OK => {
                    return response.text().await.map_err(|source| ReaderError::Transport {
                        url: url.to_string(),
                        source,
                    });
                }
                Ok(response) if is_retryable(response.status()) => {
                    let hint = Self::retry_after(&response);
                    (Self::status_error(url, response).await, hint)
                }
                Ok(response) => {
                    let failure = Self::status_error(url, response).await;
                    error!(%url, error = %failure, "Listing request rejected");
                    return Err(failure);
                }
                Err(source) => (
                    ReaderError::Transport {
                        url: url.to_string(),
                        source,
                    },
                    None,
                ),
            };

            let Some(wait) = backoff.next_wait(hint) else {
                error!(%url, attempt, error = %failure, "Listing request failed, no retries left");
                return Err(failure);
            };
            warn!(%url, attempt, wait = ?wait, error = %failure, "Listing request failed, retrying");
            sleep(wait).await;
        }
    }

    async fn status_error(url: &Url, response: reqwest::Response) -> ReaderError {
        ReaderError::Status {
            url: url.to_string(),
            status: response.status(),
            body: response.text().await.unwrap_or_default(),
        }
    }

    /// `Retry-After` given in whole seconds. HTTP-date values are ignored.
    fn retry_after(response: &reqwest::Response) -> Option<Duration> {
        response
            .headers()
            .get(RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn api_for(base_url: String, max_retries: usize) -> ListingApi {
        ListingApi::new(&ApiConfig {
            base_url,
            max_retries,
            initial_backoff_ms: 1,
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn url_only_carries_non_empty_tokens() {
        let api = api_for("https://forum.example.com/".to_string(), 0);
        assert_eq!(
            api.listing_url("rust", 25, None).unwrap().as_str(),
            "https://forum.example.com/r/rust/new/.json?limit=25"
        );
        assert_eq!(
            api.listing_url("rust", 25, Some("")).unwrap().as_str(),
            "https://forum.example.com/r/rust/new/.json?limit=25"
        );
        assert_eq!(
            api.listing_url("rust", 25, Some("t3_x")).unwrap().as_str(),
            "https://forum.example.com/r/rust/new/.json?limit=25&after=t3_x"
        );
    }

    #[test]
    fn url_parts_are_percent_encoded() {
        let api = api_for("https://forum.example.com/mirror".to_string(), 0);
        assert_eq!(
            api.listing_url("a b/c", 5, Some("x&y=z")).unwrap().as_str(),
            "https://forum.example.com/mirror/r/a%20b%2Fc/new/.json?limit=5&after=x%26y%3Dz"
        );
    }

    #[test]
    fn backoff_doubles_and_stops_when_retries_are_spent() {
        let mut backoff = Backoff::new(Duration::from_millis(10), 3);
        assert_eq!(backoff.next_wait(None), Some(Duration::from_millis(10)));
        assert_eq!(backoff.next_wait(None), Some(Duration::from_millis(20)));
        assert_eq!(backoff.next_wait(Some(Duration::from_secs(1))), Some(Duration::from_secs(1)));
        assert_eq!(backoff.next_wait(None), None);
    }

    #[test]
    fn backoff_never_exceeds_the_cap() {
        let mut backoff = Backoff::new(Duration::from_secs(u64::MAX), 1_000);
        assert_eq!(backoff.next_wait(Some(Duration::from_secs(u64::MAX))), Some(MAX_BACKOFF));
        for _ in 0..999 {
            let wait = backoff.next_wait(None).unwrap();
            assert!(wait <= MAX_BACKOFF);
        }
        assert_eq!(backoff.next_wait(None), None);
    }

    #[tokio::test]
    async fn retry_after_hint_replaces_computed_backoff() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/r/rust/new/.json")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_header("retry-after", "0")
            .expect(2)
            .create_async()
            .await;

        let api = ListingApi::new(&ApiConfig {
            base_url: server.url(),
            max_retries: 1,
            initial_backoff_ms: 3_600_000,
            ..ApiConfig::default()
        })
        .unwrap();

        let err = tokio::time::timeout(Duration::from_secs(10), api.fetch_page("rust", 10, None))
            .await
            .unwrap()
            .unwrap_err();

        assert!(matches!(err, ReaderError::Status { status, .. } if status == StatusCode::TOO_MANY_REQUESTS));
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn sends_identifying_user_agent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/r/rust/new/.json")
            .match_query(Matcher::UrlEncoded("limit".into(), "10".into()))
            .match_header("user-agent", "DSTK-MultiRedditReader/0.1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": {"after": "t3_b", "children": [{"data": {"title": "hi"}}]}}"#)
            .create_async()
            .await;

        let api = api_for(server.url(), 0);
        let page = api.fetch_page("rust", 10, None).await.unwrap();

        assert_eq!(page.items[0].title, "hi");
        assert_eq!(page.next_token(), Some("t3_b"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_without_retries_fails_once() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/r/rust/new/.json")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let api = api_for(server.url(), 0);
        let err = api.fetch_page("rust", 10, None).await.unwrap_err();

        assert!(matches!(err, ReaderError::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_retried_when_configured() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/r/rust/new/.json")
            .match_query(Matcher::Any)
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let api = api_for(server.url(), 2);
        let err = api.fetch_page("rust", 10, None).await.unwrap_err();

        assert!(matches!(err, ReaderError::Status { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_keys_are_malformed() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/r/rust/new/.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"kind": "Listing"}"#)
            .create_async()
            .await;

        let api = api_for(server.url(), 0);
        let err = api.fetch_page("rust", 10, None).await.unwrap_err();

        assert!(matches!(err, ReaderError::MalformedResponse { .. }));
    }
}
