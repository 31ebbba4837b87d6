//! Search-engine notification.
//!
//! After a session is finalized, each configured engine receives a GET
//! request carrying the absolute index URL as the `sitemap` query parameter.
//! Non-success statuses are reported in the returned [`PingOutcome`]s;
//! transport failures abort the submission and propagate as
//! [`Error::Network`](crate::Error::Network). No retries are attempted.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::numeric::duration_to_millis_saturating;
use crate::{Error, Result};

/// Default request timeout for pings.
const PING_TIMEOUT: Duration = Duration::from_secs(30);

/// Built-in ping endpoints as `(name, endpoint prefix)`.
///
/// The percent-encoded index URL is appended to the prefix.
pub const SEARCH_ENGINES: &[(&str, &str)] = &[
    ("google", "https://www.google.com/ping?sitemap="),
    ("bing", "https://www.bing.com/ping?sitemap="),
    ("yandex", "https://webmaster.yandex.ru/ping?sitemap="),
];

/// Status and body of a ping response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, possibly empty.
    pub body: String,
}

impl PingResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network collaborator used to notify search engines.
#[async_trait]
pub trait PingClient: Send + Sync {
    /// Issue a GET request. Non-2xx statuses are not errors.
    async fn get(&self, url: &str) -> Result<PingResponse>;
}

/// [`PingClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpPingClient {
    client: Client,
}

impl HttpPingClient {
    /// Create a client with the default 30 second timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(PING_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sitemapgen/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PingClient for HttpPingClient {
    async fn get(&self, url: &str) -> Result<PingResponse> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(PingResponse { status, body })
    }
}

/// A ping endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchEngine {
    /// Short engine name used in reports.
    pub name: String,
    /// URL prefix the encoded index URL is appended to.
    pub endpoint: String,
}

impl SearchEngine {
    /// Build an engine from a name and endpoint prefix.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }

    /// The engines from [`SEARCH_ENGINES`].
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        SEARCH_ENGINES
            .iter()
            .map(|(name, endpoint)| Self::new(*name, *endpoint))
            .collect()
    }

    /// Full ping URL for `index_url`.
    #[must_use]
    pub fn ping_url(&self, index_url: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(index_url.as_bytes()).collect();
        format!("{}{encoded}", self.endpoint)
    }
}

/// Result of notifying one engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingOutcome {
    /// Engine name.
    pub engine: String,
    /// URL that was requested.
    pub url: String,
    /// HTTP status returned.
    pub status: u16,
    /// Round-trip time in milliseconds.
    pub elapsed_ms: u64,
    /// Whether the status was 2xx.
    pub success: bool,
}

/// Notify every engine in order, stopping at the first transport error.
pub async fn ping_all(
    client: &dyn PingClient,
    engines: &[SearchEngine],
    index_url: &str,
) -> Result<Vec<PingOutcome>> {
    let mut outcomes = Vec::with_capacity(engines.len());

    for engine in engines {
        let url = engine.ping_url(index_url);
        let started = Instant::now();
        debug!(engine = %engine.name, %url, "Pinging search engine");

        let response = client.get(&url).await?;
        let outcome = PingOutcome {
            engine: engine.name.clone(),
            url,
            status: response.status,
            elapsed_ms: duration_to_millis_saturating(started.elapsed()),
            success: response.is_success(),
        };

        if outcome.success {
            info!(engine = %outcome.engine, status = outcome.status, "Search engine notified");
        } else {
            warn!(engine = %outcome.engine, status = outcome.status, "Search engine rejected ping");
        }
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    const INDEX: &str = "http://example.com/sitemap_index.xml";

    #[test]
    fn test_ping_url_encodes_index() {
        let engine = SearchEngine::new("google", "https://www.google.com/ping?sitemap=");
        assert_eq!(
            engine.ping_url(INDEX),
            "https://www.google.com/ping?sitemap=http%3A%2F%2Fexample.com%2Fsitemap_index.xml"
        );
    }

    #[test]
    fn test_default_engines() {
        let names: Vec<_> = SearchEngine::defaults().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["google", "bing", "yandex"]);
    }

    #[tokio::test]
    async fn test_ping_all_reports_each_engine() -> anyhow::Result<()> {
        // Given two engines, one accepting and one rejecting
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/good"))
            .and(query_param("sitemap", INDEX))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bad"))
            .respond_with(ResponseTemplate::new(410))
            .expect(1)
            .mount(&mock_server)
            .await;

        let engines = vec![
            SearchEngine::new("good", format!("{}/good?sitemap=", mock_server.uri())),
            SearchEngine::new("bad", format!("{}/bad?sitemap=", mock_server.uri())),
        ];

        // When pinging
        let client = HttpPingClient::new()?;
        let outcomes = ping_all(&client, &engines, INDEX).await?;

        // Then both outcomes are reported in order
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].engine, "good");
        assert!(outcomes[0].success);
        assert_eq!(outcomes[1].status, 410);
        assert!(!outcomes[1].success);
        Ok(())
    }

    #[tokio::test]
    async fn test_transport_error_propagates() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let client = HttpPingClient::with_timeout(Duration::from_millis(100))?;
        let engines = vec![SearchEngine::new("slow", format!("{}/ping?sitemap=", mock_server.uri()))];

        let err = ping_all(&client, &engines, INDEX).await.unwrap_err();

        assert!(matches!(err, Error::Network(_)));
        assert!(err.is_recoverable());
        Ok(())
    }
}
