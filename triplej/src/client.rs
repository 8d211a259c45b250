//! HTTP client for the ABC plays/program APIs

use crate::error::{Error, Result};
use crate::models::{GuideResponse, NowPlayingResponse, SearchResponse};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default plays API base URL
pub const DEFAULT_API_BASE: &str = "https://music.abcradio.net.au/api/v1";

/// Default program guide API base URL
pub const DEFAULT_GUIDE_BASE: &str = "https://program.abcradio.net.au/api/v1";

/// Default station slug
pub const DEFAULT_STATION: &str = "triplej";

/// Default timezone passed to the now-playing endpoint
pub const DEFAULT_TIMEZONE: &str = "Australia/Sydney";

/// Default timeout for HTTP requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "triplej-sync/0.1.0";

/// Number of guide records requested per fetch
const GUIDE_FETCH_LIMIT: usize = 10;

/// Client for the ABC radio now-playing, search and program guide endpoints.
///
/// # Example
///
/// ```no_run
/// use triplej::TripleJClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = TripleJClient::new()?;
///     let now = client.now_playing().await?;
///     println!("next update hint: {:?}", now.next_updated);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TripleJClient {
    client: Client,
    api_base: String,
    guide_base: String,
    station: String,
    timezone: String,
    request_timeout: Duration,
}

impl TripleJClient {
    /// Create a new client with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Build a client from an [`ApiConfig`](crate::sync::ApiConfig)
    /// section.
    pub fn from_config(config: &crate::sync::ApiConfig) -> Result<Self> {
        Self::builder()
            .api_base(config.base_url.as_str())
            .guide_base(config.guide_base_url.as_str())
            .station(config.station.as_str())
            .timezone(config.timezone.as_str())
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
    }

    /// Get the configured station slug
    pub fn station(&self) -> &str {
        &self.station
    }

    /// Fetch the now-playing payload for the configured station.
    pub async fn now_playing(&self) -> Result<NowPlayingResponse> {
        let mut url = Url::parse(&format!(
            "{}/plays/{}/now.json",
            self.api_base, self.station
        ))?;
        url.query_pairs_mut().append_pair("tz", &self.timezone);

        self.get_json(url).await
    }

    /// Fetch the most recent plays, newest first.
    pub async fn recent_plays(&self, limit: usize) -> Result<SearchResponse> {
        let mut url = Url::parse(&format!("{}/plays/search.json", self.api_base))?;
        url.query_pairs_mut()
            .append_pair("station", &self.station)
            .append_pair("limit", &limit.to_string())
            .append_pair("order", "desc");

        self.get_json(url).await
    }

    /// Fetch upcoming program guide records for the configured station.
    pub async fn program_guide(&self) -> Result<GuideResponse> {
        let mut url = Url::parse(&format!("{}/programitems/search.json", self.guide_base))?;
        url.query_pairs_mut()
            .append_pair("service", &self.station)
            .append_pair("limit", &GUIDE_FETCH_LIMIT.to_string())
            .append_pair("order", "asc");

        self.get_json(url).await
    }

    // Body is read as text first so an empty 200 response is reported as
    // EmptyBody rather than a JSON parse failure.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::api_error(status.to_string()));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(Error::EmptyBody);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Builder for configuring a [`TripleJClient`]
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    api_base: String,
    guide_base: String,
    station: String,
    timezone: String,
    request_timeout: Duration,
    user_agent: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            api_base: DEFAULT_API_BASE.to_string(),
            guide_base: DEFAULT_GUIDE_BASE.to_string(),
            station: DEFAULT_STATION.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the plays API base URL
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    /// Set the program guide API base URL
    pub fn guide_base(mut self, url: impl Into<String>) -> Self {
        self.guide_base = url.into();
        self
    }

    /// Set the station slug ("triplej", "doublej", ...)
    pub fn station(mut self, station: impl Into<String>) -> Self {
        self.station = station.into();
        self
    }

    /// Set the timezone parameter sent to the now-playing endpoint
    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client
    pub fn build(self) -> Result<TripleJClient> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.request_timeout)
                .build()?,
        };

        Ok(TripleJClient {
            client,
            api_base: self.api_base,
            guide_base: self.guide_base,
            station: self.station,
            timezone: self.timezone,
            request_timeout: self.request_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::default();
        assert_eq!(builder.api_base, DEFAULT_API_BASE);
        assert_eq!(builder.station, DEFAULT_STATION);
        assert_eq!(builder.timezone, DEFAULT_TIMEZONE);
    }
}
