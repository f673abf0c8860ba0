//! USGS Earthquake feed client.
//!
//! Provides blocking HTTP access to USGS summary feeds.
//! Uses reqwest with rustls for TLS.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, instrument};

use crate::errors::QuakemapError;
use crate::models::FeatureCollection;

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("quakemap/", env!("CARGO_PKG_VERSION"));

/// USGS base URL for earthquake feeds.
const USGS_BASE_URL: &str = "https://earthquake.usgs.gov";

/// Minimum magnitude selector of a summary feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedLevel {
    All,
    Mag1,
    Mag25,
    Mag45,
    Significant,
}

impl FeedLevel {
    const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Mag1 => "1.0",
            Self::Mag25 => "2.5",
            Self::Mag45 => "4.5",
            Self::Significant => "significant",
        }
    }
}

/// Time window of a summary feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPeriod {
    Hour,
    Day,
    Week,
    Month,
}

impl FeedPeriod {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

/// A USGS summary feed, e.g. `all_week` or `4.5_day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedType {
    pub level: FeedLevel,
    pub period: FeedPeriod,
}

impl FeedType {
    /// Every earthquake in the past seven days.
    pub const ALL_WEEK: FeedType = FeedType {
        level: FeedLevel::All,
        period: FeedPeriod::Week,
    };

    /// Feed name as used in the URL path, e.g. `2.5_day`.
    #[must_use]
    pub fn name(self) -> String {
        format!("{}_{}", self.level.as_str(), self.period.as_str())
    }

    /// Full URL of this feed on the USGS site.
    #[must_use]
    pub fn url(self) -> String {
        format!(
            "{USGS_BASE_URL}/earthquakes/feed/v1.0/summary/{}.geojson",
            self.name()
        )
    }
}

impl Default for FeedType {
    fn default() -> Self {
        Self::ALL_WEEK
    }
}

impl std::str::FromStr for FeedType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let (level, period) = lower
            .rsplit_once('_')
            .ok_or_else(|| format!("unknown feed type: {s} (expected e.g. all_week, 4.5_day)"))?;

        let level = match level {
            "all" => FeedLevel::All,
            "1.0" => FeedLevel::Mag1,
            "2.5" => FeedLevel::Mag25,
            "4.5" => FeedLevel::Mag45,
            "significant" => FeedLevel::Significant,
            _ => return Err(format!("unknown feed level: {level}")),
        };
        let period = match period {
            "hour" => FeedPeriod::Hour,
            "day" => FeedPeriod::Day,
            "week" => FeedPeriod::Week,
            "month" => FeedPeriod::Month,
            _ => return Err(format!("unknown feed period: {period}")),
        };

        Ok(Self { level, period })
    }
}

/// Something that can produce a feed of earthquakes.
pub trait FeedSource {
    /// Fetch the feed once.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed cannot be retrieved or decoded.
    fn fetch(&self) -> Result<FeatureCollection, QuakemapError>;
}

/// Client for a USGS GeoJSON feed.
pub struct UsgsClient {
    client: Client,
    url: String,
}

impl UsgsClient {
    /// Create a client for one of the USGS summary feeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(feed: FeedType) -> Result<Self, QuakemapError> {
        Self::with_url(feed.url())
    }

    /// Create a client for an arbitrary GeoJSON feed URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_url(url: impl Into<String>) -> Result<Self, QuakemapError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// URL this client fetches.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FeedSource for UsgsClient {
    #[instrument(skip(self), fields(url = %self.url))]
    fn fetch(&self) -> Result<FeatureCollection, QuakemapError> {
        debug!("fetching feed from {}", self.url);

        let response = self.client.get(&self.url).send()?;

        // Check status before parsing
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(QuakemapError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let feed: FeatureCollection = serde_json::from_str(&response.text()?)?;
        feed.validate()?;

        debug!(
            "fetched {} events (metadata count: {:?})",
            feed.features.len(),
            feed.metadata.as_ref().and_then(|m| m.count)
        );
        Ok(feed)
    }
}
