// API models and data fetching for the Digitraffic live train-location feed
// Official website: https://www.digitraffic.fi/en/railway-traffic/
//
// API Endpoint:
// - Latest train locations: https://rata.digitraffic.fi/api/v1/train-locations/latest/

use crate::ftt_config::FTTConfig;
use crate::ftt_regions::Region;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use geo_types::Point;
use log::debug;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

// ============================================================================
// Data Structures
// ============================================================================

/// One element of the feed array.
///
/// Every field is optional: a field with the wrong JSON type is read as absent
/// instead of rejecting the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub train_number: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub departure_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub heading: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<Location>,
}

/// GeoJSON-style point; coordinates are `[longitude, latitude]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, deserialize_with = "lenient")]
    pub coordinates: Option<Vec<f64>>,
}

impl TrainRecord {
    /// Build a record from one feed element. Never fails.
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            debug!("Feed element is not an object ({}), keeping an empty record", e);
            TrainRecord::default()
        })
    }

    pub fn speed_or_zero(&self) -> f64 {
        self.speed.unwrap_or(0.0)
    }

    /// Position as a point with `x = longitude`, `y = latitude`.
    pub fn position(&self) -> Option<Point<f64>> {
        let coordinates = self.location.as_ref()?.coordinates.as_ref()?;
        match coordinates.as_slice() {
            [lon, lat, ..] => Some(Point::new(*lon, *lat)),
            _ => None,
        }
    }

    /// Region of the train, `None` when it reports no usable position.
    pub fn region(&self) -> Option<Region> {
        self.position().map(|p| Region::classify(p.y(), p.x()))
    }
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum FTTError {
    NetworkError(String),
    ParseError(String),
    ShapeError(String),
    ConfigError(String),
}

impl std::fmt::Display for FTTError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FTTError::NetworkError(e) => write!(f, "Network error: {}", e),
            FTTError::ParseError(e) => write!(f, "Parse error: {}", e),
            FTTError::ShapeError(e) => write!(f, "Unexpected feed shape: {}", e),
            FTTError::ConfigError(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for FTTError {}

pub type Result<T> = std::result::Result<T, FTTError>;

// ============================================================================
// Feed Access
// ============================================================================

/// Anything that can produce one snapshot of the train feed.
pub trait FeedSource: Send + Sync + 'static {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<TrainRecord>>>;
}

pub struct FTTModels;

impl FTTModels {
    pub const FEED_URL: &'static str = "https://rata.digitraffic.fi/api/v1/train-locations/latest/";
    const USER_HEADER: &'static str = "Digitraffic-User";
    const USER_AGENT: &'static str = concat!("ftt/", env!("CARGO_PKG_VERSION"));

    /// Parse a feed body. Anything other than a JSON array is an error.
    pub fn parse_feed(body: &str) -> Result<Vec<TrainRecord>> {
        let json: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| FTTError::ParseError(format!("Invalid JSON response: {}", e)))?;

        match json {
            serde_json::Value::Array(items) => {
                Ok(items.into_iter().map(TrainRecord::from_value).collect())
            }
            other => Err(FTTError::ShapeError(format!(
                "expected an array, got {}",
                Self::describe(&other)
            ))),
        }
    }

    fn describe(value: &serde_json::Value) -> &'static str {
        match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "a boolean",
            serde_json::Value::Number(_) => "a number",
            serde_json::Value::String(_) => "a string",
            serde_json::Value::Array(_) => "an array",
            serde_json::Value::Object(_) => "an object",
        }
    }
}

/// Fetches the feed over HTTP.
pub struct HttpFeedSource {
    client: reqwest::Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(config: &FTTConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(FTTModels::USER_AGENT)
            .build()
            .map_err(|e| FTTError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(HttpFeedSource {
            client,
            url: config.feed_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_trains(&self) -> Result<Vec<TrainRecord>> {
        let response = self
            .client
            .get(&self.url)
            .header(FTTModels::USER_HEADER, "ftt")
            .send()
            .await
            .map_err(|e| FTTError::NetworkError(format!("Failed to fetch train locations: {}", e)))?;

        if !response.status().is_success() {
            return Err(FTTError::NetworkError(format!("API returned error: {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FTTError::NetworkError(format!("Failed to read response: {}", e)))?;

        FTTModels::parse_feed(&body)
    }
}

impl FeedSource for HttpFeedSource {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<TrainRecord>>> {
        Box::pin(self.fetch_trains())
    }
}
