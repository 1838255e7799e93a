use crate::domain::legend::LegendLabel;
use crate::domain::style::ColorToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeFeature {
    pub id: Option<String>,
    pub magnitude: f64,
    pub depth_km: f64,
    pub place: String,
    pub longitude: f64,
    pub latitude: f64,
    pub time: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledFeature {
    pub feature: EarthquakeFeature,
    pub color: ColorToken,
    pub radius: f64,
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedFeature {
    pub index: usize,
    pub reason: String,
}

/// Result of one feed fetch. The two feeds succeed or fail independently.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedOutcome<T> {
    Success(T),
    Failure(String),
}

impl<T> FeedOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, FeedOutcome::Success(_))
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            FeedOutcome::Success(_) => None,
            FeedOutcome::Failure(reason) => Some(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedSet {
    pub earthquakes: FeedOutcome<serde_json::Value>,
    pub plates: FeedOutcome<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    Ok,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedReport {
    pub url: String,
    pub status: FeedStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub earthquakes: FeedReport,
    pub plates: FeedReport,
}

#[derive(Debug, Clone)]
pub struct MapLayers {
    pub earthquakes: Vec<StyledFeature>,
    pub rejected: Vec<RejectedFeature>,
    pub plates: Option<serde_json::Value>,
    pub legend: Vec<LegendLabel>,
    pub summary: RunSummary,
}
