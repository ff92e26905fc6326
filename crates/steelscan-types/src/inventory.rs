//! Committed inventory records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::payload::ImagePayload;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordDimensions {
    pub width: f64,
    pub length: f64,
    /// Wall height
    pub height: f64,
    pub pitch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordColors {
    pub roof: String,
    pub wall: String,
    pub trim: String,
    pub wainscot: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFeatures {
    pub garage_doors: u32,
    pub man_doors: u32,
    pub windows: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordConfidence {
    pub sizing: f64,
    pub colors: f64,
}

/// Durable form of a reviewed analysis.
///
/// Listing fields are denormalized copies of `full_analysis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub id: String,
    /// Commit time, stored as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub sku: String,
    pub product_title_short: String,
    pub product_title_long: String,
    pub profile_id: String,
    pub profile_name: String,
    pub brand: String,
    pub dimensions: RecordDimensions,
    pub colors: RecordColors,
    pub features: RecordFeatures,
    pub confidence: RecordConfidence,
    pub description: String,
    /// Resolved region code
    pub state: String,
    pub image: ImagePayload,
    pub full_analysis: AnalysisResult,
}

impl InventoryRecord {
    /// Fresh random record id
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}
