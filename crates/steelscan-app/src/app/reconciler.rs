//! Inventory reconciliation: turn a reviewed analysis into a record
//!
//! A commit either replaces the record being edited (same id, same
//! position) or prepends a new one, then advances the queue.

use chrono::{DateTime, Utc};
use steelscan_types::{
    AnalysisResult, DestinationProfile, ImagePayload, InventoryRecord, RecordColors,
    RecordConfidence, RecordDimensions, RecordFeatures, VariableInsight,
};
use tracing::{info, warn};

use super::queue::QueueManager;

/// Id and time for a commit, fixed before the transition runs
#[derive(Debug, Clone, PartialEq)]
pub struct CommitStamp {
    /// Id used if the commit creates a record
    pub new_id: String,
    pub timestamp: DateTime<Utc>,
}

impl CommitStamp {
    pub fn new(new_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            new_id: new_id.into(),
            timestamp,
        }
    }

    /// Fresh random id at the current time
    pub fn now() -> Self {
        Self::new(InventoryRecord::generate_id(), Utc::now())
    }
}

/// Everything a commit needs besides the inventory itself
#[derive(Debug, Clone, Copy)]
pub struct CommitInput<'a> {
    pub result: &'a AnalysisResult,
    pub image: &'a ImagePayload,
    pub editing_id: Option<&'a str>,
    pub profile: &'a DestinationProfile,
    /// Region setting at commit time
    pub region: &'a str,
    pub stamp: &'a CommitStamp,
}

/// Outcome of [`commit`]
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub inventory: Vec<InventoryRecord>,
    /// Id of the record that was written; `None` leaves everything as it was
    pub record_id: Option<String>,
    pub next_image: Option<ImagePayload>,
}

fn numeric(insight: &VariableInsight) -> f64 {
    insight.value.as_f64().unwrap_or(0.0)
}

/// Build the durable record for `result`
pub fn build_record(
    id: &str,
    timestamp: DateTime<Utc>,
    result: &AnalysisResult,
    image: &ImagePayload,
    profile: &DestinationProfile,
    region: &str,
) -> InventoryRecord {
    let variables = &result.variables;
    let state = if region.trim().is_empty() {
        result.metadata.detected_state.clone()
    } else {
        region.to_string()
    };

    InventoryRecord {
        id: id.to_string(),
        timestamp,
        sku: result.sku.clone(),
        product_title_short: result.product_title_short.clone(),
        product_title_long: result.product_title_long.clone(),
        profile_id: profile.id.clone(),
        profile_name: profile.name.clone(),
        brand: profile.brand.clone(),
        dimensions: RecordDimensions {
            width: numeric(&variables.width),
            length: numeric(&variables.length),
            height: numeric(&variables.wall_height),
            pitch: variables.pitch.value.to_string(),
        },
        colors: RecordColors {
            roof: result.colors.roof.clone(),
            wall: result.colors.wall.clone(),
            trim: result.colors.trim.clone(),
            wainscot: result.colors.wainscot.clone(),
        },
        features: RecordFeatures {
            garage_doors: result.features.garage_doors.total,
            man_doors: result.features.man_doors.total,
            windows: result.features.windows.total,
        },
        confidence: RecordConfidence {
            sizing: result.confidence.sizing,
            colors: result.confidence.colors,
        },
        description: result.descriptions.actual_sales_copy.clone(),
        state,
        image: image.clone(),
        full_analysis: result.clone(),
    }
}

/// Merge one analysis into `inventory` and advance `queue`.
///
/// In edit mode the record keeps its id and position and gets a fresh
/// timestamp. If the edited record is gone, the result is inserted as a
/// new record instead. A fresh id that is already taken writes nothing and
/// leaves the queue where it is.
pub fn commit(
    mut inventory: Vec<InventoryRecord>,
    queue: &mut QueueManager,
    input: CommitInput<'_>,
) -> Reconciled {
    let position = input
        .editing_id
        .and_then(|id| inventory.iter().position(|r| r.id == id));

    let record = |id: &str| {
        let record = build_record(
            id,
            input.stamp.timestamp,
            input.result,
            input.image,
            input.profile,
            input.region,
        );
        if !record.state.is_empty() && !input.profile.sells_in(&record.state) {
            warn!(
                record = %id,
                state = %record.state,
                profile = %input.profile.id,
                "region is outside the profile's service area"
            );
        }
        record
    };

    let record_id = match position {
        Some(index) => {
            let id = inventory[index].id.clone();
            inventory[index] = record(&id);
            info!(record = %id, "inventory record updated");
            id
        }
        None => {
            if let Some(id) = input.editing_id {
                warn!(record = %id, "edited record no longer exists, saving as new");
            }
            let id = input.stamp.new_id.clone();
            if inventory.iter().any(|r| r.id == id) {
                warn!(record = %id, "record id already present, nothing written");
                return Reconciled {
                    inventory,
                    record_id: None,
                    next_image: None,
                };
            }
            inventory.insert(0, record(&id));
            info!(record = %id, total = inventory.len(), "inventory record created");
            id
        }
    };

    let next_image = queue.advance();
    Reconciled {
        inventory,
        record_id: Some(record_id),
        next_image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use steelscan_types::VariableValue;

    fn result(width: f64) -> AnalysisResult {
        let mut result = AnalysisResult {
            sku: "SB-1".to_string(),
            ..Default::default()
        };
        result.variables.width = VariableInsight::number(width);
        result.variables.pitch = VariableInsight::new(VariableValue::Text("4/12".into()), "");
        result.features.windows.total = 3;
        result.descriptions.actual_sales_copy = "A fine shop".to_string();
        result.metadata.detected_state = "TX".to_string();
        result
    }

    fn stamp(id: &str, secs: i64) -> CommitStamp {
        CommitStamp::new(id, Utc.timestamp_opt(secs, 0).unwrap())
    }

    fn input<'a>(
        result: &'a AnalysisResult,
        image: &'a ImagePayload,
        editing_id: Option<&'a str>,
        profile: &'a DestinationProfile,
        stamp: &'a CommitStamp,
    ) -> CommitInput<'a> {
        CommitInput {
            result,
            image,
            editing_id,
            profile,
            region: "OK",
            stamp,
        }
    }

    #[test]
    fn test_build_record_denormalizes() {
        let profile = DestinationProfile::builtin();
        let image = ImagePayload::new("img");
        let record = build_record("r1", Utc::now(), &result(42.0), &image, &profile, "");

        assert_eq!(record.dimensions.width, 42.0);
        assert_eq!(record.dimensions.pitch, "4/12");
        assert_eq!(record.features.windows, 3);
        assert_eq!(record.description, "A fine shop");
        assert_eq!(record.profile_name, "Main Website");
        // no region setting: fall back to the detected one
        assert_eq!(record.state, "TX");
        assert_eq!(record.full_analysis, result(42.0));
    }

    #[test]
    fn test_new_records_are_prepended() {
        let profile = DestinationProfile::builtin();
        let image = ImagePayload::new("img");
        let mut queue = QueueManager::new();
        let r = result(40.0);

        let first = stamp("a", 1);
        let out = commit(Vec::new(), &mut queue, input(&r, &image, None, &profile, &first));
        let second = stamp("b", 2);
        let out = commit(out.inventory, &mut queue, input(&r, &image, None, &profile, &second));

        let ids: Vec<_> = out.inventory.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(out.inventory[0].state, "OK");
        assert_eq!(out.next_image, None);
    }

    #[test]
    fn test_duplicate_id_is_not_inserted() {
        let profile = DestinationProfile::builtin();
        let image = ImagePayload::new("img");
        let mut queue = QueueManager::new();
        let r = result(40.0);
        let s = stamp("same", 1);

        queue.enqueue(vec![ImagePayload::new("A"), ImagePayload::new("B")], true);
        let out = commit(Vec::new(), &mut queue, input(&r, &image, None, &profile, &s));
        assert_eq!(queue.current(), Some(&ImagePayload::new("B")));

        let out = commit(out.inventory, &mut queue, input(&r, &image, None, &profile, &s));
        assert_eq!(out.inventory.len(), 1);
        assert_eq!(out.record_id, None);
        assert_eq!(out.next_image, None);
        // the image under review stays current
        assert_eq!(queue.current(), Some(&ImagePayload::new("B")));
    }

    #[test]
    fn test_edit_replaces_in_place() {
        let profile = DestinationProfile::builtin();
        let image = ImagePayload::new("img");
        let mut queue = QueueManager::new();
        let r = result(40.0);

        let mut inventory = Vec::new();
        for (id, secs) in [("x", 1), ("y", 2), ("z", 3)] {
            let s = stamp(id, secs);
            inventory = commit(inventory, &mut queue, input(&r, &image, None, &profile, &s)).inventory;
        }
        // [z, y, x]
        let edited = result(50.0);
        let s = stamp("unused", 10);
        let out = commit(inventory, &mut queue, input(&edited, &image, Some("y"), &profile, &s));

        assert_eq!(out.record_id.as_deref(), Some("y"));
        assert_eq!(out.inventory.len(), 3);
        assert_eq!(out.inventory[1].id, "y");
        assert_eq!(out.inventory[1].dimensions.width, 50.0);
        assert_eq!(out.inventory[1].timestamp, s.timestamp);
        assert!(out.inventory.iter().all(|r| r.id != "unused"));
    }

    #[test]
    fn test_edit_of_deleted_record_inserts_new() {
        let profile = DestinationProfile::builtin();
        let image = ImagePayload::new("img");
        let mut queue = QueueManager::new();
        let r = result(40.0);
        let s = stamp("fresh", 1);

        let out = commit(Vec::new(), &mut queue, input(&r, &image, Some("gone"), &profile, &s));
        assert_eq!(out.record_id.as_deref(), Some("fresh"));
        assert_eq!(out.inventory.len(), 1);
    }

    #[test]
    fn test_commit_advances_queue() {
        let profile = DestinationProfile::builtin();
        let image = ImagePayload::new("A");
        let mut queue = QueueManager::new();
        queue.enqueue(vec![ImagePayload::new("A"), ImagePayload::new("B")], true);
        let r = result(40.0);
        let s = stamp("a", 1);

        let out = commit(Vec::new(), &mut queue, input(&r, &image, None, &profile, &s));
        assert_eq!(out.next_image, Some(ImagePayload::new("B")));
        assert_eq!(queue.current(), Some(&ImagePayload::new("B")));
    }
}
