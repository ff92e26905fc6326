//! Destination profiles: where a building gets listed and how its
//! measurements are adjusted for that destination

use serde::{Deserialize, Serialize};

use crate::region::all_regions;

/// Signed offset (feet) applied to one dimension when enabled
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionRule {
    pub enabled: bool,
    pub offset: f64,
}

impl DimensionRule {
    pub fn enabled(offset: f64) -> Self {
        Self {
            enabled: true,
            offset,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRules {
    pub width: DimensionRule,
    pub length: DimensionRule,
    /// Applies to wall height
    pub height: DimensionRule,
    pub allow_red_iron: bool,
    pub allow_galvanized: bool,
    /// Region codes this profile can sell into
    pub states: Vec<String>,
}

impl Default for ProfileRules {
    fn default() -> Self {
        Self {
            width: DimensionRule::enabled(0.0),
            length: DimensionRule::enabled(0.0),
            height: DimensionRule::enabled(0.0),
            allow_red_iron: true,
            allow_galvanized: true,
            states: all_regions(),
        }
    }
}

/// A sales destination with its own branding and rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationProfile {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub phone: String,
    pub configurator_url: String,
    #[serde(default)]
    pub description: String,
    pub rules: ProfileRules,
}

impl DestinationProfile {
    /// Id used by the built-in profile
    pub const DEFAULT_ID: &'static str = "default";

    /// Fresh random profile id
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// Template for an operator-created profile
    pub fn new_template(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: "New Website".to_string(),
            brand: "New Brand".to_string(),
            phone: "888-555-0199".to_string(),
            configurator_url: "https://configurator.brand.com".to_string(),
            description: String::new(),
            rules: ProfileRules::default(),
        }
    }

    /// Profile used on first run, covering every region
    pub fn builtin() -> Self {
        Self {
            id: Self::DEFAULT_ID.to_string(),
            name: "Main Website".to_string(),
            brand: "SteelStructure".to_string(),
            ..Self::new_template(Self::DEFAULT_ID)
        }
    }

    /// Whether `region` is one of the codes this profile serves
    pub fn sells_in(&self, region: &str) -> bool {
        let region = region.trim();
        self.rules.states.iter().any(|s| s.eq_ignore_ascii_case(region))
    }
}

/// Partial update of a profile; `None` leaves the field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub phone: Option<String>,
    pub configurator_url: Option<String>,
    pub description: Option<String>,
    pub width: Option<DimensionRule>,
    pub length: Option<DimensionRule>,
    pub height: Option<DimensionRule>,
    pub allow_red_iron: Option<bool>,
    pub allow_galvanized: Option<bool>,
    pub states: Option<Vec<String>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sells_in() {
        let mut profile = DestinationProfile::builtin();
        assert!(profile.sells_in("TX"));

        profile.rules.states = vec!["OK".to_string(), "NM".to_string()];
        assert!(profile.sells_in("ok"));
        assert!(!profile.sells_in("TX"));
        assert!(!profile.sells_in(""));
    }
}
