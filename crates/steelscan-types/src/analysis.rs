//! Structured output of one building analysis

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Pitch used when the model does not report one
pub const DEFAULT_PITCH: &str = "3/12";

/// Deserialize null as default value
fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::deserialize(deserializer).map(|opt| opt.unwrap_or_default())
}

/// A variable only counts as reported when it carries a value; null or
/// missing values fall through to the defaults in the merge.
fn reported_insight<'de, D>(deserializer: D) -> Result<Option<VariableInsight>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Reported {
        #[serde(default)]
        value: Option<VariableValue>,
        #[serde(default, deserialize_with = "null_to_default")]
        thought: String,
    }

    let reported = Option::<Reported>::deserialize(deserializer)?;
    Ok(reported.and_then(|r| r.value.map(|value| VariableInsight::new(value, r.thought))))
}

/// Deserialize a count that may arrive as a float or null
fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    if !value.is_finite() || value <= 0.0 {
        return Ok(0);
    }
    Ok(value.round().min(u32::MAX as f64) as u32)
}

/// A variable's value: the model answers with numbers for dimensions
/// and strings for pitch, but either may show up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Number(f64),
    Text(String),
}

impl VariableValue {
    /// Numeric reading of the value, parsing text like "40" or "40.5"
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            VariableValue::Number(n) => Some(*n),
            VariableValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl Default for VariableValue {
    fn default() -> Self {
        VariableValue::Number(0.0)
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            VariableValue::Number(n) => write!(f, "{:.1}", n),
            VariableValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A value with the model's explanation of how it got there
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableInsight {
    #[serde(default, deserialize_with = "null_to_default")]
    pub value: VariableValue,
    #[serde(default, deserialize_with = "null_to_default")]
    pub thought: String,
}

impl VariableInsight {
    pub fn new(value: VariableValue, thought: impl Into<String>) -> Self {
        Self {
            value,
            thought: thought.into(),
        }
    }

    pub fn number(value: f64) -> Self {
        Self::new(VariableValue::Number(value), "")
    }
}

/// Variables as returned by the gateway; any of them may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialVariables {
    #[serde(
        default,
        deserialize_with = "reported_insight",
        skip_serializing_if = "Option::is_none"
    )]
    pub width: Option<VariableInsight>,
    #[serde(
        default,
        deserialize_with = "reported_insight",
        skip_serializing_if = "Option::is_none"
    )]
    pub length: Option<VariableInsight>,
    #[serde(
        default,
        deserialize_with = "reported_insight",
        skip_serializing_if = "Option::is_none"
    )]
    pub wall_height: Option<VariableInsight>,
    #[serde(
        default,
        deserialize_with = "reported_insight",
        skip_serializing_if = "Option::is_none"
    )]
    pub peak_height: Option<VariableInsight>,
    #[serde(
        default,
        deserialize_with = "reported_insight",
        skip_serializing_if = "Option::is_none"
    )]
    pub pitch: Option<VariableInsight>,
}

/// Complete set of dimensional variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisVariables {
    pub width: VariableInsight,
    pub length: VariableInsight,
    pub wall_height: VariableInsight,
    pub peak_height: VariableInsight,
    pub pitch: VariableInsight,
}

/// The documented defaults: every dimension is 0 ft and pitch is 3/12.
impl Default for AnalysisVariables {
    fn default() -> Self {
        Self {
            width: VariableInsight::number(0.0),
            length: VariableInsight::number(0.0),
            wall_height: VariableInsight::number(0.0),
            peak_height: VariableInsight::number(0.0),
            pitch: VariableInsight::new(VariableValue::Text(DEFAULT_PITCH.to_string()), ""),
        }
    }
}

/// Palette color names per building surface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingColors {
    #[serde(default, deserialize_with = "null_to_default")]
    pub roof: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub wall: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub trim: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub wainscot: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub thought: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureInsight {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total: u32,
    #[serde(default, deserialize_with = "null_to_default")]
    pub thought: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingFeatures {
    #[serde(default, deserialize_with = "null_to_default")]
    pub garage_doors: FeatureInsight,
    #[serde(default, deserialize_with = "null_to_default")]
    pub man_doors: FeatureInsight,
    #[serde(default, deserialize_with = "null_to_default")]
    pub windows: FeatureInsight,
    #[serde(default, deserialize_with = "null_to_default")]
    pub bays: FeatureInsight,
}

/// Confidence scores in [0, 1]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfidence {
    #[serde(default, deserialize_with = "null_to_default")]
    pub sizing: f64,
    #[serde(default, deserialize_with = "null_to_default")]
    pub colors: f64,
    #[serde(default, deserialize_with = "null_to_default")]
    pub overall: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptions {
    /// Finished sales copy
    #[serde(default, deserialize_with = "null_to_default")]
    pub actual_sales_copy: String,
    /// Copy template with placeholder tokens
    #[serde(default, deserialize_with = "null_to_default")]
    pub template_markdown: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    /// Region code the model believes the building is in
    #[serde(default, deserialize_with = "null_to_default")]
    pub detected_state: String,
}

/// Analysis of one building, generic over how complete its variables are.
///
/// The gateway produces [`RawAnalysis`]; the rule engine turns it into an
/// [`AnalysisResult`] which is what gets reviewed and committed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(
    serialize = "V: Serialize",
    deserialize = "V: Deserialize<'de> + Default"
))]
pub struct BuildingAnalysis<V> {
    #[serde(default, deserialize_with = "null_to_default")]
    pub sku: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub product_title_short: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub product_title_long: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub variables: V,
    #[serde(default, deserialize_with = "null_to_default")]
    pub colors: BuildingColors,
    #[serde(default, deserialize_with = "null_to_default")]
    pub features: BuildingFeatures,
    #[serde(default, deserialize_with = "null_to_default")]
    pub confidence: AnalysisConfidence,
    #[serde(default, deserialize_with = "null_to_default")]
    pub descriptions: Descriptions,
    #[serde(default, deserialize_with = "null_to_default")]
    pub metadata: AnalysisMetadata,
}

impl<V> BuildingAnalysis<V> {
    /// Swap the variables, keeping every other field as is
    pub fn with_variables<W>(self, variables: W) -> BuildingAnalysis<W> {
        BuildingAnalysis {
            sku: self.sku,
            product_title_short: self.product_title_short,
            product_title_long: self.product_title_long,
            variables,
            colors: self.colors,
            features: self.features,
            confidence: self.confidence,
            descriptions: self.descriptions,
            metadata: self.metadata,
        }
    }
}

/// Gateway output
pub type RawAnalysis = BuildingAnalysis<PartialVariables>;

/// Rule-adjusted analysis
pub type AnalysisResult = BuildingAnalysis<AnalysisVariables>;
