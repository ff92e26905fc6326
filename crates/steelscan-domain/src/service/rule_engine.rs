//! Destination business rules applied to a raw analysis
//!
//! Width, length and wall height get the profile's offset when the
//! matching rule is enabled. Pitch and peak height are never adjusted.
//! Results are not clamped: a large negative offset can drive a
//! dimension below zero.

use steelscan_types::{
    AnalysisResult, AnalysisVariables, DestinationProfile, DimensionRule, PartialVariables,
    RawAnalysis, VariableInsight, VariableValue,
};
use tracing::debug;

/// Left-biased merge: variables present in `raw` win, the rest come
/// from `defaults`.
pub fn merge_variables(raw: &PartialVariables, defaults: &AnalysisVariables) -> AnalysisVariables {
    AnalysisVariables {
        width: raw.width.clone().unwrap_or_else(|| defaults.width.clone()),
        length: raw.length.clone().unwrap_or_else(|| defaults.length.clone()),
        wall_height: raw
            .wall_height
            .clone()
            .unwrap_or_else(|| defaults.wall_height.clone()),
        peak_height: raw
            .peak_height
            .clone()
            .unwrap_or_else(|| defaults.peak_height.clone()),
        pitch: raw.pitch.clone().unwrap_or_else(|| defaults.pitch.clone()),
    }
}

/// Apply `profile`'s dimension rules to `raw`.
///
/// Missing variables are filled from [`AnalysisVariables::default`] first.
/// Every field other than the three governed dimensions passes through.
pub fn apply(raw: &RawAnalysis, profile: &DestinationProfile) -> AnalysisResult {
    let merged = merge_variables(&raw.variables, &AnalysisVariables::default());
    let rules = &profile.rules;

    let variables = AnalysisVariables {
        width: adjust("width", merged.width, &rules.width),
        length: adjust("length", merged.length, &rules.length),
        wall_height: adjust("wallHeight", merged.wall_height, &rules.height),
        ..merged
    };

    raw.clone().with_variables(variables)
}

fn adjust(name: &str, insight: VariableInsight, rule: &DimensionRule) -> VariableInsight {
    if !rule.enabled {
        return insight;
    }

    match insight.value.as_f64() {
        Some(value) => VariableInsight {
            value: VariableValue::Number(value + rule.offset),
            ..insight
        },
        None => {
            debug!(variable = name, value = %insight.value, "non-numeric dimension left unadjusted");
            insight
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steelscan_types::{BuildingColors, PartialVariables};

    fn raw_with(width: f64, length: f64, wall: f64) -> RawAnalysis {
        RawAnalysis {
            sku: "SB-40".to_string(),
            product_title_short: "40x60 Shop".to_string(),
            variables: PartialVariables {
                width: Some(VariableInsight::new(VariableValue::Number(width), "gable")),
                length: Some(VariableInsight::number(length)),
                wall_height: Some(VariableInsight::number(wall)),
                peak_height: Some(VariableInsight::number(18.0)),
                pitch: Some(VariableInsight::new(VariableValue::Text("4/12".into()), "")),
            },
            colors: BuildingColors {
                roof: "Charcoal".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn profile(width: DimensionRule, length: DimensionRule, height: DimensionRule) -> DestinationProfile {
        let mut profile = DestinationProfile::builtin();
        profile.rules.width = width;
        profile.rules.length = length;
        profile.rules.height = height;
        profile
    }

    #[test]
    fn test_enabled_width_offset() {
        let p = profile(
            DimensionRule::enabled(2.0),
            DimensionRule::disabled(),
            DimensionRule::disabled(),
        );
        let result = apply(&raw_with(40.0, 60.0, 14.0), &p);

        assert_eq!(result.variables.width.value, VariableValue::Number(42.0));
        assert_eq!(result.variables.width.thought, "gable");
        assert_eq!(result.variables.length.value, VariableValue::Number(60.0));
        assert_eq!(result.variables.wall_height.value, VariableValue::Number(14.0));
    }

    #[test]
    fn test_all_rules_enabled() {
        let p = profile(
            DimensionRule::enabled(1.0),
            DimensionRule::enabled(-5.0),
            DimensionRule::enabled(0.5),
        );
        let result = apply(&raw_with(30.0, 50.0, 12.0), &p);

        assert_eq!(result.variables.width.value, VariableValue::Number(31.0));
        assert_eq!(result.variables.length.value, VariableValue::Number(45.0));
        assert_eq!(result.variables.wall_height.value, VariableValue::Number(12.5));
        // never adjusted
        assert_eq!(result.variables.peak_height.value, VariableValue::Number(18.0));
        assert_eq!(result.variables.pitch.value, VariableValue::Text("4/12".into()));
    }

    #[test]
    fn test_negative_result_is_not_clamped() {
        let p = profile(
            DimensionRule::enabled(-50.0),
            DimensionRule::disabled(),
            DimensionRule::disabled(),
        );
        let result = apply(&raw_with(40.0, 60.0, 14.0), &p);
        assert_eq!(result.variables.width.value, VariableValue::Number(-10.0));
    }

    #[test]
    fn test_disabled_rule_ignores_offset() {
        let p = profile(
            DimensionRule {
                enabled: false,
                offset: 10.0,
            },
            DimensionRule::disabled(),
            DimensionRule::disabled(),
        );
        let raw = raw_with(40.0, 60.0, 14.0);
        let result = apply(&raw, &p);
        assert_eq!(Some(result.variables.width), raw.variables.width);
    }

    #[test]
    fn test_non_dimensional_fields_pass_through() {
        let p = profile(
            DimensionRule::enabled(3.0),
            DimensionRule::enabled(3.0),
            DimensionRule::enabled(3.0),
        );
        let raw = raw_with(40.0, 60.0, 14.0);
        let result = apply(&raw, &p);

        assert_eq!(result.sku, raw.sku);
        assert_eq!(result.product_title_short, raw.product_title_short);
        assert_eq!(result.colors, raw.colors);
        assert_eq!(result.features, raw.features);
        assert_eq!(result.confidence, raw.confidence);
        assert_eq!(result.descriptions, raw.descriptions);
        assert_eq!(result.metadata, raw.metadata);
    }

    #[test]
    fn test_missing_variables_get_defaults_before_rules() {
        let p = profile(
            DimensionRule::enabled(2.0),
            DimensionRule::disabled(),
            DimensionRule::disabled(),
        );
        let raw = RawAnalysis::default();
        let result = apply(&raw, &p);

        assert_eq!(result.variables.width.value, VariableValue::Number(2.0));
        assert_eq!(result.variables.length.value, VariableValue::Number(0.0));
        assert_eq!(result.variables.pitch.value, VariableValue::Text("3/12".into()));
    }

    #[test]
    fn test_null_pitch_falls_back_to_default() {
        let raw: RawAnalysis =
            serde_json::from_str(r#"{"variables": {"pitch": {"value": null}}}"#).unwrap();
        let result = apply(&raw, &DestinationProfile::builtin());
        assert_eq!(result.variables.pitch.value, VariableValue::Text("3/12".into()));
    }

    #[test]
    fn test_numeric_text_is_adjusted_other_text_is_not() {
        let p = profile(
            DimensionRule::enabled(2.0),
            DimensionRule::enabled(2.0),
            DimensionRule::disabled(),
        );
        let mut raw = raw_with(0.0, 0.0, 10.0);
        raw.variables.width = Some(VariableInsight::new(VariableValue::Text("40".into()), ""));
        raw.variables.length = Some(VariableInsight::new(VariableValue::Text("unknown".into()), ""));

        let result = apply(&raw, &p);
        assert_eq!(result.variables.width.value, VariableValue::Number(42.0));
        assert_eq!(result.variables.length.value, VariableValue::Text("unknown".into()));
    }

    #[test]
    fn test_apply_is_deterministic() {
        let p = profile(
            DimensionRule::enabled(2.0),
            DimensionRule::enabled(-1.0),
            DimensionRule::enabled(0.0),
        );
        let raw = raw_with(40.0, 60.0, 14.0);
        assert_eq!(apply(&raw, &p), apply(&raw, &p));
    }

    #[test]
    fn test_merge_is_left_biased() {
        let raw = PartialVariables {
            pitch: Some(VariableInsight::new(VariableValue::Text("1/12".into()), "low")),
            ..Default::default()
        };
        let merged = merge_variables(&raw, &AnalysisVariables::default());
        assert_eq!(merged.pitch.thought, "low");
        assert_eq!(merged.width, AnalysisVariables::default().width);
    }
}
