//! AI prompt for steel building analysis
//!
//! The JSON template uses placeholders rather than example numbers so the
//! model measures the photo instead of echoing the template. Scale comes
//! from structural bays and door heights.

use serde_json::json;
use steelscan_types::ColorPaletteEntry;

/// Branding strings woven into the generated sales copy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Branding {
    pub brand_name: String,
    pub brand_phone: String,
    pub configurator_url: String,
}

/// JSON skeleton the model must fill in
fn json_template() -> serde_json::Value {
    let variable = json!({ "value": "<number>", "thought": "<how it was measured>" });
    let feature = json!({ "total": "<count>", "thought": "<where they are>" });
    json!({
        "sku": "<short SKU, e.g. WxLxH plus style code>",
        "productTitleShort": "<punchy unique title>",
        "productTitleLong": "<detailed SEO title>",
        "variables": {
            "width": variable,
            "length": variable,
            "wallHeight": variable,
            "peakHeight": variable,
            "pitch": { "value": "<rise/12>", "thought": "<roof slope reasoning>" }
        },
        "colors": {
            "roof": "<palette name>",
            "wall": "<palette name>",
            "trim": "<palette name>",
            "wainscot": "<palette name or None>",
            "thought": "<color reasoning>"
        },
        "features": {
            "garageDoors": feature,
            "manDoors": feature,
            "windows": feature,
            "bays": feature
        },
        "confidence": { "sizing": "<0-1>", "colors": "<0-1>", "overall": "<0-1>" },
        "descriptions": {
            "actualSalesCopy": "<finished listing copy>",
            "templateMarkdown": "<same copy with {{WIDTH}} {{LENGTH}} {{HEIGHT}} {{BRAND}} {{PHONE}} {{CONFIGURATOR_URL}} placeholders>"
        },
        "metadata": { "detectedState": "<two-letter US state code>" }
    })
}

/// Build the analysis prompt for one or more photos of the same building
pub fn build_analysis_prompt(
    palette: &[ColorPaletteEntry],
    branding: &Branding,
    image_count: usize,
) -> String {
    let color_options = palette
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let viewpoint_note = if image_count > 1 {
        format!(
            "You are given {} photos of the SAME building from different angles. \
             Cross-reference them: count each door and window once even if it is visible in several photos.\n\n",
            image_count
        )
    } else {
        String::new()
    };

    let template = serde_json::to_string_pretty(&json_template()).unwrap_or_default();

    format!(
        r#"Perform a high-precision industrial analysis of this prefabricated steel building.
{viewpoint_note}STRUCTURE:
- Count STRUCTURAL BAYS (repeating vertical frame lines along the side walls). Large buildings often have 5-10+ bays.
- Estimate the width of one bay (usually 20ft, 25ft, or 30ft) and use Length = bays x bay width.
- Use standard door heights (man door 7ft, garage door 10-14ft) as the scale reference for wall and peak height.
- Estimate the gable-side width and the roof pitch as rise/12.

FEATURES:
- Count garage doors, man doors and windows.

COLORS:
- Name roof, wall, trim and wainscot colors using ONLY these palette names: [{color_options}].

SALES COPY:
- Write the listing for brand "{brand}" (phone {phone}, configurator {url}).
- Also give the same copy as a template with placeholder tokens.

REGION:
- Guess the US state from vegetation, terrain and architecture; answer with a two-letter code.

Every value must come from the photo. Give a "thought" for each measurement explaining how you arrived at it,
and confidence scores between 0 and 1. All dimensions in feet.

Respond with JSON only, matching:
{template}"#,
        viewpoint_note = viewpoint_note,
        color_options = color_options,
        brand = branding.brand_name,
        phone = branding.brand_phone,
        url = branding.configurator_url,
        template = template,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use steelscan_types::default_palette;

    fn branding() -> Branding {
        Branding {
            brand_name: "Ironclad".to_string(),
            brand_phone: "555-0100".to_string(),
            configurator_url: "https://build.example.com".to_string(),
        }
    }

    #[test]
    fn test_prompt_lists_palette_and_branding() {
        let prompt = build_analysis_prompt(&default_palette(), &branding(), 1);
        assert!(prompt.contains("Charcoal, Slate Blue"));
        assert!(prompt.contains("Ivy Green]"));
        assert!(prompt.contains("\"Ironclad\""));
        assert!(prompt.contains("https://build.example.com"));
        assert!(prompt.contains("\"wallHeight\""));
        assert!(!prompt.contains("different angles"));
    }

    #[test]
    fn test_multi_angle_prompt() {
        let prompt = build_analysis_prompt(&default_palette(), &branding(), 3);
        assert!(prompt.contains("3 photos of the SAME building"));
    }
}
