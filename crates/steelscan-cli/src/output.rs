//! Output formatting module

use chrono::Local;
use serde::Serialize;
use steelscan_domain::service::resolve_color;
use steelscan_types::{
    AnalysisResult, ColorPaletteEntry, DestinationProfile, DimensionRule, InventoryRecord,
    OutputFormat, Result,
};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}

fn color_line(label: &str, name: &str, palette: &[ColorPaletteEntry]) {
    if name.is_empty() {
        println!("{:<16} -", label);
    } else {
        println!("{:<16} {} ({})", label, name, resolve_color(name, palette));
    }
}

pub fn output_result(
    output_format: OutputFormat,
    result: &AnalysisResult,
    palette: &[ColorPaletteEntry],
    image_name: &str,
) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(result);
    }

    let v = &result.variables;
    println!("\nAnalysis Result: {}", image_name);
    println!("===============");
    println!("SKU:             {}", result.sku);
    println!("Title:           {}", result.product_title_short);
    println!("\n--- Dimensions ---");
    println!("Width:           {} ft", v.width.value);
    println!("Length:          {} ft", v.length.value);
    println!("Wall height:     {} ft", v.wall_height.value);
    println!("Peak height:     {} ft", v.peak_height.value);
    println!("Pitch:           {}", v.pitch.value);
    println!("------------------");
    color_line("Roof:", &result.colors.roof, palette);
    color_line("Wall:", &result.colors.wall, palette);
    color_line("Trim:", &result.colors.trim, palette);
    color_line("Wainscot:", &result.colors.wainscot, palette);
    println!(
        "Openings:        {} garage, {} walk-in, {} windows",
        result.features.garage_doors.total,
        result.features.man_doors.total,
        result.features.windows.total
    );
    println!(
        "Confidence:      sizing {:.0}%, colors {:.0}%",
        result.confidence.sizing * 100.0,
        result.confidence.colors * 100.0
    );
    if !result.metadata.detected_state.is_empty() {
        println!("Detected state:  {}", result.metadata.detected_state);
    }

    if !result.descriptions.actual_sales_copy.is_empty() {
        println!("\nDescription:");
        println!("{}", result.descriptions.actual_sales_copy);
    }

    Ok(())
}

/// One row of `inventory list --format json`; the photo is left out
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordSummary<'a> {
    id: &'a str,
    timestamp: i64,
    sku: &'a str,
    product_title_short: &'a str,
    profile_name: &'a str,
    width: f64,
    length: f64,
    height: f64,
    state: &'a str,
}

impl<'a> From<&'a InventoryRecord> for RecordSummary<'a> {
    fn from(record: &'a InventoryRecord) -> Self {
        Self {
            id: &record.id,
            timestamp: record.timestamp.timestamp_millis(),
            sku: &record.sku,
            product_title_short: &record.product_title_short,
            profile_name: &record.profile_name,
            width: record.dimensions.width,
            length: record.dimensions.length,
            height: record.dimensions.height,
            state: &record.state,
        }
    }
}

pub fn output_inventory(
    output_format: OutputFormat,
    records: &[InventoryRecord],
    limit: usize,
) -> Result<()> {
    if output_format == OutputFormat::Json {
        let rows: Vec<RecordSummary> = records.iter().take(limit).map(Into::into).collect();
        return print_json(&rows);
    }

    println!("Inventory");
    println!("=========");
    println!("Total records: {}", records.len());
    println!();

    if records.is_empty() {
        println!("No records found.");
        return Ok(());
    }

    println!(
        "{:<32} {:<14} {:>14} {:<6} {:>11}",
        "ID", "SKU", "Size (ft)", "State", "Saved"
    );
    println!("{}", "-".repeat(81));

    for record in records.iter().take(limit) {
        let d = &record.dimensions;
        let size = format!("{}x{}x{}", d.width, d.length, d.height);
        println!(
            "{:<32} {:<14} {:>14} {:<6} {:>11}",
            record.id,
            truncate(&record.sku, 14),
            size,
            record.state,
            record.timestamp.with_timezone(&Local).format("%m/%d %H:%M").to_string()
        );
    }

    if records.len() > limit {
        println!();
        println!("... and {} more records", records.len() - limit);
    }

    Ok(())
}

pub fn output_record(
    output_format: OutputFormat,
    record: &InventoryRecord,
    palette: &[ColorPaletteEntry],
) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(record);
    }

    let d = &record.dimensions;
    println!("\nRecord {}", record.id);
    println!("======");
    println!("Saved:           {}", record.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    println!("SKU:             {}", record.sku);
    println!("Title:           {}", record.product_title_short);
    println!("Long title:      {}", record.product_title_long);
    println!("Profile:         {} ({})", record.profile_name, record.brand);
    println!("State:           {}", record.state);
    println!("Size:            {} x {} x {} ft, pitch {}", d.width, d.length, d.height, d.pitch);
    color_line("Roof:", &record.colors.roof, palette);
    color_line("Wall:", &record.colors.wall, palette);
    color_line("Trim:", &record.colors.trim, palette);
    color_line("Wainscot:", &record.colors.wainscot, palette);
    println!(
        "Openings:        {} garage, {} walk-in, {} windows",
        record.features.garage_doors, record.features.man_doors, record.features.windows
    );
    println!(
        "Confidence:      sizing {:.0}%, colors {:.0}%",
        record.confidence.sizing * 100.0,
        record.confidence.colors * 100.0
    );

    if !record.description.is_empty() {
        println!("\nDescription:");
        println!("{}", record.description);
    }

    Ok(())
}

fn rule_label(rule: &DimensionRule) -> String {
    if rule.enabled {
        format!("{:+}", rule.offset)
    } else {
        "off".to_string()
    }
}

pub fn output_profiles(
    output_format: OutputFormat,
    profiles: &[DestinationProfile],
    selected_id: &str,
) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(profiles);
    }

    println!(
        "  {:<34} {:<20} {:<18} {:>6} {:>6} {:>6} {:>7}",
        "ID", "Name", "Brand", "W", "L", "H", "States"
    );
    println!("{}", "-".repeat(107));

    for profile in profiles {
        let marker = if profile.id == selected_id { "*" } else { " " };
        let rules = &profile.rules;
        println!(
            "{} {:<34} {:<20} {:<18} {:>6} {:>6} {:>6} {:>7}",
            marker,
            profile.id,
            truncate(&profile.name, 20),
            truncate(&profile.brand, 18),
            rule_label(&rules.width),
            rule_label(&rules.length),
            rule_label(&rules.height),
            rules.states.len()
        );
    }

    Ok(())
}

pub fn output_palette(output_format: OutputFormat, palette: &[ColorPaletteEntry]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(palette);
    }

    println!("{:>3}  {:<24} {}", "#", "Name", "Hex");
    println!("{}", "-".repeat(38));
    for (index, entry) in palette.iter().enumerate() {
        println!("{:>3}  {:<24} {}", index, entry.name, entry.hex);
    }

    Ok(())
}
