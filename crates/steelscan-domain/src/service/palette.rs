//! Color palette lookup and maintenance

use std::fmt;
use steelscan_types::{ColorPaletteEntry, PalettePatch};

/// What a color name resolves to against the current palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Swatch {
    Known(String),
    /// The name is not in the palette (renamed, removed, or invented by the model)
    Unknown,
}

impl Swatch {
    pub fn hex(&self) -> Option<&str> {
        match self {
            Swatch::Known(hex) => Some(hex),
            Swatch::Unknown => None,
        }
    }
}

impl fmt::Display for Swatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Swatch::Known(hex) => f.write_str(hex),
            Swatch::Unknown => f.write_str("unknown"),
        }
    }
}

/// Hex for `name`; first match wins
pub fn resolve_color(name: &str, palette: &[ColorPaletteEntry]) -> Swatch {
    palette
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| Swatch::Known(entry.hex.clone()))
        .unwrap_or(Swatch::Unknown)
}

/// Whether an entry other than `except` already uses `name`
pub fn name_taken(palette: &[ColorPaletteEntry], name: &str, except: Option<usize>) -> bool {
    palette
        .iter()
        .enumerate()
        .any(|(i, entry)| Some(i) != except && entry.name == name)
}

/// Append `entry`. Refused when the name is already used.
pub fn add_color(palette: &mut Vec<ColorPaletteEntry>, entry: ColorPaletteEntry) -> bool {
    if name_taken(palette, &entry.name, None) {
        return false;
    }
    palette.push(entry);
    true
}

/// Patch the entry at `index`. Refused when out of range or when the
/// rename collides with another entry.
pub fn update_color(palette: &mut [ColorPaletteEntry], index: usize, patch: &PalettePatch) -> bool {
    if index >= palette.len() {
        return false;
    }
    if let Some(ref name) = patch.name {
        if name_taken(palette, name, Some(index)) {
            return false;
        }
    }

    let entry = &mut palette[index];
    if let Some(ref name) = patch.name {
        entry.name = name.clone();
    }
    if let Some(ref hex) = patch.hex {
        entry.hex = hex.clone();
    }
    true
}

pub fn remove_color(palette: &mut Vec<ColorPaletteEntry>, index: usize) -> bool {
    if index >= palette.len() {
        return false;
    }
    palette.remove(index);
    true
}
