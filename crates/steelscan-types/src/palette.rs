use serde::{Deserialize, Serialize};

/// Named finish color; the name is what analyses refer to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPaletteEntry {
    pub name: String,
    pub hex: String,
}

impl ColorPaletteEntry {
    pub fn new(name: impl Into<String>, hex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hex: hex.into(),
        }
    }

    /// Entry added from the settings screen before the operator names it
    pub fn template() -> Self {
        Self::new("New Color", "#cccccc")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PalettePatch {
    pub name: Option<String>,
    pub hex: Option<String>,
}

const DEFAULT_PALETTE: [(&str, &str); 20] = [
    ("Charcoal", "#36454f"),
    ("Slate Blue", "#5b7083"),
    ("Burnished Slate", "#4b3f36"),
    ("Forest Green", "#2f4f3a"),
    ("Polar White", "#f4f6f5"),
    ("Light Grey", "#c8cacb"),
    ("Desert Sand", "#d6c3a0"),
    ("Crimson Red", "#9e1b22"),
    ("Hawaiian Blue", "#2b7bb9"),
    ("Gallery Blue", "#2f5f8f"),
    ("Colony Green", "#8a9a6b"),
    ("Copper Penny", "#ad6f3b"),
    ("Rustic Red", "#7b2e22"),
    ("Tan", "#d2b48c"),
    ("Brown", "#5c4033"),
    ("Black", "#1c1c1c"),
    ("Burgundy", "#6d1a2b"),
    ("Clay", "#b7a68a"),
    ("Ash Grey", "#9fa3a5"),
    ("Ivy Green", "#3e5a3c"),
];

/// The twenty stock panel colors
pub fn default_palette() -> Vec<ColorPaletteEntry> {
    DEFAULT_PALETTE
        .iter()
        .map(|(name, hex)| ColorPaletteEntry::new(*name, *hex))
        .collect()
}
