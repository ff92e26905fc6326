//! CLI definition using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use steelscan_types::{DimensionRule, OutputFormat, ProfilePatch};

#[derive(Parser)]
#[command(name = "steelscan")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Steel building photo analysis and inventory")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Model name override
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Store directory override
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze photos and add them to the inventory
    Process {
        /// Image files or folders
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Confirm each result instead of saving automatically
        #[arg(long)]
        review: bool,

        /// Destination profile id to analyze for
        #[arg(long, short = 'p')]
        profile: Option<String>,

        /// Region code recorded on saved records (e.g., TX). A region the
        /// model detects in a photo replaces it, so this only applies when
        /// none is detected.
        #[arg(long, short = 'r')]
        region: Option<String>,
    },

    /// Browse and maintain saved inventory records
    Inventory {
        #[command(subcommand)]
        action: InventoryCommand,
    },

    /// Manage destination profiles
    Profiles {
        #[command(subcommand)]
        action: ProfileCommand,
    },

    /// Manage the color palette
    Palette {
        #[command(subcommand)]
        action: PaletteCommand,
    },

    /// Configure settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set model
        #[arg(long)]
        set_model: Option<String>,

        /// Set API key
        #[arg(long)]
        set_api_key: Option<String>,

        /// Set analysis endpoint
        #[arg(long)]
        set_endpoint: Option<String>,

        /// Enable/disable auto-pilot saving
        #[arg(long)]
        set_auto_pilot: Option<bool>,

        /// Set analysis timeout in seconds
        #[arg(long)]
        set_timeout: Option<u64>,

        /// Set auto-save delay in milliseconds
        #[arg(long)]
        set_auto_save_delay: Option<u64>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
pub enum InventoryCommand {
    /// List records, newest first
    List {
        /// Number of records to show
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },

    /// Show one record in full
    Show { id: String },

    /// Delete a record
    Delete {
        id: String,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Revise a saved record
    Edit {
        id: String,

        #[command(flatten)]
        fields: RecordEdits,

        /// Analyze the stored photo again before applying the edits
        #[arg(long)]
        reanalyze: bool,
    },
}

/// Field overrides for `inventory edit`
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct RecordEdits {
    /// Width in feet
    #[arg(long)]
    pub width: Option<f64>,

    /// Length in feet
    #[arg(long)]
    pub length: Option<f64>,

    /// Wall height in feet
    #[arg(long)]
    pub height: Option<f64>,

    /// Roof pitch (e.g., 4/12)
    #[arg(long)]
    pub pitch: Option<String>,

    #[arg(long)]
    pub sku: Option<String>,

    /// Short product title
    #[arg(long)]
    pub title: Option<String>,

    /// Long product title
    #[arg(long)]
    pub long_title: Option<String>,

    /// Sales copy
    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub roof: Option<String>,

    #[arg(long)]
    pub wall: Option<String>,

    #[arg(long)]
    pub trim: Option<String>,

    #[arg(long)]
    pub wainscot: Option<String>,
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// List profiles
    List,

    /// Add a profile from the template
    Add {
        #[command(flatten)]
        fields: ProfileFields,
    },

    /// Update a profile
    Update {
        id: String,

        #[command(flatten)]
        fields: ProfileFields,
    },

    /// Delete a profile
    Delete { id: String },

    /// Make a profile the default for new analyses
    Select { id: String },
}

/// Profile fields settable from the command line
#[derive(Args, Debug, Default, Clone)]
pub struct ProfileFields {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub brand: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub configurator_url: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Enable the width rule with this offset (feet)
    #[arg(long, allow_hyphen_values = true)]
    pub width_offset: Option<f64>,

    /// Disable the width rule
    #[arg(long, conflicts_with = "width_offset")]
    pub no_width_rule: bool,

    /// Enable the length rule with this offset (feet)
    #[arg(long, allow_hyphen_values = true)]
    pub length_offset: Option<f64>,

    /// Disable the length rule
    #[arg(long, conflicts_with = "length_offset")]
    pub no_length_rule: bool,

    /// Enable the wall height rule with this offset (feet)
    #[arg(long, allow_hyphen_values = true)]
    pub height_offset: Option<f64>,

    /// Disable the wall height rule
    #[arg(long, conflicts_with = "height_offset")]
    pub no_height_rule: bool,

    /// Allow red iron framing
    #[arg(long)]
    pub red_iron: Option<bool>,

    /// Allow galvanized framing
    #[arg(long)]
    pub galvanized: Option<bool>,

    /// Region codes served, comma separated (e.g., TX,OK,NM)
    #[arg(long, value_delimiter = ',')]
    pub states: Option<Vec<String>>,
}

impl RecordEdits {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn dimension_rule(offset: Option<f64>, disabled: bool) -> Option<DimensionRule> {
    if disabled {
        Some(DimensionRule::disabled())
    } else {
        offset.map(DimensionRule::enabled)
    }
}

impl ProfileFields {
    pub fn to_patch(&self) -> ProfilePatch {
        ProfilePatch {
            name: self.name.clone(),
            brand: self.brand.clone(),
            phone: self.phone.clone(),
            configurator_url: self.configurator_url.clone(),
            description: self.description.clone(),
            width: dimension_rule(self.width_offset, self.no_width_rule),
            length: dimension_rule(self.length_offset, self.no_length_rule),
            height: dimension_rule(self.height_offset, self.no_height_rule),
            allow_red_iron: self.red_iron,
            allow_galvanized: self.galvanized,
            states: self.states.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum PaletteCommand {
    /// List palette colors with their index
    List,

    /// Add a color
    Add {
        name: String,

        /// Hex value (e.g., #36454f)
        hex: String,
    },

    /// Rename or recolor an entry
    Update {
        index: usize,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        hex: Option<String>,
    },

    /// Remove an entry
    Remove { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_profile_fields_to_patch() {
        let cli = Cli::parse_from([
            "steelscan",
            "profiles",
            "update",
            "p1",
            "--width-offset",
            "-2",
            "--no-length-rule",
            "--states",
            "tx,ok",
        ]);
        let Commands::Profiles {
            action: ProfileCommand::Update { id, fields },
        } = cli.command
        else {
            panic!("expected profiles update");
        };

        let patch = fields.to_patch();
        assert_eq!(id, "p1");
        assert_eq!(patch.width, Some(DimensionRule::enabled(-2.0)));
        assert_eq!(patch.length, Some(DimensionRule::disabled()));
        assert_eq!(patch.height, None);
        assert_eq!(patch.states, Some(vec!["tx".to_string(), "ok".to_string()]));
        assert!(patch.name.is_none());
    }

    #[test]
    fn test_region_help_mentions_detected_region() {
        let cli = Cli::command();
        let process = cli.find_subcommand("process").unwrap();
        let region = process
            .get_arguments()
            .find(|arg| arg.get_id() == "region")
            .unwrap();
        let help = region.get_help().unwrap().to_string();
        assert!(help.contains("detects"));
    }

    #[test]
    fn test_empty_profile_fields() {
        assert!(ProfileFields::default().to_patch().is_empty());
    }
}
