//! Core types for steel building analysis and inventory

mod analysis;
mod error;
mod inventory;
mod palette;
mod payload;
mod profile;
pub mod region;

pub use analysis::*;
pub use error::*;
pub use inventory::*;
pub use palette::*;
pub use payload::ImagePayload;
pub use profile::*;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format for results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
