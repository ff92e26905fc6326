//! Domain services

pub mod palette;
pub mod profiles;
pub mod rule_engine;

pub use palette::{resolve_color, Swatch};
pub use rule_engine::{apply, merge_variables};
