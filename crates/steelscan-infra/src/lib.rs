//! Infrastructure layer - persisted store implementations

pub mod persistence;
