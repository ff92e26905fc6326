//! Domain layer: destination business rules, palette lookup, store contract

pub mod repository;
pub mod service;
