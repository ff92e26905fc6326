//! Application service layer - session state, queue, orchestration, config, scanning

pub mod app;
pub mod config;
pub mod repository;
pub mod scanner;
pub mod scheduler;
