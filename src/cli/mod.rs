//! CLI command handlers

pub mod commands;

pub use commands::{clean, detect_header, run, sheets, transform, validate, RunPaths};
