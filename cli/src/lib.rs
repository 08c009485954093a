//! pgschema CLI internals
//!
//! The binary in `main.rs` parses flags and dispatches to
//! [`commands::plan`] and [`commands::apply`]; everything else lives in
//! `pgschema-core`.

pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use error::CliError;
