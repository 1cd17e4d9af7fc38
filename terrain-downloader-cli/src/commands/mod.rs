//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`init`] - Write a starter configuration file
//! - [`estimate`] - Tile count and disk usage of a selection
//! - [`plan`] - Per-level tile ranges of a selection
//! - [`download`] - Fetch a selection into the local store

pub mod common;
pub mod download;
pub mod estimate;
pub mod init;
pub mod plan;
