//! services/portal/src/lib.rs
//!
//! The terminal portal: configuration, adapters for the core ports and the
//! command-line screens.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
