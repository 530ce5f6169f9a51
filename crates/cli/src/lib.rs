//! GCDEX CLI - command orchestrator
//!
//! This crate provides the `gcdex` binary and the command layer it drives.

pub mod commands;
pub mod context;

pub use context::{AppContext, CommitError};
