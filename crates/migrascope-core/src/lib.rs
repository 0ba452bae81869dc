//! Core types, configuration, and error handling for migrascope.
//!
//! This crate provides the shared foundation used by all other migrascope
//! crates:
//! - [`MigError`] — unified error type using `thiserror`
//! - [`MigConfig`] — configuration loaded from `.migrascope.toml`, including
//!   the [`ScoringPolicy`] that holds every classifier threshold and weight
//! - Shared types: [`LineSign`], [`MatchRecord`], [`Classification`],
//!   [`CommitScanResult`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{MigConfig, OutputConfig, RepoConfig, ScoringPolicy};
pub use error::MigError;
pub use types::{
    Classification, CommitScanResult, LineSign, MatchKind, MatchRecord, OutputFormat,
};

/// A convenience `Result` type for migrascope operations.
pub type Result<T> = std::result::Result<T, MigError>;
