//! Filesystem emission of migration scan artifacts.
//!
//! Turns [`CommitScanResult`](migrascope_core::CommitScanResult)s into named
//! `.patch` files, dumps addon dependency trees through the external
//! `manifestoo` tool, and writes the per-series README summary.

pub mod artifact;
pub mod deps;
pub mod readme;

pub use artifact::{artifact_filename, render_artifact, slugify, write_artifact};
pub use deps::dump_dependencies;
pub use readme::write_series_readme;
