//! Git history traversal for migrascope.
//!
//! Supplies the classifier with an ordered, path-scoped commit list and
//! per-commit unified-diff text via git2: release series boundary lookup,
//! merge-base range resolution, addon enumeration from a commit tree, and
//! the rayon-parallel commit-set scanner.

pub mod addons;
pub mod scan;
pub mod series;

pub use addons::{list_addons, module_path};
pub use scan::{is_forward_port, scan_addon_commits, ScanOptions};
pub use series::{find_series_end, find_series_start, resolve_series_commit, SeriesBoundary};
