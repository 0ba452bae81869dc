//! Addon enumeration from a commit tree.
//!
//! Reads the `addons/` directory of the target series commit directly from
//! the object database, so no branch checkout is needed to know which
//! modules exist at that point in history.

use std::path::Path;

use git2::{ObjectType, Oid, Repository};

use migrascope_core::{MigError, RepoConfig};

/// The scan scope for one addon: its `models/` directory.
///
/// # Examples
///
/// ```
/// use migrascope_history::addons::module_path;
///
/// assert_eq!(module_path("sale"), "addons/sale/models/");
/// assert_eq!(module_path("base"), "odoo/addons/base/models/");
/// ```
pub fn module_path(addon: &str) -> String {
    if addon == "base" {
        "odoo/addons/base/models/".into()
    } else {
        format!("addons/{addon}/models/")
    }
}

/// List scannable addon names at `commit`: `base` plus every directory
/// under `addons/`, minus configured prefix excludes and skip globs.
/// Returned sorted for deterministic scan order.
///
/// # Errors
///
/// Returns [`MigError::Git`] when the commit or its `addons/` tree cannot
/// be read.
pub fn list_addons(
    repo: &Repository,
    commit: Oid,
    config: &RepoConfig,
) -> Result<Vec<String>, MigError> {
    let commit = repo
        .find_commit(commit)
        .map_err(|e| MigError::Git(format!("failed to find commit: {e}")))?;
    let tree = commit
        .tree()
        .map_err(|e| MigError::Git(format!("failed to get commit tree: {e}")))?;

    let addons_entry = tree
        .get_path(Path::new("addons"))
        .map_err(|e| MigError::Git(format!("no addons directory at this commit: {e}")))?;
    let addons_tree = addons_entry
        .to_object(repo)
        .and_then(|o| o.peel_to_tree())
        .map_err(|e| MigError::Git(format!("addons entry is not a tree: {e}")))?;

    let skip_globs: Vec<glob::Pattern> = config
        .skip_globs
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect();

    let mut addons = vec!["base".to_string()];
    for entry in addons_tree.iter() {
        if entry.kind() != Some(ObjectType::Tree) {
            continue;
        }
        let Some(name) = entry.name() else {
            continue;
        };
        if config
            .exclude_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
        {
            continue;
        }
        if skip_globs.iter().any(|p| p.matches(name)) {
            continue;
        }
        addons.push(name.to_string());
    }

    addons.sort();
    Ok(addons)
}
