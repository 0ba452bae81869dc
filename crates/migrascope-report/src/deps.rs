//! Dependency-tree dumps via the external `manifestoo` tool.
//!
//! Expliciting each addon's dependency tree next to its migration patches
//! helps reviewers plan upgrade order. The tool lives outside this crate;
//! a missing executable is surfaced as an error the caller downgrades to a
//! warning.

use std::path::{Path, PathBuf};
use std::process::Command;

use migrascope_core::MigError;

const DEPENDENCY_TOOL: &str = "manifestoo";

/// Run `manifestoo ... tree` for `addon` and write its stdout to
/// `<out_dir>/dependencies.txt`. Returns the written path.
///
/// # Errors
///
/// Returns [`MigError::Report`] when the tool cannot be executed and
/// [`MigError::Io`] when the output file cannot be written.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use migrascope_report::deps::dump_dependencies;
///
/// dump_dependencies("odoo/src/addons", "17.0", "sale", Path::new("out/17.0/sale")).unwrap();
/// ```
pub fn dump_dependencies(
    addons_path: &str,
    series: &str,
    addon: &str,
    out_dir: &Path,
) -> Result<PathBuf, MigError> {
    dump_with_tool(DEPENDENCY_TOOL, addons_path, series, addon, out_dir)
}

fn dump_with_tool(
    tool: &str,
    addons_path: &str,
    series: &str,
    addon: &str,
    out_dir: &Path,
) -> Result<PathBuf, MigError> {
    let output = Command::new(tool)
        .arg("--addons-path")
        .arg(addons_path)
        .arg(format!("--odoo-series={series}"))
        .arg("--select")
        .arg(addon)
        .arg("tree")
        .output()
        .map_err(|e| MigError::Report(format!("failed to run {tool}: {e}")))?;

    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join("dependencies.txt");
    std::fs::write(&path, &output.stdout)?;
    Ok(path)
}
