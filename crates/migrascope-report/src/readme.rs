//! Per-series README summary.
//!
//! After a full scan, the series output directory gets a README.md with the
//! overall patch count, the total artifact weight, and the addons that
//! changed the most.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use migrascope_core::MigError;

const TOP_ADDONS: usize = 30;

/// Write `<output_dir>/README.md` summarizing the series scan. Returns the
/// written path.
///
/// # Errors
///
/// Returns [`MigError::Io`] when the directory cannot be walked or the
/// README cannot be written.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use migrascope_report::readme::write_series_readme;
///
/// write_series_readme(17, Path::new("module_diff_analysis/17.0")).unwrap();
/// ```
pub fn write_series_readme(series: u32, output_dir: &Path) -> Result<PathBuf, MigError> {
    let stats = collect_stats(output_dir)?;

    let mut addons: Vec<(&String, &u64)> = stats.addon_sizes.iter().collect();
    addons.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let mut table = String::new();
    for (rank, (addon, size)) in addons.iter().take(TOP_ADDONS).enumerate() {
        table.push_str(&format!("{}. {} - {}\n", rank + 1, addon, human_size(**size)));
    }

    let readme = format!(
        "# How crazy it is to migrate to Odoo {series}.0?\n\
         \n\
         There are {count} non trivial commits impacting the database structure to migrate\n\
         from Odoo {previous}.0 to {series}.0\n\
         Together theses commits weight {size}.\n\
         \n\
         The addons that changed the most are listed below with their relative migration commit sizes:\n\
         \n\
         {table}",
        count = stats.patch_count,
        previous = series.saturating_sub(1),
        size = human_size(stats.total_bytes),
    );

    let path = output_dir.join("README.md");
    std::fs::write(&path, readme)?;
    Ok(path)
}

struct SeriesStats {
    patch_count: usize,
    total_bytes: u64,
    addon_sizes: HashMap<String, u64>,
}

fn collect_stats(output_dir: &Path) -> Result<SeriesStats, MigError> {
    let mut stats = SeriesStats {
        patch_count: 0,
        total_bytes: 0,
        addon_sizes: HashMap::new(),
    };

    for entry in WalkBuilder::new(output_dir).standard_filters(false).build() {
        let entry = entry.map_err(|e| MigError::Report(format!("walk error: {e}")))?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("patch") {
            continue;
        }
        let size = entry
            .metadata()
            .map_err(|e| MigError::Report(format!("metadata error: {e}")))?
            .len();

        stats.patch_count += 1;
        stats.total_bytes += size;

        // first path component under the series dir is the addon name
        if let Ok(relative) = path.strip_prefix(output_dir) {
            if let Some(addon) = relative.components().next() {
                let addon = addon.as_os_str().to_string_lossy().to_string();
                *stats.addon_sizes.entry(addon).or_default() += size;
            }
        }
    }

    Ok(stats)
}

/// `du -h`-style size rendering.
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "K", "M", "G"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes}{}", UNITS[0])
    } else {
        format!("{value:.1}{}", UNITS[unit])
    }
}
