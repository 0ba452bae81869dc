//! The commit-set scanner: drives the line classifier over one addon's
//! commit range.
//!
//! Commits are discovered in reverse-chronological order, forward-ports are
//! filtered out, and each surviving commit is scanned independently. There
//! is no shared mutable state across commits, so the scans are fanned out
//! over a rayon worker pool (one repository handle per worker) and the
//! collected results are deterministically reordered to chronological order
//! afterwards, independent of completion order.

use std::path::Path;

use git2::{DiffFormat, DiffOptions, Oid, Repository, Sort};
use rayon::prelude::*;

use migrascope_core::{Classification, CommitScanResult, MigConfig, MigError};
use migrascope_scan::scorer::{classify, ScoreInputs};
use migrascope_scan::{scan_diff, DiffScan};

use crate::addons::module_path;

/// Scanner behavior toggles.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Keep commits classified as noise in the results (useful when tuning
    /// the scoring policy).
    pub keep_noise: bool,
}

/// Scan every commit in `start..end` that touches `addon`'s models
/// directory, returning results in chronological order with stable
/// sequence indices.
///
/// # Errors
///
/// Returns [`MigError::Git`] when the repository cannot be opened or the
/// range cannot be walked.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use git2::Oid;
/// use migrascope_core::MigConfig;
/// use migrascope_history::scan::{scan_addon_commits, ScanOptions};
///
/// let config = MigConfig::default();
/// let start = Oid::from_str("1111111111111111111111111111111111111111").unwrap();
/// let end = Oid::from_str("2222222222222222222222222222222222222222").unwrap();
/// let results =
///     scan_addon_commits(Path::new("."), "sale", start, end, &config, &ScanOptions::default())
///         .unwrap();
/// for r in &results {
///     println!("{} {} {}", r.index, r.date, r.summary);
/// }
/// ```
pub fn scan_addon_commits(
    repo_path: &Path,
    addon: &str,
    start: Oid,
    end: Oid,
    config: &MigConfig,
    options: &ScanOptions,
) -> Result<Vec<CommitScanResult>, MigError> {
    let repo = Repository::open(repo_path)
        .map_err(|e| MigError::Git(format!("failed to open repository: {e}")))?;
    let oids = collect_range(&repo, start, end)?;
    drop(repo);

    let scope = module_path(addon);

    let collected: Vec<Option<CommitScanResult>> = oids
        .par_iter()
        .map_init(
            || Repository::open(repo_path),
            |repo, oid| match repo {
                Ok(repo) => scan_one(repo, *oid, &scope, config, options),
                Err(e) => Err(MigError::Git(format!("failed to open repository: {e}"))),
            },
        )
        .collect::<Result<_, MigError>>()?;

    let mut results: Vec<CommitScanResult> = collected.into_iter().flatten().collect();

    // discovery order is reverse-chronological; artifacts are numbered
    // chronologically
    results.reverse();
    for (index, result) in results.iter_mut().enumerate() {
        result.index = index;
    }
    Ok(results)
}

/// Commits in `start..end`, newest first.
fn collect_range(repo: &Repository, start: Oid, end: Oid) -> Result<Vec<Oid>, MigError> {
    let mut revwalk = repo
        .revwalk()
        .map_err(|e| MigError::Git(format!("failed to create revwalk: {e}")))?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME).ok();
    revwalk
        .push(end)
        .map_err(|e| MigError::Git(format!("failed to push end commit: {e}")))?;
    revwalk
        .hide(start)
        .map_err(|e| MigError::Git(format!("failed to hide start commit: {e}")))?;

    let mut oids = Vec::new();
    for oid_result in revwalk {
        oids.push(oid_result.map_err(|e| MigError::Git(format!("revwalk error: {e}")))?);
    }
    Ok(oids)
}

/// True when a commit summary identifies a forward-ported change. Such
/// commits may present structural changes in their diff without introducing
/// anything new since the previous series, so they are excluded regardless
/// of their computed scores.
///
/// # Examples
///
/// ```
/// use migrascope_history::scan::is_forward_port;
///
/// assert!(is_forward_port("[FW] Forward-Port of saas-12", "forwardport"));
/// assert!(is_forward_port("forward port 11.0 fixes", "forwardport"));
/// assert!(!is_forward_port("[REF] account: port new API", "forwardport"));
/// ```
pub fn is_forward_port(summary: &str, marker: &str) -> bool {
    summary
        .to_lowercase()
        .replace(' ', "")
        .replace('-', "")
        .contains(marker)
}

fn scan_one(
    repo: &Repository,
    oid: Oid,
    scope: &str,
    config: &MigConfig,
    options: &ScanOptions,
) -> Result<Option<CommitScanResult>, MigError> {
    let commit = repo
        .find_commit(oid)
        .map_err(|e| MigError::Git(format!("failed to find commit: {e}")))?;

    let message = String::from_utf8_lossy(commit.message_bytes())
        .trim()
        .to_string();
    let summary = message.lines().next().unwrap_or("").to_string();

    if is_forward_port(&summary, &config.policy.forward_port_marker) {
        return Ok(None);
    }
    if commit.parent_count() == 0 {
        return Ok(None);
    }

    let mut scan = DiffScan::default();
    let mut diffs: Vec<String> = Vec::new();
    let mut total_changes = 0u64;

    for parent_idx in 0..commit.parent_count() {
        let parent = commit
            .parent(parent_idx)
            .map_err(|e| MigError::Git(format!("failed to get parent: {e}")))?;
        let diff = scoped_diff(repo, &parent, &commit, scope)?;

        if parent_idx == 0 {
            let stats = diff
                .stats()
                .map_err(|e| MigError::Git(format!("failed to compute diff stats: {e}")))?;
            total_changes = (stats.insertions() + stats.deletions()) as u64;
        }

        let text = render_patch(&diff)?;
        if text.is_empty() {
            continue;
        }
        scan.merge(scan_diff(&text, &config.policy));
        diffs.push(text);
    }

    if !scan.has_signal() {
        return Ok(None);
    }

    let classification = classify(
        &ScoreInputs {
            removal: scan.removal,
            addition: scan.addition,
            feature: scan.feature,
            total_changes,
            message_lines: message.lines().count(),
            summary: &summary,
        },
        &config.policy,
    );
    if classification == Classification::Noise && !options.keep_noise {
        return Ok(None);
    }

    let author = commit.author().name().unwrap_or("unknown").to_string();

    Ok(Some(CommitScanResult {
        sha: oid.to_string(),
        author,
        date: format_timestamp(commit.time().seconds()),
        pr_number: extract_pr_number(&message, &config.repo.pr_marker),
        summary,
        message,
        total_changes,
        matches: scan.matches,
        removal_score: scan.removal,
        addition_score: scan.addition,
        feature_score: scan.feature,
        classification,
        diffs,
        index: 0,
    }))
}

fn scoped_diff<'r>(
    repo: &'r Repository,
    parent: &git2::Commit<'_>,
    commit: &git2::Commit<'_>,
    scope: &str,
) -> Result<git2::Diff<'r>, MigError> {
    let parent_tree = parent
        .tree()
        .map_err(|e| MigError::Git(format!("failed to get parent tree: {e}")))?;
    let commit_tree = commit
        .tree()
        .map_err(|e| MigError::Git(format!("failed to get commit tree: {e}")))?;

    let mut opts = DiffOptions::new();
    opts.pathspec(scope);
    repo.diff_tree_to_tree(Some(&parent_tree), Some(&commit_tree), Some(&mut opts))
        .map_err(|e| MigError::Git(format!("failed to compute diff: {e}")))
}

/// Render a diff to unified patch text. Undecodable byte sequences are
/// replaced, never fatal.
fn render_patch(diff: &git2::Diff<'_>) -> Result<String, MigError> {
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        match line.origin() {
            '+' | '-' | ' ' => text.push(line.origin()),
            _ => {}
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(|e| MigError::Git(format!("failed to render patch: {e}")))?;
    Ok(text)
}

fn extract_pr_number(message: &str, marker: &str) -> Option<String> {
    let mut pr = None;
    for line in message.lines() {
        if let Some((_, rest)) = line.split_once(marker) {
            pr = Some(rest.trim().to_string());
        }
    }
    pr
}

fn format_timestamp(secs: i64) -> String {
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_port_marker_tolerates_case_and_separators() {
        assert!(is_forward_port("FORWARD PORT of 12.0", "forwardport"));
        assert!(is_forward_port("[FW] forward-port fixes", "forwardport"));
        assert!(is_forward_port("Forward-Port-Bot merge", "forwardport"));
        assert!(!is_forward_port("[IMP] portal: forward to website", "forwardport"));
    }

    #[test]
    fn pr_number_takes_the_last_reference() {
        let message = "\
[REF] account: restructure

closes odoo/odoo#11111
closes odoo/odoo#22222";
        assert_eq!(
            extract_pr_number(message, " odoo/odoo#"),
            Some("22222".into())
        );
    }

    #[test]
    fn pr_number_absent_when_no_marker() {
        assert_eq!(extract_pr_number("[FIX] stock: rounding", " odoo/odoo#"), None);
    }

    #[test]
    fn timestamps_format_as_expected() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(1700000000), "2023-11-14 22:13:20");
    }
}
