//! Patch artifact emission.
//!
//! Every retained commit becomes one `.patch` file whose name encodes the
//! classification, the chronological sequence index, the heat string, the
//! PR number and a slug of the commit summary, so a directory listing
//! reads as a migration changelog.

use std::path::{Path, PathBuf};

use migrascope_core::{CommitScanResult, MigError};
use migrascope_scan::scorer::heat_string;

const SLUG_MAX: usize = 70;

/// Lowercased, dash-separated slug of `text`, suitable for filenames.
///
/// # Examples
///
/// ```
/// use migrascope_report::artifact::slugify;
///
/// assert_eq!(slugify("[REF] sale: drop note field"), "ref-sale-drop-note-field");
/// assert_eq!(slugify("  weird -- punctuation!! "), "weird-punctuation");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in text.chars().flat_map(|c| c.to_lowercase()) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Artifact filename for one scan result:
/// `<prefix><index:03><heat>_<pr>_<slug>.patch`.
///
/// # Examples
///
/// ```
/// use migrascope_core::{Classification, CommitScanResult};
/// use migrascope_report::artifact::artifact_filename;
///
/// let result = CommitScanResult {
///     sha: "abc123".into(),
///     author: "alice".into(),
///     date: "2024-01-01 00:00:00".into(),
///     summary: "[REF] sale: drop note".into(),
///     message: "[REF] sale: drop note".into(),
///     pr_number: Some("12345".into()),
///     total_changes: 40,
///     matches: vec![],
///     removal_score: 2.0,
///     addition_score: 0.0,
///     feature_score: 0.0,
///     classification: Classification::StructuralChange,
///     diffs: vec![],
///     index: 7,
/// };
/// let name = artifact_filename(&result);
/// assert!(name.starts_with("c007"));
/// assert!(name.ends_with("_12345_ref-sale-drop-note.patch"));
/// ```
pub fn artifact_filename(result: &CommitScanResult) -> String {
    let heat = heat_string(
        result.addition_score,
        result.removal_score,
        result.total_changes,
        result.classification,
    );
    let slug: String = slugify(&result.summary).chars().take(SLUG_MAX).collect();
    format!(
        "{prefix}{index:03}{heat}_{pr}_{slug}.patch",
        prefix = result.classification.artifact_prefix(),
        index = result.index,
        pr = result.pr_number.as_deref().unwrap_or(""),
    )
}

/// Write the patch artifact for `result` under `dir`, creating the
/// directory as needed. Returns the written path.
///
/// The body carries the PR link, commit identity, the combined structural
/// score with its match lines, the full commit message (lines starting with
/// `-` are rewritten to `*` so patch tooling does not misread them), and
/// the raw per-parent diff texts behind a pseudo-patch separator.
///
/// # Errors
///
/// Returns [`MigError::Io`] when the directory or file cannot be written.
pub fn write_artifact(
    dir: &Path,
    result: &CommitScanResult,
    pr_url_base: &str,
) -> Result<PathBuf, MigError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(artifact_filename(result));
    std::fs::write(&path, render_artifact(result, pr_url_base))?;
    Ok(path)
}

/// Render the artifact body.
pub fn render_artifact(result: &CommitScanResult, pr_url_base: &str) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "PR: {pr_url_base}{}",
        result.pr_number.as_deref().unwrap_or("")
    ));
    body.push_str(&format!("\n\nFrom: {}", result.sha));
    body.push_str(&format!("\nFrom: {}", result.author));
    body.push_str(&format!("\nDate: {}", result.date));
    body.push_str(&format!(
        "\n\nBreaking data model changes score: {}, change matches:",
        result.removal_score + result.addition_score
    ));
    for record in &result.matches {
        body.push('\n');
        body.push_str(&record.line);
    }
    body.push_str(&format!("\n\nTotal Changes: {}", result.total_changes));
    body.push_str("\n\n");
    body.push_str(&escape_message(&result.message));
    body.push_str(&format!(
        "\n\n{separator} pseudo patch: {separator}\n",
        separator = "=".repeat(33)
    ));
    for diff in &result.diffs {
        body.push_str(diff);
    }
    body
}

/// Rewrite a leading `-` on any message line to `*`.
fn escape_message(message: &str) -> String {
    message
        .lines()
        .map(|line| {
            if let Some(rest) = line.strip_prefix('-') {
                format!("*{rest}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrascope_core::{Classification, MatchKind, MatchRecord};

    fn result() -> CommitScanResult {
        CommitScanResult {
            sha: "deadbeef".into(),
            author: "alice".into(),
            date: "2023-06-01 10:00:00".into(),
            summary: "[REF] sale: drop the note field".into(),
            message: "[REF] sale: drop the note field\n\n- remove note\n- cleanup".into(),
            pr_number: Some("98765".into()),
            total_changes: 120,
            matches: vec![MatchRecord {
                line: "-    note = fields.Text()".into(),
                kind: MatchKind::Removal,
                weight: 1.0,
                field_key: Some("    note = fields.Text".into()),
            }],
            removal_score: 1.0,
            addition_score: 0.6,
            feature_score: 0.0,
            classification: Classification::StructuralChange,
            diffs: vec!["diff --git a/x b/x\n-    note = fields.Text()\n".into()],
            index: 3,
        }
    }

    #[test]
    fn slug_is_lowercase_dashed_alnum() {
        assert_eq!(slugify("[REF] account/sale: v2!"), "ref-account-sale-v2");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn filename_encodes_prefix_index_heat_pr_and_slug() {
        let name = artifact_filename(&result());
        assert!(name.starts_with("c003"), "prefix and zero-padded index: {name}");
        assert!(name.contains("_98765_"));
        assert!(name.ends_with("ref-sale-drop-the-note-field.patch"));
    }

    #[test]
    fn noise_and_feature_prefixes() {
        let mut r = result();
        r.classification = Classification::Noise;
        assert!(artifact_filename(&r).starts_with("__noise003"));
        r.classification = Classification::BigFeature;
        assert!(artifact_filename(&r).starts_with("feat003"));
    }

    #[test]
    fn slug_is_truncated() {
        let mut r = result();
        r.summary = "x".repeat(200);
        let name = artifact_filename(&r);
        let slug_part = name.split('_').next_back().unwrap();
        assert_eq!(slug_part.len(), SLUG_MAX + ".patch".len());
    }

    #[test]
    fn body_contains_identity_scores_and_matches() {
        let body = render_artifact(&result(), "https://github.com/odoo/odoo/pull/");
        assert!(body.starts_with("PR: https://github.com/odoo/odoo/pull/98765"));
        assert!(body.contains("From: deadbeef"));
        assert!(body.contains("From: alice"));
        assert!(body.contains("Breaking data model changes score: 1.6, change matches:"));
        assert!(body.contains("-    note = fields.Text()"));
        assert!(body.contains("Total Changes: 120"));
        assert!(body.contains(" pseudo patch: "));
    }

    #[test]
    fn message_dashes_are_escaped() {
        let body = render_artifact(&result(), "https://github.com/odoo/odoo/pull/");
        assert!(body.contains("* remove note"));
        assert!(body.contains("* cleanup"));
        // the match line keeps its dash; only message lines are rewritten
        assert!(body.contains("-    note = fields.Text()"));
    }

    #[test]
    fn write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("16.0").join("sale");
        let path = write_artifact(&target, &result(), "https://example.com/pull/").unwrap();
        assert!(path.exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("https://example.com/pull/98765"));
    }
}
