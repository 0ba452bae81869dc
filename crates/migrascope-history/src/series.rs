//! Release series boundary resolution.
//!
//! A scan range runs from the merge base of two series branches to the
//! commit that closed the target release. Release-closing commits are found
//! by exact summary match against the known per-series message forms; when
//! none matches, the most recent commit is used instead with an explicit
//! warning flag.

use git2::{Oid, Repository};

use migrascope_core::MigError;

/// The commit closing series 10 carries no usable release message; its sha
/// is pinned instead.
const SERIES_TEN_END: &str = "780869879b00d5772985e7c11003ac8a94451a61";

/// Resolved end-of-series commit.
///
/// # Examples
///
/// ```no_run
/// use git2::Repository;
/// use migrascope_history::series::find_series_end;
///
/// let repo = Repository::open(".").unwrap();
/// let boundary = find_series_end(&repo, 16).unwrap();
/// if !boundary.exact {
///     eprintln!("release commit not found, using most recent commit");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SeriesBoundary {
    /// The boundary commit.
    pub oid: Oid,
    /// First line of the boundary commit's message.
    pub summary: String,
    /// False when the release commit was not found and the most recent
    /// commit was substituted.
    pub exact: bool,
}

/// The summary a release-closing commit is expected to carry. Most series
/// use `[REL] <s>.0`; a few historical releases deviated.
pub fn release_summary(series: u32) -> String {
    match series {
        16 => "[REL] 16.0 FINAL".into(),
        9 => "[REL] Odoo 9".into(),
        8 => "[REL] Odoo 8.0".into(),
        s => format!("[REL] {s}.0"),
    }
}

/// Locate the commit that closed `series`.
///
/// Walks history from HEAD looking for a commit whose summary equals the
/// expected release message. Degrades to the most recent commit (with
/// `exact = false`) when no release commit exists on the walked history;
/// callers surface a warning, not a failure.
///
/// # Errors
///
/// Returns [`MigError::Git`] when the repository cannot be walked at all.
pub fn find_series_end(repo: &Repository, series: u32) -> Result<SeriesBoundary, MigError> {
    if series == 10 {
        if let Ok(oid) = Oid::from_str(SERIES_TEN_END) {
            if let Ok(commit) = repo.find_commit(oid) {
                return Ok(SeriesBoundary {
                    oid,
                    summary: commit_summary(&commit),
                    exact: true,
                });
            }
        }
        // not the upstream repository: fall through to the message search
    }

    let expected = release_summary(series);

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| MigError::Git(format!("failed to create revwalk: {e}")))?;
    revwalk
        .push_head()
        .map_err(|e| MigError::Git(format!("failed to push HEAD: {e}")))?;

    let mut newest: Option<SeriesBoundary> = None;
    for oid_result in revwalk {
        let oid = oid_result.map_err(|e| MigError::Git(format!("revwalk error: {e}")))?;
        let commit = repo
            .find_commit(oid)
            .map_err(|e| MigError::Git(format!("failed to find commit: {e}")))?;
        let summary = commit_summary(&commit);

        if newest.is_none() {
            newest = Some(SeriesBoundary {
                oid,
                summary: summary.clone(),
                exact: false,
            });
        }

        if summary.trim() == expected {
            return Ok(SeriesBoundary {
                oid,
                summary,
                exact: true,
            });
        }
    }

    newest.ok_or_else(|| MigError::Git("repository has no commits".into()))
}

/// Resolve the commit a series ref (`<s>.0`) points at.
///
/// # Errors
///
/// Returns [`MigError::Git`] when no such ref exists.
pub fn resolve_series_commit(repo: &Repository, series: u32) -> Result<Oid, MigError> {
    let refname = format!("{series}.0");
    let object = repo
        .revparse_single(&refname)
        .map_err(|e| MigError::Git(format!("failed to resolve series ref '{refname}': {e}")))?;
    let commit = object
        .peel_to_commit()
        .map_err(|e| MigError::Git(format!("'{refname}' does not point at a commit: {e}")))?;
    Ok(commit.id())
}

/// The scan range start: the merge base of the target series and its
/// predecessor.
///
/// # Errors
///
/// Returns [`MigError::Git`] when either ref is missing or no merge base
/// exists.
pub fn find_series_start(repo: &Repository, series: u32) -> Result<Oid, MigError> {
    if series == 0 {
        return Err(MigError::Config("series must be at least 1".into()));
    }
    let target = resolve_series_commit(repo, series)?;
    let previous = resolve_series_commit(repo, series - 1)?;
    repo.merge_base(target, previous)
        .map_err(|e| MigError::Git(format!("no merge base between {series}.0 and its predecessor: {e}")))
}

fn commit_summary(commit: &git2::Commit<'_>) -> String {
    String::from_utf8_lossy(commit.message_bytes())
        .lines()
        .next()
        .unwrap_or("")
        .to_string()
}
