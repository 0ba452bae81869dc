//! Stateful line classifier for schema-affecting diff changes.
//!
//! Scans unified-diff text for object-relational declaration changes
//! (inheritance links, field declarations) and aggregates removal, addition
//! and feature scores per commit. The scan is a pure function of the
//! supplied text and a [`ScoringPolicy`]; it performs no I/O and issues no
//! repository calls.
//!
//! Line scanning within one file diff is strictly sequential: the 2-line
//! look-back buffer makes line order significant. Across commits there is no
//! shared state, so callers may fan commit scans out across a worker pool.

pub mod matcher;
pub mod reconciler;
pub mod scorer;
pub mod tokenizer;

use serde::Serialize;

use migrascope_core::{LineSign, MatchKind, MatchRecord, ScoringPolicy};

use crate::matcher::{addition_candidate, is_field_declaration, match_removal, ScanBuffer};
use crate::reconciler::{reconcile_addition, FileMatchLog};
use crate::tokenizer::tokenize;

/// Aggregated scan outcome for one commit's diff text.
///
/// # Examples
///
/// ```
/// use migrascope_scan::scan_diff;
/// use migrascope_core::ScoringPolicy;
///
/// let diff = "\
/// diff --git a/models/partner.py b/models/partner.py
/// --- a/models/partner.py
/// +++ b/models/partner.py
/// @@ -10,7 +10,6 @@ class Partner(models.Model):
/// -    ref = fields.Char(index=True)
/// ";
/// let scan = scan_diff(diff, &ScoringPolicy::default());
/// assert_eq!(scan.removal, 1.0);
/// assert!(scan.has_signal());
/// ```
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffScan {
    /// Structural removal score.
    pub removal: f64,
    /// Structural addition score.
    pub addition: f64,
    /// Additive feature score.
    pub feature: f64,
    /// Ordered match lines retained for visualization.
    pub matches: Vec<MatchRecord>,
}

impl DiffScan {
    /// True when any score is non-zero. A commit without signal yields no
    /// scan result at all downstream: absence of matches means absence of
    /// a result, not an empty one.
    pub fn has_signal(&self) -> bool {
        self.removal != 0.0 || self.addition != 0.0 || self.feature != 0.0
    }

    /// Fold another scan (e.g. from a second merge parent) into this one.
    pub fn merge(&mut self, other: DiffScan) {
        self.removal += other.removal;
        self.addition += other.addition;
        self.feature += other.feature;
        self.matches.extend(other.matches);
    }
}

/// Scan one commit's unified diff text.
///
/// The text may span multiple files; per-file boundaries (`diff --git`
/// headers) reset both the look-back buffer and the reconciliation log, so
/// an added declaration can only cancel a removal recorded in the same file
/// diff.
///
/// # Examples
///
/// ```
/// use migrascope_scan::scan_diff;
/// use migrascope_core::ScoringPolicy;
///
/// // removing and re-adding an identical declaration nets zero
/// let diff = "\
/// -    name = fields.Char(store=True)
/// +    name = fields.Char(store=True)
/// ";
/// let scan = scan_diff(diff, &ScoringPolicy::default());
/// assert!(!scan.has_signal());
/// assert!(scan.matches.is_empty());
/// ```
pub fn scan_diff(diff_text: &str, policy: &ScoringPolicy) -> DiffScan {
    let mut scan = DiffScan::default();
    for file_diff in split_file_diffs(diff_text) {
        scan.merge(scan_file_diff(&file_diff, policy));
    }
    scan
}

/// Split a multi-file diff blob into per-file segments on `diff --git`
/// headers. Text before the first header (or the entire input when no
/// header is present) forms its own segment.
fn split_file_diffs(diff_text: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in diff_text.lines() {
        if line.starts_with("diff --git ") && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
        current.push_str(line);
        current.push('\n');
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

fn scan_file_diff(file_diff: &str, policy: &ScoringPolicy) -> DiffScan {
    let mut buffer = ScanBuffer::default();
    let mut log = FileMatchLog::new();
    let mut scan = DiffScan::default();

    for line in tokenize(file_diff) {
        let mut reset = false;

        match line.sign {
            LineSign::Removed => {
                if let Some(found) = match_removal(&line, &buffer, policy) {
                    scan.removal += found.weight;
                    log.record(MatchRecord {
                        line: line.text.clone(),
                        kind: MatchKind::Removal,
                        weight: found.weight,
                        field_key: found.field_key,
                    });
                    reset = true;
                }
            }
            LineSign::Added => {
                if addition_candidate(&line, &buffer, policy) {
                    let delta = reconcile_addition(&line.text, &mut log, policy);
                    scan.removal += delta.removal;
                    scan.addition += delta.addition;
                    scan.feature += delta.feature;
                    // attribute-only additions are not a reset event
                    reset = is_field_declaration(&line.text);
                }
            }
            LineSign::Context => {}
        }

        buffer = if reset {
            buffer.reset()
        } else {
            buffer.push(&line.text)
        };
    }

    scan.matches = log.into_records();
    scan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ScoringPolicy {
        ScoringPolicy::default()
    }

    #[test]
    fn single_field_removal_scores_one() {
        let scan = scan_diff("-    ref = fields.Char(index=True)\n", &policy());
        assert_eq!(scan.removal, 1.0);
        assert_eq!(scan.addition, 0.0);
        assert_eq!(scan.matches.len(), 1);
    }

    #[test]
    fn relation_removal_scores_two() {
        let scan = scan_diff(
            "-    line_ids = fields.One2many('account.move.line', 'move_id')\n",
            &policy(),
        );
        assert_eq!(scan.removal, 2.0);
    }

    #[test]
    fn identical_readd_cancels_and_retains_nothing() {
        let diff = "\
-    name = fields.Char(store=True)
+    name = fields.Char(store=True)
";
        let scan = scan_diff(diff, &policy());
        assert_eq!(scan.removal, 0.0);
        assert!(!scan.has_signal());
        assert!(scan.matches.is_empty());
    }

    #[test]
    fn changed_attribute_readd_charges_modify_weight() {
        let diff = "\
-    name = fields.Char(store=True)
+    name = fields.Char(store=False)
";
        let scan = scan_diff(diff, &policy());
        assert!((scan.removal - 0.6).abs() < 1e-9);
        assert_eq!(scan.matches.len(), 2, "both lines kept for visualization");
    }

    #[test]
    fn trivial_attribute_line_contributes_nothing() {
        let scan = scan_diff("-    help='A field description'\n", &policy());
        assert!(!scan.has_signal());
        assert!(scan.matches.is_empty());
    }

    #[test]
    fn multiline_declaration_detected_through_buffer() {
        let diff = "\
-    partner_id = fields.Many2one(
-        'res.partner',
-    )
";
        // the declaration line itself matches and resets the buffer; the
        // continuation lines are too deep to match again
        let scan = scan_diff(diff, &policy());
        assert_eq!(scan.removal, 1.0);
        assert_eq!(scan.matches.len(), 1);
    }

    #[test]
    fn buffered_attribute_mutation_scores_dampened() {
        let diff = "\
     total = fields.Float(
-    store=True,
";
        let scan = scan_diff(diff, &policy());
        assert!((scan.removal - 0.4).abs() < 1e-9);
    }

    #[test]
    fn abstract_model_context_is_ignored() {
        let diff = "\
 class ReportBase(models.AbstractModel):
-    _inherit = 'report.base'
";
        let scan = scan_diff(diff, &policy());
        assert!(!scan.has_signal());
    }

    #[test]
    fn new_plain_field_is_feature_signal() {
        let scan = scan_diff("+    color = fields.Integer()\n", &policy());
        assert_eq!(scan.feature, 1.0);
        assert_eq!(scan.addition, 0.0);
        assert!(scan.has_signal());
    }

    #[test]
    fn new_relation_field_scores_addition() {
        let scan = scan_diff(
            "+    tag_ids = fields.Many2many('account.tag')\n",
            &policy(),
        );
        assert_eq!(scan.addition, 1.0);
    }

    #[test]
    fn cancellation_never_crosses_file_boundaries() {
        let diff = "\
diff --git a/models/a.py b/models/a.py
--- a/models/a.py
+++ b/models/a.py
@@ -1,2 +1,1 @@
-    name = fields.Char(store=True)
diff --git a/models/b.py b/models/b.py
--- a/models/b.py
+++ b/models/b.py
@@ -1,1 +1,2 @@
+    name = fields.Char(store=True)
";
        let scan = scan_diff(diff, &policy());
        // the removal in a.py stays charged; the addition in b.py is a new
        // field there, not a cancellation
        assert_eq!(scan.removal, 1.0);
        assert_eq!(scan.feature, 1.0);
        assert_eq!(scan.matches.len(), 1);
    }

    #[test]
    fn buffer_resets_after_confirmed_match() {
        let diff = "\
-    amount = fields.Monetary(
-    line_ids = fields.One2many('account.move.line', 'move_id')
";
        // the first line matches directly and resets the buffer, so the
        // second line is judged on its own and still matches directly
        let scan = scan_diff(diff, &policy());
        assert_eq!(scan.removal, 3.0); // 1.0 + (1.0 + relation bonus)
        assert_eq!(scan.matches.len(), 2);
    }

    #[test]
    fn inheritance_split_across_lines() {
        let diff = "\
-    _inherit = [
-    'mail.thread',
";
        let scan = scan_diff(diff, &policy());
        // first line matches directly; after the reset the second carries
        // no marker of its own
        assert_eq!(scan.removal, 1.0);
    }

    #[test]
    fn empty_diff_has_no_signal() {
        let scan = scan_diff("", &policy());
        assert!(!scan.has_signal());
        assert!(scan.matches.is_empty());
    }

    #[test]
    fn merge_accumulates_parent_scans() {
        let mut a = scan_diff("-    ref = fields.Char()\n", &policy());
        let b = scan_diff("+    color = fields.Integer()\n", &policy());
        a.merge(b);
        assert_eq!(a.removal, 1.0);
        assert_eq!(a.feature, 1.0);
        assert_eq!(a.matches.len(), 1);
    }
}
