use std::collections::BTreeSet;

use migrascope_core::{MatchKind, MatchRecord, ScoringPolicy};

use crate::matcher::{field_key, is_field_declaration};

/// Computed-value references are normalized to this placeholder before
/// comparison; the exact referenced method is irrelevant to structural
/// scoring.
const COMPUTE_ATTRIBUTE: &str = "compute=";
const COMPUTE_PLACEHOLDER: &str = "some_method";

/// Per-file-diff log of structural matches.
///
/// The log is both the reconciliation index (queried by field key when an
/// addition may pair with an earlier removal) and the ordered match output
/// for the file. It must be dropped at every file boundary; pairing never
/// spans files or commits.
///
/// # Examples
///
/// ```
/// use migrascope_scan::reconciler::FileMatchLog;
/// use migrascope_core::{MatchKind, MatchRecord};
///
/// let mut log = FileMatchLog::new();
/// log.record(MatchRecord {
///     line: "-    name = fields.Char()".into(),
///     kind: MatchKind::Removal,
///     weight: 1.0,
///     field_key: Some("    name = fields.Char".into()),
/// });
/// assert_eq!(log.records().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct FileMatchLog {
    entries: Vec<LogEntry>,
}

#[derive(Debug)]
struct LogEntry {
    record: MatchRecord,
    /// Set once an addition has paired with this removal, so a second
    /// addition of the same field can never refund the same record twice.
    consumed: bool,
}

impl FileMatchLog {
    /// Create an empty log for one file diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a match record.
    pub fn record(&mut self, record: MatchRecord) {
        self.entries.push(LogEntry {
            record,
            consumed: false,
        });
    }

    /// Current records, in match order.
    pub fn records(&self) -> Vec<&MatchRecord> {
        self.entries.iter().map(|e| &e.record).collect()
    }

    /// Drain the log into its retained records.
    pub fn into_records(self) -> Vec<MatchRecord> {
        self.entries.into_iter().map(|e| e.record).collect()
    }

    fn find_unconsumed_removal(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|e| {
            !e.consumed
                && e.record.kind == MatchKind::Removal
                && e.record.field_key.as_deref() == Some(key)
        })
    }
}

/// Score adjustments produced by one addition line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreDelta {
    /// Adjustment to the removal score (may be negative on cancellation).
    pub removal: f64,
    /// Adjustment to the addition score.
    pub addition: f64,
    /// Adjustment to the feature score.
    pub feature: f64,
}

/// Reconcile an eligible added candidate line against the file's match log.
///
/// For an added field declaration, look for an unconsumed removal of the
/// same field key:
/// - found, significant attributes equal: the pair is a false positive.
///   The prior record is removed and its recorded weight refunded exactly,
///   relation bonus included; net effect zero.
/// - found, significant attributes differ: the prior record is kept for
///   visualization but its weight is refunded and replaced by the modest
///   modification charge (plus the relation bonus when the added line is a
///   relation); the added line is recorded too.
/// - not found: a relation addition charges the addition score; any other
///   new declaration charges the feature score only.
///
/// A non-declaration attribute-only addition charges a flat dampened weight
/// to the addition score and records nothing.
///
/// # Examples
///
/// ```
/// use migrascope_scan::reconciler::{reconcile_addition, FileMatchLog};
/// use migrascope_core::ScoringPolicy;
///
/// let policy = ScoringPolicy::default();
/// let mut log = FileMatchLog::new();
/// let delta = reconcile_addition("+    name = fields.Char()", &mut log, &policy);
/// assert_eq!(delta.feature, 1.0); // brand-new non-relational field
/// ```
pub fn reconcile_addition(
    text: &str,
    log: &mut FileMatchLog,
    policy: &ScoringPolicy,
) -> ScoreDelta {
    if !is_field_declaration(text) {
        // attribute-only additive change, declaration held in the buffer
        return ScoreDelta {
            addition: policy.attribute_addition_weight,
            ..ScoreDelta::default()
        };
    }

    let key = field_key(text);
    let relation = text.contains(&policy.relation_marker);

    if let Some(idx) = log.find_unconsumed_removal(&key) {
        let removed_line = log.entries[idx].record.line.clone();
        let refunded = log.entries[idx].record.weight;

        if significant_pairs(&removed_line, policy) == significant_pairs(text, policy) {
            // identical declaration removed and re-added: false positive
            log.entries.remove(idx);
            return ScoreDelta {
                removal: -refunded,
                ..ScoreDelta::default()
            };
        }

        // genuine but modest modification
        let charged = policy.attribute_modify_weight
            + if relation { policy.relation_bonus } else { 0.0 };
        log.entries[idx].consumed = true;
        log.record(MatchRecord {
            line: text.to_string(),
            kind: MatchKind::Addition,
            weight: charged,
            field_key: Some(key),
        });
        return ScoreDelta {
            removal: charged - refunded,
            ..ScoreDelta::default()
        };
    }

    if relation {
        log.record(MatchRecord {
            line: text.to_string(),
            kind: MatchKind::Addition,
            weight: policy.relation_bonus,
            field_key: Some(key),
        });
        ScoreDelta {
            addition: policy.relation_bonus,
            ..ScoreDelta::default()
        }
    } else {
        // a brand-new non-relational field is feature signal, not
        // migration burden
        ScoreDelta {
            feature: 1.0,
            ..ScoreDelta::default()
        }
    }
}

/// Extract the `attribute=normalized-value` pairs for the significant
/// attributes present in `text`. Values are cut at the next comma or
/// closing parenthesis; `compute=` values collapse to a placeholder.
///
/// # Examples
///
/// ```
/// use migrascope_scan::reconciler::significant_pairs;
/// use migrascope_core::ScoringPolicy;
///
/// let policy = ScoringPolicy::default();
/// let a = significant_pairs("-    total = fields.Float(compute='_compute_a', store=True)", &policy);
/// let b = significant_pairs("+    total = fields.Float(compute='_compute_b', store=True)", &policy);
/// assert_eq!(a, b); // compute targets are normalized away
/// ```
pub fn significant_pairs(text: &str, policy: &ScoringPolicy) -> BTreeSet<String> {
    let mut pairs = BTreeSet::new();
    for attr in &policy.significant_attributes {
        if !text.contains(attr.as_str()) {
            continue;
        }
        let value = if attr == COMPUTE_ATTRIBUTE {
            COMPUTE_PLACEHOLDER.to_string()
        } else {
            text.split(attr.as_str())
                .last()
                .unwrap_or("")
                .split(',')
                .next()
                .unwrap_or("")
                .split(')')
                .next()
                .unwrap_or("")
                .to_string()
        };
        pairs.insert(format!("{attr}{value}"));
    }
    pairs
}
