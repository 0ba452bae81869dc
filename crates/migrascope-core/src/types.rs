use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which side of a unified diff a line belongs to.
///
/// # Examples
///
/// ```
/// use migrascope_core::LineSign;
///
/// let sign = LineSign::Removed;
/// assert_eq!(format!("{sign}"), "removed");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSign {
    /// Line added in the new version (`+` marker).
    Added,
    /// Line removed from the old version (`-` marker).
    Removed,
    /// Unchanged context line.
    Context,
}

impl fmt::Display for LineSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineSign::Added => write!(f, "added"),
            LineSign::Removed => write!(f, "removed"),
            LineSign::Context => write!(f, "context"),
        }
    }
}

/// Whether a structural match was found on the removal or addition side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// A declaration (or declaration attribute) disappeared.
    Removal,
    /// A declaration (or declaration attribute) appeared.
    Addition,
}

/// One structural match found while scanning a commit diff.
///
/// The weight recorded here is the score actually charged for the match, so
/// that a later retroactive cancellation can refund it exactly, relation
/// bonus included.
///
/// # Examples
///
/// ```
/// use migrascope_core::{MatchKind, MatchRecord};
///
/// let rec = MatchRecord {
///     line: "-    partner_id = fields.Many2one('res.partner')".into(),
///     kind: MatchKind::Removal,
///     weight: 1.0,
///     field_key: Some("    partner_id = fields.Many2one".into()),
/// };
/// assert_eq!(rec.kind, MatchKind::Removal);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    /// The normalized diff line that matched, sign character included.
    pub line: String,
    /// Removal or addition side.
    pub kind: MatchKind,
    /// Score charged for this match at the time it was recorded.
    pub weight: f64,
    /// Declaration text up to the opening parenthesis, sign stripped.
    /// Present only for field-declaration matches; used to pair an added
    /// declaration with an earlier removal of the same field.
    pub field_key: Option<String>,
}

/// Three-way migration significance classification of a commit.
///
/// Always derived from the score inputs by the scorer; never persisted
/// independently of them.
///
/// # Examples
///
/// ```
/// use migrascope_core::Classification;
///
/// let c: Classification = serde_json::from_str("\"noise\"").unwrap();
/// assert_eq!(c, Classification::Noise);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Classification {
    /// Structural signal too weak or ambiguous to warrant review.
    Noise,
    /// A change to persisted schema-defining declarations.
    StructuralChange,
    /// A large feature commit with additive signal but no migration burden.
    BigFeature,
}

impl Classification {
    /// Artifact filename prefix for this classification.
    ///
    /// # Examples
    ///
    /// ```
    /// use migrascope_core::Classification;
    ///
    /// assert_eq!(Classification::StructuralChange.artifact_prefix(), "c");
    /// assert_eq!(Classification::Noise.artifact_prefix(), "__noise");
    /// assert_eq!(Classification::BigFeature.artifact_prefix(), "feat");
    /// ```
    pub fn artifact_prefix(self) -> &'static str {
        match self {
            Classification::Noise => "__noise",
            Classification::StructuralChange => "c",
            Classification::BigFeature => "feat",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Noise => write!(f, "noise"),
            Classification::StructuralChange => write!(f, "structural change"),
            Classification::BigFeature => write!(f, "big feature"),
        }
    }
}

/// Scan outcome for one commit whose diff carried structural signal.
///
/// Created only when at least one of the three scores is non-zero; a commit
/// with no matches yields no result at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitScanResult {
    /// Full commit sha.
    pub sha: String,
    /// Author name.
    pub author: String,
    /// Commit date formatted as `YYYY-MM-DD HH:MM:SS`.
    pub date: String,
    /// First line of the commit message.
    pub summary: String,
    /// Full commit message.
    pub message: String,
    /// Pull request number referenced from the message, when present.
    pub pr_number: Option<String>,
    /// Changed-line count restricted to the scanned module path.
    pub total_changes: u64,
    /// Ordered match lines, removals and retained additions.
    pub matches: Vec<MatchRecord>,
    /// Structural removal score.
    pub removal_score: f64,
    /// Structural addition score.
    pub addition_score: f64,
    /// Additive feature score (no migration burden).
    pub feature_score: f64,
    /// Derived classification.
    pub classification: Classification,
    /// Raw per-parent unified diff texts, scope-restricted.
    pub diffs: Vec<String>,
    /// Chronological sequence index, assigned after collection.
    /// Used for artifact naming and ordering only, never for scoring.
    pub index: usize,
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument
/// parsing.
///
/// # Examples
///
/// ```
/// use migrascope_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn classification_prefixes() {
        assert_eq!(Classification::Noise.artifact_prefix(), "__noise");
        assert_eq!(Classification::StructuralChange.artifact_prefix(), "c");
        assert_eq!(Classification::BigFeature.artifact_prefix(), "feat");
    }

    #[test]
    fn classification_roundtrips_through_json() {
        let json = serde_json::to_string(&Classification::BigFeature).unwrap();
        assert_eq!(json, "\"bigFeature\"");
        let parsed: Classification = serde_json::from_str("\"structuralChange\"").unwrap();
        assert_eq!(parsed, Classification::StructuralChange);
    }

    #[test]
    fn match_record_serializes_camel_case() {
        let rec = MatchRecord {
            line: "-    _inherit = 'res.partner'".into(),
            kind: MatchKind::Removal,
            weight: 1.0,
            field_key: None,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("fieldKey").is_some());
        assert!(json.get("field_key").is_none());
    }

    #[test]
    fn scan_result_serializes_camel_case() {
        let result = CommitScanResult {
            sha: "abc".into(),
            author: "alice".into(),
            date: "2024-01-01 00:00:00".into(),
            summary: "[REF] res_partner".into(),
            message: "[REF] res_partner\n\nmore".into(),
            pr_number: Some("12345".into()),
            total_changes: 42,
            matches: vec![],
            removal_score: 1.0,
            addition_score: 0.0,
            feature_score: 0.0,
            classification: Classification::Noise,
            diffs: vec![],
            index: 0,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("totalChanges").is_some());
        assert!(json.get("removalScore").is_some());
        assert!(json.get("total_changes").is_none());
    }
}
