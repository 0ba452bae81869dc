use migrascope_core::ScoringPolicy;

use crate::tokenizer::DiffLine;

/// Inheritance and field-declaration markers, with the trailing character a
/// buffered line must end with for the declaration to be considered split
/// across lines.
const INHERIT_SINGLE: (&str, char) = (" _inherit =", '[');
const INHERIT_MULTI: (&str, char) = (" _inherits =", '[');
const FIELD_DECL: (&str, char) = (" = fields.", '(');

/// The two preceding normalized lines, used to detect declarations split
/// across up to three source lines.
///
/// The buffer is a small immutable value threaded through the per-file fold:
/// [`push`](Self::push) returns the successor window, [`reset`](Self::reset)
/// the empty one. Declarations spanning more than this fixed window are an
/// accepted detection gap.
///
/// # Examples
///
/// ```
/// use migrascope_scan::matcher::ScanBuffer;
///
/// let buffer = ScanBuffer::default()
///     .push("-    partner_id = fields.Many2one(")
///     .push("-        'res.partner',");
/// assert_eq!(buffer.prev(), "-        'res.partner',");
/// assert_eq!(buffer.reset().prev(), "");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScanBuffer {
    prev: String,
    prev_prev: String,
}

impl ScanBuffer {
    /// The immediately preceding line.
    pub fn prev(&self) -> &str {
        &self.prev
    }

    /// The line before [`prev`](Self::prev).
    pub fn prev_prev(&self) -> &str {
        &self.prev_prev
    }

    /// Shift the window forward over `line`.
    #[must_use]
    pub fn push(self, line: &str) -> Self {
        Self {
            prev: line.to_string(),
            prev_prev: self.prev,
        }
    }

    /// Clear the window. Called on every confirmed match so one declaration
    /// never supports two matches.
    #[must_use]
    pub fn reset(self) -> Self {
        Self::default()
    }

    /// True when `marker` occurs in `line` itself, or in a buffered line
    /// that ends with `closer` (an unclosed bracket or parenthesis,
    /// signaling a declaration continued onto the current line).
    pub fn holds_marker(&self, line: &str, marker: &str, closer: char) -> bool {
        line.contains(marker)
            || (self.prev.contains(marker) && self.prev.ends_with(closer))
            || (self.prev_prev.contains(marker) && self.prev_prev.ends_with(closer))
    }

    fn contains_anywhere(&self, line: &str, token: &str) -> bool {
        line.contains(token) || self.prev.contains(token) || self.prev_prev.contains(token)
    }
}

/// A confirmed structural removal match.
#[derive(Debug, Clone)]
pub struct RemovalMatch {
    /// Score charged, relation bonus included.
    pub weight: f64,
    /// Pairing key for the reconciler; present only for direct
    /// field-declaration lines.
    pub field_key: Option<String>,
}

/// Test a removed candidate line against the declaration markers.
///
/// A match is confirmed when the line, or a buffered line ending in an
/// unclosed bracket or parenthesis, carries a single-parent inheritance
/// marker, a multi-parent inheritance marker, or a field-declaration marker.
/// Any candidate is voided when the abstract-model sentinel appears in the
/// line or the buffer. Trivial attribute lines (see
/// [`is_trivial_attribute`]) never match.
///
/// # Examples
///
/// ```
/// use migrascope_scan::matcher::{match_removal, ScanBuffer};
/// use migrascope_scan::tokenizer::tokenize;
/// use migrascope_core::ScoringPolicy;
///
/// let policy = ScoringPolicy::default();
/// let lines = tokenize("-    child_ids = fields.One2many('res.partner', 'parent_id')\n");
/// let m = match_removal(&lines[0], &ScanBuffer::default(), &policy).unwrap();
/// assert_eq!(m.weight, 2.0); // base 1 + relation bonus
/// ```
pub fn match_removal(
    line: &DiffLine,
    buffer: &ScanBuffer,
    policy: &ScoringPolicy,
) -> Option<RemovalMatch> {
    if !line.eligible {
        return None;
    }
    let text = line.text.as_str();

    if buffer.contains_anywhere(text, &policy.abstract_sentinel) {
        return None;
    }

    let (inherit_single, inherit_closer) = INHERIT_SINGLE;
    let (inherit_multi, _) = INHERIT_MULTI;
    if buffer.holds_marker(text, inherit_single, inherit_closer)
        || buffer.holds_marker(text, inherit_multi, inherit_closer)
    {
        return Some(RemovalMatch {
            weight: 1.0,
            field_key: None,
        });
    }

    let (field_marker, field_closer) = FIELD_DECL;
    if buffer.holds_marker(text, field_marker, field_closer)
        && !is_trivial_attribute(text, policy)
    {
        let direct = text.contains(field_marker);
        let mut weight = if direct {
            1.0
        } else {
            // only an attribute mutation on a declaration held in the buffer
            policy.attribute_removal_weight
        };
        if text.contains(&policy.relation_marker) {
            weight += policy.relation_bonus;
        }
        return Some(RemovalMatch {
            weight,
            field_key: direct.then(|| field_key(text)),
        });
    }

    None
}

/// True for an attribute-only line (exactly one assignment, not a
/// declaration) that names none of the significant attributes. Such lines
/// contribute no score and are not a reset event; they pass through as
/// ordinary context for look-back purposes.
///
/// # Examples
///
/// ```
/// use migrascope_scan::matcher::is_trivial_attribute;
/// use migrascope_core::ScoringPolicy;
///
/// let policy = ScoringPolicy::default();
/// assert!(is_trivial_attribute("-    help=\"Some help\"", &policy));
/// assert!(!is_trivial_attribute("-    store=True", &policy));
/// assert!(!is_trivial_attribute("-    name = fields.Char()", &policy));
/// ```
pub fn is_trivial_attribute(text: &str, policy: &ScoringPolicy) -> bool {
    text.matches('=').count() == 1
        && !text.contains(FIELD_DECL.0)
        && !policy
            .significant_attributes
            .iter()
            .any(|attr| text.contains(attr.as_str()))
}

/// True when an added line is a structural candidate: a field declaration on
/// the line or continued from the buffer, and not a trivial attribute line.
pub fn addition_candidate(line: &DiffLine, buffer: &ScanBuffer, policy: &ScoringPolicy) -> bool {
    let (field_marker, field_closer) = FIELD_DECL;
    line.eligible
        && buffer.holds_marker(&line.text, field_marker, field_closer)
        && !is_trivial_attribute(&line.text, policy)
}

/// Whether the line carries the field-declaration marker directly.
pub fn is_field_declaration(text: &str) -> bool {
    text.contains(FIELD_DECL.0)
}

/// Pairing key for a field declaration: the text up to the opening
/// parenthesis with the sign character stripped. Field name and declaration
/// kind participate; parameters are ignored.
///
/// # Examples
///
/// ```
/// use migrascope_scan::matcher::field_key;
///
/// let removed = field_key("-    name = fields.Char(required=True)");
/// let added = field_key("+    name = fields.Char(required=False, store=True)");
/// assert_eq!(removed, added);
/// ```
pub fn field_key(text: &str) -> String {
    let unsigned = text.get(1..).unwrap_or("");
    unsigned.split('(').next().unwrap_or("").to_string()
}
