use migrascope_core::LineSign;

/// A single normalized line from one file's diff hunk.
///
/// Normalization strips trailing inline comments and tab characters but
/// keeps the sign character and the indentation that follows it, since the
/// matcher relies on both.
///
/// # Examples
///
/// ```
/// use migrascope_scan::tokenizer::tokenize;
/// use migrascope_core::LineSign;
///
/// let lines = tokenize("-    name = fields.Char()  # legacy\n+    pass\n");
/// assert_eq!(lines[0].text, "-    name = fields.Char()");
/// assert_eq!(lines[0].sign, LineSign::Removed);
/// assert!(lines[0].eligible);
/// ```
#[derive(Debug, Clone)]
pub struct DiffLine {
    /// Normalized text, sign character included.
    pub text: String,
    /// Diff side of the line.
    pub sign: LineSign,
    /// 0-based position within the file diff.
    pub position: usize,
    /// True when the line sits at exactly one indent level inside a
    /// declaring body: sign followed by four spaces but not eight. Deeper
    /// lines (conditional or method logic) are never structural candidates.
    pub eligible: bool,
}

/// Normalize one raw diff line: cut at the first inline comment, trim
/// surrounding whitespace, collapse tabs to spaces.
pub fn normalize_line(raw: &str) -> String {
    let uncommented = raw.split(" #").next().unwrap_or("");
    uncommented.trim().replace('\t', " ")
}

/// Split one file's diff text into normalized, classified lines.
///
/// Hunk headers, file headers and nested lines all flow through as context;
/// they still feed the look-back buffer so declarations split across lines
/// remain detectable.
///
/// # Examples
///
/// ```
/// use migrascope_scan::tokenizer::tokenize;
///
/// let lines = tokenize("@@ -1,3 +1,2 @@\n-        if done:\n-    _inherit = 'res.partner'\n");
/// assert!(!lines[0].eligible);
/// assert!(!lines[1].eligible); // two indent levels deep
/// assert!(lines[2].eligible);
/// ```
pub fn tokenize(file_diff: &str) -> Vec<DiffLine> {
    file_diff
        .lines()
        .enumerate()
        .map(|(position, raw)| classify_line(raw, position))
        .collect()
}

fn classify_line(raw: &str, position: usize) -> DiffLine {
    let text = normalize_line(raw);

    let sign = match raw.as_bytes().first() {
        Some(b'+') => LineSign::Added,
        Some(b'-') => LineSign::Removed,
        _ => LineSign::Context,
    };

    let eligible = match sign {
        LineSign::Removed => text.starts_with("-    ") && !text.starts_with("-        "),
        LineSign::Added => text.starts_with("+    ") && !text.starts_with("+        "),
        LineSign::Context => false,
    };

    DiffLine {
        text,
        sign,
        position,
        eligible,
    }
}
