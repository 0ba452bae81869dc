use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MigError;

/// Top-level configuration loaded from `.migrascope.toml`.
///
/// CLI flags override config file values, which override these defaults.
///
/// # Examples
///
/// ```
/// use migrascope_core::MigConfig;
///
/// let config = MigConfig::default();
/// assert_eq!(config.policy.line_change_threshold, 30);
/// assert_eq!(config.output.dir, "module_diff_analysis");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigConfig {
    /// Scoring thresholds and weights.
    #[serde(default)]
    pub policy: ScoringPolicy,
    /// Repository conventions (addon filters, PR references).
    #[serde(default)]
    pub repo: RepoConfig,
    /// Artifact output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl MigConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MigError::Io`] if the file cannot be read, or
    /// [`MigError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use migrascope_core::MigConfig;
    /// use std::path::Path;
    ///
    /// let config = MigConfig::from_file(Path::new(".migrascope.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, MigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`MigError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use migrascope_core::MigConfig;
    ///
    /// let toml = r#"
    /// [policy]
    /// line_change_threshold = 50
    /// "#;
    /// let config = MigConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.policy.line_change_threshold, 50);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, MigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Every numeric threshold and weight used by the commit classifier,
/// factored out of the scanning logic so classification policy can be
/// tested and tuned independently.
///
/// # Examples
///
/// ```
/// use migrascope_core::ScoringPolicy;
///
/// let policy = ScoringPolicy::default();
/// assert_eq!(policy.relation_bonus, 1.0);
/// assert_eq!(policy.attribute_removal_weight, 0.4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Minimum path-scoped changed lines for rules 1, 2 and 4 (default: 30).
    #[serde(default = "default_line_change_threshold")]
    pub line_change_threshold: u64,
    /// Changed-line count above which a large commit may be promoted to a
    /// big feature (default: 200).
    #[serde(default = "default_feature_line_threshold")]
    pub feature_line_threshold: u64,
    /// Message line count required for big-feature promotion (default: 45).
    #[serde(default = "default_feature_message_threshold")]
    pub feature_message_threshold: usize,
    /// Message line count required by scoring rule 1 (default: 20).
    #[serde(default = "default_structural_message_threshold")]
    pub structural_message_threshold: usize,
    /// Removal score below which the weak-evidence downgrade applies
    /// (default: 4.0).
    #[serde(default = "default_downgrade_removal_limit")]
    pub downgrade_removal_limit: f64,
    /// Combined removal + addition score below which the downgrade applies
    /// (default: 5.0).
    #[serde(default = "default_downgrade_combined_limit")]
    pub downgrade_combined_limit: f64,
    /// Message line count below which the downgrade applies (default: 10).
    #[serde(default = "default_downgrade_message_limit")]
    pub downgrade_message_limit: usize,
    /// Combined addition + feature score that triggers big-feature
    /// promotion (default: 5.0).
    #[serde(default = "default_feature_combined_threshold")]
    pub feature_combined_threshold: f64,
    /// Weight charged when a removal only mutates a declaration attribute
    /// (default: 0.4).
    #[serde(default = "default_attribute_removal_weight")]
    pub attribute_removal_weight: f64,
    /// Weight charged when a declaration is re-added with changed
    /// significant attributes (default: 0.6).
    #[serde(default = "default_attribute_modify_weight")]
    pub attribute_modify_weight: f64,
    /// Flat weight for an attribute-only addition line (default: 0.2).
    #[serde(default = "default_attribute_addition_weight")]
    pub attribute_addition_weight: f64,
    /// Extra weight for multi-valued-relation declarations (default: 1.0).
    #[serde(default = "default_relation_bonus")]
    pub relation_bonus: f64,
    /// Declaration keyword arguments that affect migration effort when
    /// changed alone. `compute=` values are normalized to a placeholder
    /// before comparison, since the exact referenced method is irrelevant.
    #[serde(default = "default_significant_attributes")]
    pub significant_attributes: Vec<String>,
    /// Token voiding any structural match in its 3-line neighborhood
    /// (default: `AbstractModel`).
    #[serde(default = "default_abstract_sentinel")]
    pub abstract_sentinel: String,
    /// Substring marking a multi-valued relation declaration
    /// (default: `2many(`).
    #[serde(default = "default_relation_marker")]
    pub relation_marker: String,
    /// Summary marker that blocks big-feature promotion (default: `FIX`).
    #[serde(default = "default_fix_marker")]
    pub fix_marker: String,
    /// Normalized summary marker identifying forward-ported commits
    /// (default: `forwardport`).
    #[serde(default = "default_forward_port_marker")]
    pub forward_port_marker: String,
}

fn default_line_change_threshold() -> u64 {
    30
}

fn default_feature_line_threshold() -> u64 {
    200
}

fn default_feature_message_threshold() -> usize {
    45
}

fn default_structural_message_threshold() -> usize {
    20
}

fn default_downgrade_removal_limit() -> f64 {
    4.0
}

fn default_downgrade_combined_limit() -> f64 {
    5.0
}

fn default_downgrade_message_limit() -> usize {
    10
}

fn default_feature_combined_threshold() -> f64 {
    5.0
}

fn default_attribute_removal_weight() -> f64 {
    0.4
}

fn default_attribute_modify_weight() -> f64 {
    0.6
}

fn default_attribute_addition_weight() -> f64 {
    0.2
}

fn default_relation_bonus() -> f64 {
    1.0
}

fn default_significant_attributes() -> Vec<String> {
    vec![
        "company_dependent=".into(),
        "store=".into(),
        "compute=".into(),
        "recursive=".into(),
    ]
}

fn default_abstract_sentinel() -> String {
    "AbstractModel".into()
}

fn default_relation_marker() -> String {
    "2many(".into()
}

fn default_fix_marker() -> String {
    "FIX".into()
}

fn default_forward_port_marker() -> String {
    "forwardport".into()
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            line_change_threshold: default_line_change_threshold(),
            feature_line_threshold: default_feature_line_threshold(),
            feature_message_threshold: default_feature_message_threshold(),
            structural_message_threshold: default_structural_message_threshold(),
            downgrade_removal_limit: default_downgrade_removal_limit(),
            downgrade_combined_limit: default_downgrade_combined_limit(),
            downgrade_message_limit: default_downgrade_message_limit(),
            feature_combined_threshold: default_feature_combined_threshold(),
            attribute_removal_weight: default_attribute_removal_weight(),
            attribute_modify_weight: default_attribute_modify_weight(),
            attribute_addition_weight: default_attribute_addition_weight(),
            relation_bonus: default_relation_bonus(),
            significant_attributes: default_significant_attributes(),
            abstract_sentinel: default_abstract_sentinel(),
            relation_marker: default_relation_marker(),
            fix_marker: default_fix_marker(),
            forward_port_marker: default_forward_port_marker(),
        }
    }
}

/// Repository conventions: which addons to skip and how PR references are
/// written in commit messages.
///
/// # Examples
///
/// ```
/// use migrascope_core::RepoConfig;
///
/// let config = RepoConfig::default();
/// assert!(config.exclude_prefixes.contains(&"l10n_".to_string()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Addon name prefixes excluded from full scans.
    #[serde(default = "default_exclude_prefixes")]
    pub exclude_prefixes: Vec<String>,
    /// Additional glob patterns for addons to skip.
    #[serde(default)]
    pub skip_globs: Vec<String>,
    /// Marker preceding a PR number in commit message lines.
    #[serde(default = "default_pr_marker")]
    pub pr_marker: String,
    /// URL prefix for building PR links from extracted numbers.
    #[serde(default = "default_pr_url_base")]
    pub pr_url_base: String,
}

fn default_exclude_prefixes() -> Vec<String> {
    vec!["l10n_".into(), "website_".into(), "test".into()]
}

fn default_pr_marker() -> String {
    " odoo/odoo#".into()
}

fn default_pr_url_base() -> String {
    "https://github.com/odoo/odoo/pull/".into()
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            exclude_prefixes: default_exclude_prefixes(),
            skip_globs: Vec::new(),
            pr_marker: default_pr_marker(),
            pr_url_base: default_pr_url_base(),
        }
    }
}

/// Artifact output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Base output directory (default: `module_diff_analysis`).
    #[serde(default = "default_output_dir")]
    pub dir: String,
    /// Nest artifacts under a `<series>.0/` directory (default: true).
    #[serde(default = "default_wrap_series_dir")]
    pub wrap_series_dir: bool,
}

fn default_output_dir() -> String {
    "module_diff_analysis".into()
}

fn default_wrap_series_dir() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            wrap_series_dir: default_wrap_series_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = MigConfig::default();
        assert_eq!(config.policy.line_change_threshold, 30);
        assert_eq!(config.policy.feature_line_threshold, 200);
        assert_eq!(config.policy.feature_message_threshold, 45);
        assert_eq!(config.policy.attribute_removal_weight, 0.4);
        assert_eq!(config.policy.attribute_modify_weight, 0.6);
        assert_eq!(config.policy.attribute_addition_weight, 0.2);
        assert_eq!(config.policy.significant_attributes.len(), 4);
        assert_eq!(config.policy.abstract_sentinel, "AbstractModel");
        assert_eq!(config.repo.pr_marker, " odoo/odoo#");
        assert!(config.output.wrap_series_dir);
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[policy]
line_change_threshold = 50
fix_marker = "BUGFIX"
"#;
        let config = MigConfig::from_toml(toml).unwrap();
        assert_eq!(config.policy.line_change_threshold, 50);
        assert_eq!(config.policy.fix_marker, "BUGFIX");
        // untouched fields keep serde defaults
        assert_eq!(config.policy.relation_bonus, 1.0);
        assert_eq!(config.policy.forward_port_marker, "forwardport");
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[policy]
feature_line_threshold = 300
significant_attributes = ["store=", "compute="]

[repo]
exclude_prefixes = ["theme_"]
pr_marker = " myorg/myrepo#"
pr_url_base = "https://github.com/myorg/myrepo/pull/"

[output]
dir = "out"
wrap_series_dir = false
"#;
        let config = MigConfig::from_toml(toml).unwrap();
        assert_eq!(config.policy.feature_line_threshold, 300);
        assert_eq!(config.policy.significant_attributes, vec!["store=", "compute="]);
        assert_eq!(config.repo.exclude_prefixes, vec!["theme_"]);
        assert_eq!(config.output.dir, "out");
        assert!(!config.output.wrap_series_dir);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = MigConfig::from_toml("").unwrap();
        assert_eq!(config.policy.line_change_threshold, 30);
        assert_eq!(config.output.dir, "module_diff_analysis");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = MigConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }
}
