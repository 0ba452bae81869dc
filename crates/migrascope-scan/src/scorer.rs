use migrascope_core::{Classification, ScoringPolicy};

/// Everything the scorer looks at for one commit.
///
/// # Examples
///
/// ```
/// use migrascope_scan::scorer::{classify, ScoreInputs};
/// use migrascope_core::{Classification, ScoringPolicy};
///
/// let inputs = ScoreInputs {
///     removal: 3.0,
///     addition: 0.0,
///     feature: 0.0,
///     total_changes: 120,
///     message_lines: 12,
///     summary: "[REF] account: drop legacy tax fields",
/// };
/// assert_eq!(classify(&inputs, &ScoringPolicy::default()), Classification::StructuralChange);
/// ```
#[derive(Debug, Clone)]
pub struct ScoreInputs<'a> {
    /// Structural removal score.
    pub removal: f64,
    /// Structural addition score.
    pub addition: f64,
    /// Additive feature score.
    pub feature: f64,
    /// Path-scoped changed-line count.
    pub total_changes: u64,
    /// Number of lines in the commit message.
    pub message_lines: usize,
    /// First line of the commit message.
    pub summary: &'a str,
}

/// Classify one commit from its scores, diff size and message shape.
///
/// First matching rule wins structural-change, given removal score R,
/// addition score A, changed-line count T and message line count M:
///
/// 1. `R == 1 && T > threshold && M > 20`
/// 2. `R == 2 && T > threshold`
/// 3. `R > 2`
/// 4. `R > 1 && A > 3 && T > threshold`
///
/// A weakly corroborated structural change (small removal score, small
/// combined score, diff under twice the threshold, terse message) is forced
/// back to noise. A noisy commit whose summary lacks the fix marker is
/// promoted to big-feature when both its diff and its message are large, or
/// when its additive signal and message are large.
///
/// # Examples
///
/// ```
/// use migrascope_scan::scorer::{classify, ScoreInputs};
/// use migrascope_core::{Classification, ScoringPolicy};
///
/// let noise = ScoreInputs {
///     removal: 1.0,
///     addition: 0.0,
///     feature: 0.0,
///     total_changes: 25,
///     message_lines: 5,
///     summary: "[FIX] account: rounding",
/// };
/// assert_eq!(classify(&noise, &ScoringPolicy::default()), Classification::Noise);
/// ```
pub fn classify(inputs: &ScoreInputs<'_>, policy: &ScoringPolicy) -> Classification {
    let r = inputs.removal;
    let a = inputs.addition;
    let f = inputs.feature;
    let t = inputs.total_changes;
    let m = inputs.message_lines;

    let over_threshold = t > policy.line_change_threshold;

    let mut structural = (r == 1.0 && over_threshold && m > policy.structural_message_threshold)
        || (r == 2.0 && over_threshold)
        || r > 2.0
        || (r > 1.0 && a > 3.0 && over_threshold);

    if structural
        && r < policy.downgrade_removal_limit
        && r + a < policy.downgrade_combined_limit
        && t < 2 * policy.line_change_threshold
        && m < policy.downgrade_message_limit
    {
        // medium change with little removal and very little explanation
        structural = false;
    }

    if structural {
        return Classification::StructuralChange;
    }

    let fix = inputs.summary.contains(&policy.fix_marker);
    let big_diff = t > policy.feature_line_threshold && m > policy.feature_message_threshold;
    let big_additive =
        a + f > policy.feature_combined_threshold && m > policy.feature_message_threshold;
    if !fix && (big_diff || big_additive) {
        return Classification::BigFeature;
    }

    Classification::Noise
}

/// Render the presentation-only heat string: a log2-scaled bucket of the
/// addition and removal scores and a tiered bucket of the diff size,
/// left-padded to a fixed width. Never an input to any decision.
///
/// # Examples
///
/// ```
/// use migrascope_scan::scorer::heat_string;
/// use migrascope_core::Classification;
///
/// let heat = heat_string(3.0, 1.0, 450, Classification::StructuralChange);
/// assert_eq!(heat, "_______++-##");
/// ```
pub fn heat_string(
    addition: f64,
    removal: f64,
    total_changes: u64,
    classification: Classification,
) -> String {
    let plus = log2_bucket(addition);
    let minus = log2_bucket(removal);
    let pounds = match total_changes {
        t if t > 800 => 4,
        t if t > 400 => 3,
        t if t > 200 => 2,
        t if t > 100 => 1,
        _ => 0,
    };

    let mut heat = String::new();
    heat.push_str(&"+".repeat(plus));
    heat.push_str(&"-".repeat(minus));
    heat.push_str(&"#".repeat(pounds));

    let padded = format!("{heat:_>13}");
    let width = if classification == Classification::BigFeature {
        9
    } else {
        12
    };
    padded.chars().take(width).collect()
}

fn log2_bucket(score: f64) -> usize {
    let base = (score + 1.0).max(1.0);
    base.log2() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ScoringPolicy {
        ScoringPolicy::default()
    }

    fn inputs(removal: f64, addition: f64, feature: f64, t: u64, m: usize) -> ScoreInputs<'static> {
        ScoreInputs {
            removal,
            addition,
            feature,
            total_changes: t,
            message_lines: m,
            summary: "[REF] account: restructure moves",
        }
    }

    #[test]
    fn single_removal_small_diff_is_noise() {
        assert_eq!(classify(&inputs(1.0, 0.0, 0.0, 25, 5), &policy()), Classification::Noise);
    }

    #[test]
    fn single_removal_with_long_message_is_structural() {
        // rule 1 matches and the long message escapes the downgrade
        assert_eq!(
            classify(&inputs(1.0, 0.0, 0.0, 31, 21), &policy()),
            Classification::StructuralChange
        );
    }

    #[test]
    fn double_removal_with_big_diff_is_structural() {
        assert_eq!(
            classify(&inputs(2.0, 0.0, 0.0, 100, 3), &policy()),
            Classification::StructuralChange
        );
    }

    #[test]
    fn many_removals_always_structural() {
        assert_eq!(
            classify(&inputs(3.0, 0.0, 0.0, 10, 2), &policy()),
            Classification::Noise,
            "downgrade still applies to tiny diffs"
        );
        assert_eq!(
            classify(&inputs(5.0, 0.0, 0.0, 10, 2), &policy()),
            Classification::StructuralChange,
            "R >= 4 escapes the downgrade"
        );
    }

    #[test]
    fn removals_plus_additions_rule() {
        assert_eq!(
            classify(&inputs(1.5, 4.0, 0.0, 80, 4), &policy()),
            Classification::StructuralChange
        );
    }

    #[test]
    fn weak_evidence_downgrade() {
        // R == 2 and T > 30 matches rule 2, but everything is small
        assert_eq!(
            classify(&inputs(2.0, 0.0, 0.0, 40, 3), &policy()),
            Classification::Noise
        );
        // a long message escapes the downgrade
        assert_eq!(
            classify(&inputs(2.0, 0.0, 0.0, 40, 15), &policy()),
            Classification::StructuralChange
        );
    }

    #[test]
    fn big_feature_promotion_on_diff_size() {
        assert_eq!(
            classify(&inputs(0.0, 0.0, 6.0, 250, 50), &policy()),
            Classification::BigFeature
        );
    }

    #[test]
    fn big_feature_promotion_on_additive_signal() {
        assert_eq!(
            classify(&inputs(0.0, 4.0, 2.0, 50, 50), &policy()),
            Classification::BigFeature
        );
    }

    #[test]
    fn fix_marker_blocks_promotion() {
        let mut i = inputs(0.0, 0.0, 6.0, 250, 50);
        i.summary = "[FIX] account: big fix";
        assert_eq!(classify(&i, &policy()), Classification::Noise);
    }

    #[test]
    fn short_message_blocks_promotion() {
        assert_eq!(
            classify(&inputs(0.0, 0.0, 6.0, 250, 10), &policy()),
            Classification::Noise
        );
    }

    #[test]
    fn heat_string_shape() {
        assert_eq!(
            heat_string(0.0, 0.0, 0, Classification::Noise),
            "____________"
        );
        assert_eq!(
            heat_string(3.0, 1.0, 450, Classification::StructuralChange),
            "_______++-##"
        );
    }

    #[test]
    fn heat_string_truncates_for_features() {
        let heat = heat_string(0.0, 0.0, 900, Classification::BigFeature);
        assert_eq!(heat.len(), 9);
        assert_eq!(heat, "_________");
    }

    #[test]
    fn log2_buckets_truncate() {
        assert_eq!(log2_bucket(0.0), 0);
        assert_eq!(log2_bucket(1.0), 1);
        assert_eq!(log2_bucket(3.0), 2);
        assert_eq!(log2_bucket(7.0), 3);
        assert_eq!(log2_bucket(-0.6), 0);
    }
}
