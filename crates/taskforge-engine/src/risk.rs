use serde::Serialize;
use taskforge_types::{round_rate, PatternFrequency, RiskLevel};

// Failure-rate thresholds for pattern classification. Stated as-is by the
// source material; not derived from measurement.
pub const RISKY_THRESHOLD: f64 = 0.25;
pub const MEDIUM_THRESHOLD: f64 = 0.50;
pub const HIGH_THRESHOLD: f64 = 0.75;

pub const DEFAULT_MIN_OCCURRENCES: u64 = 3;
pub const DEFAULT_FAILURE_THRESHOLD: f64 = 0.5;

/// A pattern whose failure rate crossed the detection threshold.
#[derive(Debug, Clone, Serialize)]
pub struct FailurePattern {
    pub pattern: String,
    pub frequency: u64,
    pub failure_count: u64,
    pub failure_rate: f64,
    pub risk_level: RiskLevel,
}

/// Classification of a single pattern's historical failure rate.
#[derive(Debug, Clone, Serialize)]
pub struct PatternRisk {
    pub pattern: String,
    pub is_risky: bool,
    pub risk_level: Option<RiskLevel>,
    pub failure_rate: f64,
    pub frequency: u64,
    pub failure_count: u64,
    pub recommendation: String,
}

fn failure_level(rate: f64) -> RiskLevel {
    if rate >= HIGH_THRESHOLD {
        RiskLevel::High
    } else if rate >= MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Patterns seen at least `min_occurrences` times whose failure rate is at
/// or above `failure_threshold`, worst first.
pub fn detect_failure_patterns(
    aggregates: &[PatternFrequency],
    min_occurrences: u64,
    failure_threshold: f64,
) -> Vec<FailurePattern> {
    let mut detected: Vec<FailurePattern> = aggregates
        .iter()
        .filter(|pf| pf.frequency >= min_occurrences)
        .filter_map(|pf| {
            let rate = pf.failure_rate();
            if rate >= failure_threshold {
                Some(FailurePattern {
                    pattern: pf.pattern.clone(),
                    frequency: pf.frequency,
                    failure_count: pf.failure_count,
                    failure_rate: round_rate(rate),
                    risk_level: failure_level(rate),
                })
            } else {
                None
            }
        })
        .collect();

    detected.sort_by(|a, b| {
        b.failure_rate
            .partial_cmp(&a.failure_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.frequency.cmp(&a.frequency))
    });
    detected
}

/// Risk classification for one pattern, with a human-readable
/// recommendation in every result.
pub fn check_pattern_risk(pattern: &str, aggregate: Option<&PatternFrequency>) -> PatternRisk {
    let Some(pf) = aggregate.filter(|pf| pf.frequency > 0) else {
        return PatternRisk {
            pattern: pattern.to_string(),
            is_risky: false,
            risk_level: None,
            failure_rate: 0.0,
            frequency: 0,
            failure_count: 0,
            recommendation: "No historical data for this pattern".to_string(),
        };
    };

    let rate = pf.failure_rate();
    let failure_rate = round_rate(rate);
    let is_risky = rate >= RISKY_THRESHOLD;
    let risk_level = failure_level(rate);

    let recommendation = if !is_risky {
        format!(
            "Pattern has a solid track record ({} uses, {:.0}% failure); safe to apply",
            pf.frequency,
            failure_rate * 100.0
        )
    } else {
        match risk_level {
            RiskLevel::High => format!(
                "Pattern failed in {:.0}% of {} uses; strongly consider an alternative approach",
                failure_rate * 100.0,
                pf.frequency
            ),
            RiskLevel::Medium => format!(
                "Pattern failed in {:.0}% of {} uses; apply with extra review and tests",
                failure_rate * 100.0,
                pf.frequency
            ),
            RiskLevel::Low => format!(
                "Pattern occasionally fails ({:.0}% of {} uses); double-check edge cases",
                failure_rate * 100.0,
                pf.frequency
            ),
        }
    };

    PatternRisk {
        pattern: pattern.to_string(),
        is_risky,
        risk_level: Some(risk_level),
        failure_rate,
        frequency: pf.frequency,
        failure_count: pf.failure_count,
        recommendation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(pattern: &str, success: u64, failure: u64, improvement: u64) -> PatternFrequency {
        PatternFrequency {
            pattern: pattern.to_string(),
            frequency: success + failure + improvement,
            success_count: success,
            failure_count: failure,
            improvement_count: improvement,
            first_seen: None,
            last_seen: None,
        }
    }

    #[test]
    fn test_check_no_data() {
        let risk = check_pattern_risk("unknown", None);
        assert!(!risk.is_risky);
        assert!(risk.risk_level.is_none());
        assert_eq!(risk.failure_rate, 0.0);
        assert!(risk.recommendation.contains("No historical data"));
    }

    #[test]
    fn test_check_three_failures_one_success() {
        let pf = aggregate("regex-parser", 1, 3, 0);
        let risk = check_pattern_risk("regex-parser", Some(&pf));
        assert_eq!(risk.failure_rate, 0.75);
        assert_eq!(risk.risk_level, Some(RiskLevel::High));
        assert!(risk.is_risky);
    }

    #[test]
    fn test_risky_boundary() {
        let pf = aggregate("p", 3, 1, 0); // 25%
        let risk = check_pattern_risk("p", Some(&pf));
        assert!(risk.is_risky);
        assert_eq!(risk.risk_level, Some(RiskLevel::Low));

        let pf = aggregate("p", 4, 1, 0); // 20%
        let risk = check_pattern_risk("p", Some(&pf));
        assert!(!risk.is_risky);
    }

    #[test]
    fn test_detect_requires_min_occurrences() {
        let aggregates = vec![aggregate("rare", 0, 2, 0)];
        assert!(detect_failure_patterns(&aggregates, 3, 0.5).is_empty());
    }

    #[test]
    fn test_detect_orders_worst_first() {
        let aggregates = vec![
            aggregate("medium", 2, 2, 0),  // 50%
            aggregate("worst", 0, 4, 0),   // 100%
            aggregate("healthy", 4, 0, 0), // 0%
        ];
        let detected = detect_failure_patterns(&aggregates, 3, 0.5);
        assert_eq!(detected.len(), 2);
        assert_eq!(detected[0].pattern, "worst");
        assert_eq!(detected[0].risk_level, RiskLevel::High);
        assert_eq!(detected[1].pattern, "medium");
        assert_eq!(detected[1].risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_risk_monotone_in_failures() {
        // Adding one more failure never lowers rate or level.
        let before = aggregate("p", 2, 2, 0);
        let after = aggregate("p", 2, 3, 0);
        let risk_before = check_pattern_risk("p", Some(&before));
        let risk_after = check_pattern_risk("p", Some(&after));
        assert!(risk_after.failure_rate >= risk_before.failure_rate);
        assert!(risk_after.risk_level >= risk_before.risk_level);
    }
}
