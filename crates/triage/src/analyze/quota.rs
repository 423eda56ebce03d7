//! Resource quota and limit-range analysis.

use serde::Serialize;
use tracing::trace;

use crate::resources::{LimitRange, List, ResourceQuota};

/// Utilization above this fraction of a quota's hard limit is flagged.
const QUOTA_WARN_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceConstraintAnalysis {
    pub quotas: usize,
    #[serde(rename = "limitRanges")]
    pub limit_ranges: usize,
    /// Human-readable near-limit findings.
    pub violations: Vec<String>,
}

/// Parse a Kubernetes quantity string into a comparable scalar.
///
/// Binary (`Ki`/`Mi`/`Gi`/`Ti`) and decimal (`k`/`M`/`G`/`T`) suffixes are
/// expanded; a trailing `m` is treated as millis (CPU millicores). Returns
/// `None` for anything unparseable rather than guessing.
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let suffixes: [(&str, f64); 9] = [
        ("Ki", 1024.0),
        ("Mi", 1024.0 * 1024.0),
        ("Gi", 1024.0 * 1024.0 * 1024.0),
        ("Ti", 1024.0 * 1024.0 * 1024.0 * 1024.0),
        ("k", 1e3),
        ("M", 1e6),
        ("G", 1e9),
        ("T", 1e12),
        ("m", 1e-3),
    ];
    for (suffix, factor) in suffixes {
        if let Some(number) = raw.strip_suffix(suffix) {
            return number.parse::<f64>().ok().map(|n| n * factor);
        }
    }
    raw.parse().ok()
}

/// Compare quota usage against hard limits and count limit ranges.
pub fn analyze_constraints(
    quotas: &List<ResourceQuota>,
    limit_ranges: &List<LimitRange>,
) -> ResourceConstraintAnalysis {
    let mut analysis = ResourceConstraintAnalysis {
        quotas: quotas.items.len(),
        limit_ranges: limit_ranges.items.len(),
        ..ResourceConstraintAnalysis::default()
    };

    for quota in &quotas.items {
        let name = &quota.metadata.name;
        for (resource, hard_raw) in &quota.status.hard {
            let Some(used_raw) = quota.status.used.get(resource) else {
                continue;
            };
            let (Some(hard), Some(used)) = (parse_quantity(hard_raw), parse_quantity(used_raw))
            else {
                trace!(quota = %name, %resource, "skipping unparseable quantity");
                continue;
            };
            if hard <= 0.0 {
                continue;
            }
            let fraction = used / hard;
            if fraction > QUOTA_WARN_FRACTION {
                analysis.violations.push(format!(
                    "quota {name}: {resource} at {:.0}% ({used_raw}/{hard_raw})",
                    fraction * 100.0
                ));
            }
        }
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_binary_decimal_and_milli_suffixes() {
        assert_eq!(parse_quantity("512Mi"), Some(512.0 * 1024.0 * 1024.0));
        assert_eq!(parse_quantity("2Gi"), Some(2.0 * 1024.0 * 1024.0 * 1024.0));
        assert_eq!(parse_quantity("1500k"), Some(1_500_000.0));
        assert_eq!(parse_quantity("500m"), Some(0.5));
        assert_eq!(parse_quantity("4"), Some(4.0));
        assert_eq!(parse_quantity("garbage"), None);
        assert_eq!(parse_quantity(""), None);
    }

    #[test]
    fn flags_quota_above_eighty_percent() {
        let quotas: List<ResourceQuota> = serde_json::from_value(json!({ "items": [
            { "metadata": { "name": "compute" },
              "status": { "hard": { "cpu": "10", "memory": "10Gi" },
                          "used": { "cpu": "9", "memory": "2Gi" } } },
        ]}))
        .unwrap();
        let analysis = analyze_constraints(&quotas, &List::default());
        assert_eq!(analysis.quotas, 1);
        assert_eq!(analysis.violations, vec!["quota compute: cpu at 90% (9/10)"]);
    }

    #[test]
    fn millicore_usage_compares_against_whole_cores() {
        let quotas: List<ResourceQuota> = serde_json::from_value(json!({ "items": [
            { "metadata": { "name": "compute" },
              "status": { "hard": { "cpu": "1" },
                          "used": { "cpu": "900m" } } },
        ]}))
        .unwrap();
        let analysis = analyze_constraints(&quotas, &List::default());
        assert_eq!(analysis.violations.len(), 1);
    }

    #[test]
    fn unparseable_quantities_are_skipped() {
        let quotas: List<ResourceQuota> = serde_json::from_value(json!({ "items": [
            { "metadata": { "name": "odd" },
              "status": { "hard": { "pods": "abc" }, "used": { "pods": "3" } } },
        ]}))
        .unwrap();
        let analysis = analyze_constraints(&quotas, &List::default());
        assert!(analysis.violations.is_empty());
    }
}
