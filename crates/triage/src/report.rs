//! Checklist report types, finalization, and markdown rendering.

use serde::Serialize;

use crate::namespace::HealthStatus;
use crate::rootcause::RootCause;

/// Cap on prioritized next actions in a finalized report.
const NEXT_ACTION_CAP: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warning,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// One discrete diagnostic check.
#[derive(Debug, Clone, Serialize)]
pub struct ChecklistItem {
    pub name: String,
    pub status: CheckStatus,
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub severity: Severity,
}

impl ChecklistItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Pass,
            findings: Vec::new(),
            recommendations: Vec::new(),
            duration_ms: 0,
            severity: Severity::Low,
        }
    }

    /// Standard shape for a check that blew up: fail status, the error text
    /// as the finding, plus a remediation hint.
    pub fn failed(name: impl Into<String>, error: &str) -> Self {
        Self {
            name: name.into(),
            status: CheckStatus::Fail,
            findings: vec![format!("check failed: {error}")],
            recommendations: vec![
                "verify cluster connectivity and RBAC permissions for this resource".to_string(),
            ],
            duration_ms: 0,
            severity: Severity::High,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummary {
    #[serde(rename = "totalChecks")]
    pub total_checks: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
}

/// Structured evidence accumulated during the run, rendered to text only at
/// the output boundary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvidenceBundle {
    pub symptoms: Vec<String>,
    #[serde(rename = "affectedResources")]
    pub affected_resources: Vec<String>,
    #[serde(rename = "diagnosticSteps")]
    pub diagnostic_steps: Vec<String>,
}

/// Final report of one checklist run. Checklist items are appended as checks
/// complete; everything else is filled by the finalization pass.
#[derive(Debug, Clone, Serialize)]
pub struct RcaChecklistResult {
    #[serde(rename = "reportId")]
    pub report_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub timestamp: String,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    #[serde(rename = "overallStatus")]
    pub overall_status: HealthStatus,
    #[serde(rename = "checksPerformed")]
    pub checks_performed: Vec<ChecklistItem>,
    pub summary: ReportSummary,
    #[serde(rename = "criticalIssues")]
    pub critical_issues: Vec<String>,
    #[serde(rename = "nextActions")]
    pub next_actions: Vec<String>,
    pub evidence: EvidenceBundle,
    #[serde(rename = "humanSummary")]
    pub human_summary: String,
    #[serde(rename = "rootCause", skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<RootCause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
}

impl RcaChecklistResult {
    pub fn new(report_id: String, namespace: Option<String>, timestamp: String) -> Self {
        Self {
            report_id,
            namespace,
            timestamp,
            duration_ms: 0,
            overall_status: HealthStatus::Healthy,
            checks_performed: Vec::new(),
            summary: ReportSummary::default(),
            critical_issues: Vec::new(),
            next_actions: Vec::new(),
            evidence: EvidenceBundle::default(),
            human_summary: String::new(),
            root_cause: None,
            markdown: None,
        }
    }
}

/// Fixed post-processing pass: summary counts, overall status, critical
/// issues, prioritized next actions, human summary. Root-cause derivation is
/// the caller's job since it needs facts beyond the item list.
pub fn finalize(result: &mut RcaChecklistResult) {
    let items = &result.checks_performed;
    result.summary = ReportSummary {
        total_checks: items.len(),
        passed: items.iter().filter(|i| i.status == CheckStatus::Pass).count(),
        failed: items.iter().filter(|i| i.status == CheckStatus::Fail).count(),
        warnings: items.iter().filter(|i| i.status == CheckStatus::Warning).count(),
    };

    // A timeout may already have marked the run failing.
    if result.overall_status != HealthStatus::Failing {
        result.overall_status = if result.summary.failed > 0 {
            HealthStatus::Failing
        } else if result.summary.warnings > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
    }

    for item in items {
        if item.severity == Severity::Critical || item.status == CheckStatus::Fail {
            result
                .critical_issues
                .extend(item.findings.iter().map(|f| format!("{}: {f}", item.name)));
        }
    }

    let mut actions: Vec<String> = Vec::new();
    for severity in [Severity::Critical, Severity::High] {
        for item in items {
            if item.severity == severity {
                for rec in &item.recommendations {
                    if !actions.contains(rec) {
                        actions.push(rec.clone());
                    }
                }
            }
        }
    }
    actions.truncate(NEXT_ACTION_CAP);
    result.next_actions = actions;

    result.human_summary = format!(
        "{} of {} checks passed ({} failed, {} warnings); overall status: {}",
        result.summary.passed,
        result.summary.total_checks,
        result.summary.failed,
        result.summary.warnings,
        result.overall_status.as_str()
    );
}

fn glyph(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "✅",
        CheckStatus::Fail => "❌",
        CheckStatus::Warning => "⚠️",
        CheckStatus::Skipped => "⏭️",
    }
}

/// Render the fixed-order markdown report.
pub fn render_markdown(result: &RcaChecklistResult) -> String {
    let mut out = String::new();
    out.push_str("# Diagnostic Checklist Report\n\n");
    out.push_str(&format!("- Report: `{}`\n", result.report_id));
    if let Some(ns) = &result.namespace {
        out.push_str(&format!("- Namespace: `{ns}`\n"));
    }
    out.push_str(&format!("- Timestamp: {}\n", result.timestamp));
    out.push_str(&format!("- Duration: {}ms\n\n", result.duration_ms));

    out.push_str("## Summary\n\n");
    out.push_str(&format!("{}\n\n", result.human_summary));

    if let Some(cause) = &result.root_cause {
        out.push_str("## Root Cause\n\n");
        out.push_str(&format!(
            "{} (confidence {:.0}%)\n\n",
            cause.summary,
            cause.confidence * 100.0
        ));
        for item in &cause.evidence {
            out.push_str(&format!("- {item}\n"));
        }
        out.push('\n');
    }

    if !result.critical_issues.is_empty() {
        out.push_str("## Critical Issues\n\n");
        for issue in &result.critical_issues {
            out.push_str(&format!("- {issue}\n"));
        }
        out.push('\n');
    }

    if !result.next_actions.is_empty() {
        out.push_str("## Next Actions\n\n");
        for (index, action) in result.next_actions.iter().enumerate() {
            out.push_str(&format!("{}. {action}\n", index + 1));
        }
        out.push('\n');
    }

    out.push_str("## Detailed Findings\n");
    for item in &result.checks_performed {
        out.push_str(&format!("\n### {} {}\n\n", glyph(item.status), item.name));
        for finding in &item.findings {
            out.push_str(&format!("- {finding}\n"));
        }
        if !item.recommendations.is_empty() {
            out.push_str("\nRecommendations:\n");
            for rec in &item.recommendations {
                out.push_str(&format!("- {rec}\n"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, status: CheckStatus, severity: Severity) -> ChecklistItem {
        ChecklistItem {
            name: name.to_string(),
            status,
            findings: vec![format!("{name} finding")],
            recommendations: vec![format!("{name} action")],
            duration_ms: 10,
            severity,
        }
    }

    #[test]
    fn finalize_computes_counts_and_status() {
        let mut result = RcaChecklistResult::new("r-1".into(), None, "t".into());
        result.checks_performed = vec![
            item("a", CheckStatus::Pass, Severity::Low),
            item("b", CheckStatus::Warning, Severity::Medium),
        ];
        finalize(&mut result);
        assert_eq!(result.summary.total_checks, 2);
        assert_eq!(result.summary.passed, 1);
        assert_eq!(result.summary.warnings, 1);
        assert_eq!(result.overall_status, HealthStatus::Degraded);
    }

    #[test]
    fn any_failed_check_marks_run_failing() {
        let mut result = RcaChecklistResult::new("r-1".into(), None, "t".into());
        result.checks_performed = vec![
            item("a", CheckStatus::Pass, Severity::Low),
            item("b", CheckStatus::Fail, Severity::High),
        ];
        finalize(&mut result);
        assert_eq!(result.overall_status, HealthStatus::Failing);
        assert_eq!(result.critical_issues, vec!["b: b finding"]);
    }

    #[test]
    fn next_actions_prefer_critical_and_are_capped() {
        let mut result = RcaChecklistResult::new("r-1".into(), None, "t".into());
        for i in 0..4 {
            result
                .checks_performed
                .push(item(&format!("high-{i}"), CheckStatus::Warning, Severity::High));
        }
        result
            .checks_performed
            .push(item("urgent", CheckStatus::Fail, Severity::Critical));
        finalize(&mut result);
        assert_eq!(result.next_actions.len(), 5);
        assert_eq!(result.next_actions[0], "urgent action");
    }

    #[test]
    fn preexisting_failing_status_survives_finalize() {
        let mut result = RcaChecklistResult::new("r-1".into(), None, "t".into());
        result.overall_status = HealthStatus::Failing;
        result.checks_performed = vec![item("a", CheckStatus::Pass, Severity::Low)];
        finalize(&mut result);
        assert_eq!(result.overall_status, HealthStatus::Failing);
    }

    #[test]
    fn markdown_sections_appear_in_fixed_order() {
        let mut result = RcaChecklistResult::new("r-1".into(), Some("shop".into()), "t".into());
        result.checks_performed = vec![item("pods", CheckStatus::Fail, Severity::Critical)];
        finalize(&mut result);
        result.root_cause = Some(crate::rootcause::RootCause {
            kind: crate::rootcause::RootCauseType::ImagePullFailures,
            summary: "cannot pull images".to_string(),
            confidence: 0.7,
            evidence: vec!["pods finding".to_string()],
        });
        let md = render_markdown(&result);
        let order = ["## Summary", "## Root Cause", "## Critical Issues", "## Next Actions", "## Detailed Findings"];
        let positions: Vec<_> = order.iter().map(|s| md.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(md.contains("### ❌ pods"));
    }
}
