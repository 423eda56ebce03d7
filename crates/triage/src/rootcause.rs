//! Root-cause derivation.
//!
//! An ordered rule table inspecting the text of finished checklist findings.
//! The order is the policy: storage and network backend issues outrank TLS,
//! image-pull, instability, scheduling, node, quota, DNS, and probe signals,
//! with generic fallbacks last. First match wins.

use serde::Serialize;

use crate::namespace::HealthStatus;

/// Classification assigned by the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootCauseType {
    StorageNoDefaultStorageclass,
    StorageProvisionerBlockedByNetworkPolicy,
    StorageProvisionerUnreachable,
    StorageBindingIssues,
    ServiceNoBackends,
    NetworkPolicyBlock,
    RouteTlsFailure,
    ImagePullFailures,
    ApplicationInstability,
    ResourcePressure,
    NodeInstability,
    ResourceQuotaExceeded,
    DnsResolutionFailure,
    ProbeFailures,
    NamespaceHealthDegraded,
    Unknown,
}

/// Best-guess explanation of why the checked scope is unhealthy.
#[derive(Debug, Clone, Serialize)]
pub struct RootCause {
    #[serde(rename = "type")]
    pub kind: RootCauseType,
    pub summary: String,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub evidence: Vec<String>,
}

/// Aggregated facts the rule table inspects. Built once from the finished
/// checklist, never from raw resources.
#[derive(Debug, Clone, Default)]
pub struct RootCauseInput {
    /// Every finding string from every checklist item, in report order.
    pub findings: Vec<String>,
    pub pending_pvcs: usize,
    pub default_storage_class_present: bool,
    pub services_without_endpoints: usize,
    /// Whether any namespace-health check reported degraded or failing.
    pub namespace_degraded: bool,
    pub overall_status: HealthStatus,
}

const NETWORK_POLICY_KEYWORDS: &[&str] =
    &["networkpolicy", "network policy", "denied by policy"];
const PROVISIONER_KEYWORDS: &[&str] =
    &["failedmount", "failed to provision", "provisioner", "mountvolume"];
const TLS_KEYWORDS: &[&str] =
    &["x509", "certificate", "tls", "handshake", "unknown authority"];
const IMAGE_PULL_KEYWORDS: &[&str] =
    &["imagepullbackoff", "errimagepull", "failed to pull", "pull access denied"];
const INSTABILITY_KEYWORDS: &[&str] = &["crashloopbackoff", "oomkilled"];
const SCHEDULING_KEYWORDS: &[&str] =
    &["failedscheduling", "insufficient cpu", "insufficient memory", "insufficient"];
const NODE_KEYWORDS: &[&str] =
    &["nodenotready", "nodeunavailable", "node not ready", "memorypressure", "diskpressure"];
const QUOTA_KEYWORDS: &[&str] = &["exceeded quota", "quota exceeded", "resourcequota"];
const DNS_KEYWORDS: &[&str] = &["no such host", "dns", "name resolution", "nxdomain"];
const PROBE_KEYWORDS: &[&str] =
    &["liveness probe failed", "readiness probe failed", "probe failed", "unhealthy"];

const EVIDENCE_CAP: usize = 5;

fn findings_matching(input: &RootCauseInput, keywords: &[&str]) -> Vec<String> {
    input
        .findings
        .iter()
        .filter(|f| {
            let lower = f.to_lowercase();
            keywords.iter().any(|k| lower.contains(k))
        })
        .take(EVIDENCE_CAP)
        .cloned()
        .collect()
}

fn non_empty(evidence: Vec<String>) -> Option<Vec<String>> {
    if evidence.is_empty() {
        None
    } else {
        Some(evidence)
    }
}

struct Rule {
    kind: RootCauseType,
    confidence: f64,
    summary: &'static str,
    matches: fn(&RootCauseInput) -> Option<Vec<String>>,
}

/// The ordered rule table. Entries are evaluated top to bottom; reordering
/// changes behavior.
const RULES: &[Rule] = &[
    Rule {
        kind: RootCauseType::StorageNoDefaultStorageclass,
        confidence: 0.9,
        summary: "persistent volume claims cannot bind because no default storage class is configured",
        matches: |input| {
            if input.pending_pvcs > 0 && !input.default_storage_class_present {
                let mut evidence = vec![
                    format!("{} PVC(s) pending", input.pending_pvcs),
                    "no default storage class present".to_string(),
                ];
                evidence.extend(findings_matching(input, &["pvc", "storageclass", "pending"]));
                evidence.truncate(EVIDENCE_CAP);
                Some(evidence)
            } else {
                None
            }
        },
    },
    Rule {
        kind: RootCauseType::StorageProvisionerBlockedByNetworkPolicy,
        confidence: 0.85,
        summary: "storage provisioning appears blocked by a network policy",
        matches: |input| {
            if input.pending_pvcs > 0 {
                non_empty(findings_matching(input, NETWORK_POLICY_KEYWORDS))
            } else {
                None
            }
        },
    },
    Rule {
        kind: RootCauseType::StorageProvisionerUnreachable,
        confidence: 0.8,
        summary: "the storage provisioner is failing or unreachable",
        matches: |input| {
            if input.pending_pvcs > 0 {
                non_empty(findings_matching(input, PROVISIONER_KEYWORDS))
            } else {
                None
            }
        },
    },
    Rule {
        kind: RootCauseType::StorageBindingIssues,
        confidence: 0.6,
        summary: "persistent volume claims are not binding",
        matches: |input| {
            if input.pending_pvcs > 0 {
                Some(vec![format!("{} PVC(s) pending", input.pending_pvcs)])
            } else {
                None
            }
        },
    },
    Rule {
        kind: RootCauseType::ServiceNoBackends,
        confidence: 0.75,
        summary: "services exist but have no ready endpoints behind them",
        matches: |input| {
            if input.services_without_endpoints > 0 {
                let mut evidence =
                    vec![format!("{} service(s) without endpoints", input.services_without_endpoints)];
                evidence.extend(findings_matching(input, &["endpoint"]));
                evidence.truncate(EVIDENCE_CAP);
                Some(evidence)
            } else {
                None
            }
        },
    },
    Rule {
        kind: RootCauseType::NetworkPolicyBlock,
        confidence: 0.75,
        summary: "traffic appears to be denied by a network policy",
        matches: |input| non_empty(findings_matching(input, NETWORK_POLICY_KEYWORDS)),
    },
    Rule {
        kind: RootCauseType::RouteTlsFailure,
        confidence: 0.65,
        summary: "TLS or certificate errors are breaking connectivity",
        matches: |input| non_empty(findings_matching(input, TLS_KEYWORDS)),
    },
    Rule {
        kind: RootCauseType::ImagePullFailures,
        confidence: 0.7,
        summary: "workloads cannot pull their container images",
        matches: |input| non_empty(findings_matching(input, IMAGE_PULL_KEYWORDS)),
    },
    Rule {
        kind: RootCauseType::ApplicationInstability,
        confidence: 0.65,
        summary: "containers are crash-looping or being OOM-killed",
        matches: |input| non_empty(findings_matching(input, INSTABILITY_KEYWORDS)),
    },
    Rule {
        kind: RootCauseType::ResourcePressure,
        confidence: 0.7,
        summary: "pods cannot be scheduled due to insufficient cluster resources",
        matches: |input| non_empty(findings_matching(input, SCHEDULING_KEYWORDS)),
    },
    Rule {
        kind: RootCauseType::NodeInstability,
        confidence: 0.7,
        summary: "one or more nodes are not ready or under pressure",
        matches: |input| non_empty(findings_matching(input, NODE_KEYWORDS)),
    },
    Rule {
        kind: RootCauseType::ResourceQuotaExceeded,
        confidence: 0.7,
        summary: "a resource quota is exhausted or nearly exhausted",
        matches: |input| non_empty(findings_matching(input, QUOTA_KEYWORDS)),
    },
    Rule {
        kind: RootCauseType::DnsResolutionFailure,
        confidence: 0.65,
        summary: "DNS resolution is failing inside the cluster",
        matches: |input| non_empty(findings_matching(input, DNS_KEYWORDS)),
    },
    Rule {
        kind: RootCauseType::ProbeFailures,
        confidence: 0.6,
        summary: "liveness or readiness probes are failing",
        matches: |input| non_empty(findings_matching(input, PROBE_KEYWORDS)),
    },
    Rule {
        kind: RootCauseType::NamespaceHealthDegraded,
        confidence: 0.5,
        summary: "namespace health is degraded without a more specific signal",
        matches: |input| {
            if input.namespace_degraded {
                Some(vec!["namespace health check reported degraded or failing".to_string()])
            } else {
                None
            }
        },
    },
];

/// Derive the single best-guess root cause from aggregated findings.
///
/// Returns `None` only when the overall status is healthy and no rule fires.
pub fn derive_root_cause(input: &RootCauseInput) -> Option<RootCause> {
    for rule in RULES {
        if let Some(evidence) = (rule.matches)(input) {
            return Some(RootCause {
                kind: rule.kind,
                summary: rule.summary.to_string(),
                confidence: rule.confidence,
                evidence,
            });
        }
    }

    if input.overall_status == HealthStatus::Healthy {
        None
    } else {
        Some(RootCause {
            kind: RootCauseType::Unknown,
            summary: "the scope is unhealthy but no known failure pattern matched".to_string(),
            confidence: 0.3,
            evidence: input.findings.iter().take(EVIDENCE_CAP).cloned().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(findings: &[&str]) -> RootCauseInput {
        RootCauseInput {
            findings: findings.iter().map(ToString::to_string).collect(),
            default_storage_class_present: true,
            overall_status: HealthStatus::Degraded,
            ..RootCauseInput::default()
        }
    }

    #[test]
    fn pending_pvcs_without_default_storage_class() {
        let mut input = input(&["3 PVC(s) pending in namespace shop"]);
        input.pending_pvcs = 3;
        input.default_storage_class_present = false;
        let cause = derive_root_cause(&input).unwrap();
        assert_eq!(cause.kind, RootCauseType::StorageNoDefaultStorageclass);
        assert!((cause.confidence - 0.9).abs() < f64::EPSILON);
        assert!(cause.evidence.iter().any(|e| e.contains("3 PVC(s) pending")));
    }

    #[test]
    fn storage_outranks_image_pull_when_both_present() {
        let mut input = input(&[
            "pod shop-1 in ImagePullBackOff",
            "PVC data-0 pending: provisioner unreachable",
        ]);
        input.pending_pvcs = 1;
        let cause = derive_root_cause(&input).unwrap();
        assert_eq!(cause.kind, RootCauseType::StorageProvisionerUnreachable);
    }

    #[test]
    fn image_pull_fires_without_storage_signal() {
        let cause = derive_root_cause(&input(&["pod shop-1 in ImagePullBackOff"])).unwrap();
        assert_eq!(cause.kind, RootCauseType::ImagePullFailures);
        assert!((cause.confidence - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn services_without_endpoints_outrank_generic_network() {
        let mut input = input(&["service shop/api has no endpoints"]);
        input.services_without_endpoints = 1;
        let cause = derive_root_cause(&input).unwrap();
        assert_eq!(cause.kind, RootCauseType::ServiceNoBackends);
    }

    #[test]
    fn tls_keywords_match_case_insensitively() {
        let cause =
            derive_root_cause(&input(&["x509: certificate signed by unknown authority"])).unwrap();
        assert_eq!(cause.kind, RootCauseType::RouteTlsFailure);
    }

    #[test]
    fn quota_and_dns_rules_fire_in_order() {
        let cause = derive_root_cause(&input(&["pods forbidden: exceeded quota compute"])).unwrap();
        assert_eq!(cause.kind, RootCauseType::ResourceQuotaExceeded);

        let cause = derive_root_cause(&input(&["lookup api.internal: no such host"])).unwrap();
        assert_eq!(cause.kind, RootCauseType::DnsResolutionFailure);
    }

    #[test]
    fn degraded_namespace_is_the_weak_fallback() {
        let mut input = input(&["pods not fully ready"]);
        input.namespace_degraded = true;
        let cause = derive_root_cause(&input).unwrap();
        assert_eq!(cause.kind, RootCauseType::NamespaceHealthDegraded);
        assert!((cause.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unhealthy_without_signal_is_unknown() {
        let cause = derive_root_cause(&input(&["something odd happened"])).unwrap();
        assert_eq!(cause.kind, RootCauseType::Unknown);
        assert!((cause.confidence - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn healthy_scope_emits_no_root_cause() {
        let mut input = input(&[]);
        input.overall_status = HealthStatus::Healthy;
        assert!(derive_root_cause(&input).is_none());
    }

    #[test]
    fn default_input_is_healthy_and_silent() {
        let input = RootCauseInput::default();
        assert_eq!(input.overall_status, HealthStatus::Healthy);
        assert!(derive_root_cause(&input).is_none());
    }

    #[test]
    fn serializes_type_in_snake_case() {
        let cause = RootCause {
            kind: RootCauseType::StorageNoDefaultStorageclass,
            summary: String::new(),
            confidence: 0.9,
            evidence: Vec::new(),
        };
        let json = serde_json::to_value(&cause).unwrap();
        assert_eq!(json["type"], "storage_no_default_storageclass");
    }
}
