//! Namespace and pod prioritization scoring.
//!
//! Scoring decides which entities receive expensive deep analysis and which
//! get only a compact summary. The weight table is selected by strategy; the
//! algorithm itself is identical for namespaces and pods, with pod-level
//! signals substituted for namespace-level ones.

use serde::{Deserialize, Serialize};

use crate::namespace::{HealthStatus, NamespaceHealthResult};
use crate::resources::{List, Pod};

/// Flat boost for an explicitly focused entity, guaranteeing selection.
const FOCUS_BOOST: i64 = 100;

/// Restart counts above this contribute no additional score.
const RESTART_SCORE_CAP: i64 = 20;

/// Which namespaces a sweep considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    All,
    /// `kube-*` and `openshift-*` namespaces.
    System,
    /// Everything that is not a system namespace.
    User,
}

impl Scope {
    pub fn contains(self, namespace: &str) -> bool {
        let system = namespace.starts_with("kube-") || namespace.starts_with("openshift-");
        match self {
            Self::All => true,
            Self::System => system,
            Self::User => !system,
        }
    }
}

/// Scoring strategy, selecting a weight table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    #[default]
    Auto,
    Events,
    ResourcePressure,
    None,
}

/// Weight table applied to severity signals.
#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub crash: i64,
    pub image: i64,
    pub pending: i64,
    pub pvc: i64,
    pub events: i64,
    pub status: i64,
    pub suspicion: i64,
}

impl Weights {
    pub fn for_strategy(strategy: Strategy) -> Self {
        let base = Self {
            crash: 5,
            image: 4,
            pending: 3,
            pvc: 4,
            events: 1,
            status: 3,
            suspicion: 2,
        };
        match strategy {
            Strategy::Auto => base,
            Strategy::Events => Self {
                events: 5,
                crash: 3,
                pending: 2,
                ..base
            },
            Strategy::ResourcePressure => Self {
                pending: 5,
                pvc: 5,
                crash: 4,
                events: 1,
                ..base
            },
            Strategy::None => Self {
                crash: 0,
                image: 0,
                pending: 0,
                pvc: 0,
                events: 0,
                status: 0,
                suspicion: 0,
            },
        }
    }
}

/// One scored entity (namespace or pod), ephemeral per request.
#[derive(Debug, Clone, Serialize)]
pub struct PrioritizationEntry {
    pub name: String,
    pub status: HealthStatus,
    pub score: i64,
    pub reasons: Vec<String>,
    pub summary: String,
    /// Whether this entity was selected for deep analysis.
    pub detailed: bool,
}

fn signal(count: usize, weight: i64, label: &str, reasons: &mut Vec<String>) -> i64 {
    if count == 0 {
        return 0;
    }
    reasons.push(format!("{count} {label}"));
    count as i64 * weight
}

/// Score a finished namespace health result under the given weights.
pub fn score_namespace(result: &NamespaceHealthResult, weights: &Weights) -> (i64, Vec<String>) {
    let mut reasons = Vec::new();
    let mut score = 0;
    score += signal(result.pods.crashloops.len(), weights.crash, "crashlooping pod(s)", &mut reasons);
    score += signal(
        result.pods.image_pull_errors.len(),
        weights.image,
        "image pull failure(s)",
        &mut reasons,
    );
    score += signal(result.pods.pending.len(), weights.pending, "pending pod(s)", &mut reasons);
    score += signal(result.pvcs.errors.len(), weights.pvc, "PVC issue(s)", &mut reasons);
    score += signal(
        result.critical_events.len(),
        weights.events,
        "critical event(s)",
        &mut reasons,
    );
    if result.status != HealthStatus::Healthy {
        reasons.push(format!("status {}", result.status.as_str()));
        score += weights.status;
    }
    score += signal(result.suspicions.len(), weights.suspicion, "suspicion(s)", &mut reasons);
    (score, reasons)
}

/// Score a single pod with pod-level signals.
pub fn score_pod(pod: &Pod, weights: &Weights) -> (i64, Vec<String>) {
    let mut reasons = Vec::new();
    let mut score = 0;

    let mut crash = false;
    let mut image = false;
    let mut oom = false;
    let mut restarts: i64 = 0;
    for container in &pod.status.container_statuses {
        restarts += container.restart_count;
        if let Some(waiting) = &container.state.waiting {
            match waiting.reason.as_str() {
                "CrashLoopBackOff" => crash = true,
                "ImagePullBackOff" | "ErrImagePull" => image = true,
                _ => {}
            }
        }
        if let Some(terminated) = &container.state.terminated {
            if terminated.reason == "OOMKilled" {
                oom = true;
            }
        }
    }

    if crash {
        reasons.push("crashlooping".to_string());
        score += weights.crash;
    }
    if image {
        reasons.push("image pull failure".to_string());
        score += weights.image;
    }
    if pod.status.phase == "Pending" {
        reasons.push("pending".to_string());
        score += weights.pending;
    }
    if oom {
        reasons.push("OOM killed".to_string());
        score += weights.pvc;
    }
    let capped = restarts.min(RESTART_SCORE_CAP);
    if capped > 0 {
        reasons.push(format!("{restarts} restart(s)"));
        score += capped * weights.events;
    }
    if pod.status.phase != "Running" {
        reasons.push(format!("phase {}", pod.status.phase));
        score += weights.status;
    }
    (score, reasons)
}

/// Rank namespace results, marking the top `max_detailed` (plus any focused
/// namespace) for deep analysis. Sorting is descending by score with a name
/// tiebreak so output is deterministic.
pub fn prioritize_namespaces(
    results: &[NamespaceHealthResult],
    strategy: Strategy,
    focus: Option<&str>,
    max_detailed: usize,
) -> Vec<PrioritizationEntry> {
    let weights = Weights::for_strategy(strategy);
    let mut entries: Vec<PrioritizationEntry> = results
        .iter()
        .map(|result| {
            let (mut score, mut reasons) = score_namespace(result, &weights);
            if focus == Some(result.namespace.as_str()) {
                score += FOCUS_BOOST;
                reasons.push("explicitly focused".to_string());
            }
            PrioritizationEntry {
                name: result.namespace.clone(),
                status: result.status,
                score,
                reasons,
                summary: result.summary.clone(),
                detailed: false,
            }
        })
        .collect();

    rank(&mut entries, focus, max_detailed);
    entries
}

/// Rank pods within one namespace the same way.
pub fn prioritize_pods(
    pods: &List<Pod>,
    strategy: Strategy,
    focus: Option<&str>,
    max_detailed: usize,
) -> Vec<PrioritizationEntry> {
    let weights = Weights::for_strategy(strategy);
    let mut entries: Vec<PrioritizationEntry> = pods
        .items
        .iter()
        .map(|pod| {
            let (mut score, mut reasons) = score_pod(pod, &weights);
            if focus == Some(pod.metadata.name.as_str()) {
                score += FOCUS_BOOST;
                reasons.push("explicitly focused".to_string());
            }
            let status = if pod.status.phase == "Running" {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            };
            PrioritizationEntry {
                name: pod.metadata.name.clone(),
                status,
                score,
                reasons,
                summary: format!("pod {} in phase {}", pod.metadata.name, pod.status.phase),
                detailed: false,
            }
        })
        .collect();

    rank(&mut entries, focus, max_detailed);
    entries
}

fn rank(entries: &mut [PrioritizationEntry], focus: Option<&str>, max_detailed: usize) {
    entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.detailed = index < max_detailed || focus == Some(entry.name.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{PodHealthSummary, PvcHealthSummary, RouteHealthSummary};

    fn result(namespace: &str, status: HealthStatus) -> NamespaceHealthResult {
        NamespaceHealthResult {
            namespace: namespace.to_string(),
            status,
            pods: PodHealthSummary::default(),
            pvcs: PvcHealthSummary::default(),
            routes: RouteHealthSummary::default(),
            critical_events: Vec::new(),
            scale_down: None,
            suspicions: Vec::new(),
            summary: String::new(),
            timestamp: String::new(),
            duration_ms: 0,
        }
    }

    #[test]
    fn scope_partitions_by_prefix() {
        assert!(Scope::System.contains("kube-system"));
        assert!(Scope::System.contains("openshift-ingress"));
        assert!(!Scope::System.contains("shop"));
        assert!(Scope::User.contains("shop"));
        assert!(!Scope::User.contains("kube-system"));
        assert!(Scope::All.contains("anything"));
    }

    #[test]
    fn events_strategy_reorders_against_resource_pressure() {
        let mut eventful = result("eventful", HealthStatus::Degraded);
        eventful.critical_events = vec![String::from("e"); 5];
        let mut pressured = result("pressured", HealthStatus::Degraded);
        pressured.pods.pending = vec!["p-1".to_string(), "p-2".to_string()];
        pressured.pvcs.errors = vec!["claim: pending".to_string()];

        let results = vec![eventful, pressured];
        let by_events = prioritize_namespaces(&results, Strategy::Events, None, 1);
        assert_eq!(by_events[0].name, "eventful");
        assert!(by_events[0].detailed);
        assert!(!by_events[1].detailed);

        let by_pressure = prioritize_namespaces(&results, Strategy::ResourcePressure, None, 1);
        assert_eq!(by_pressure[0].name, "pressured");
    }

    #[test]
    fn focused_namespace_always_gets_detail() {
        let mut busy = result("busy", HealthStatus::Failing);
        busy.pods.crashloops = vec!["a".to_string(), "b".to_string()];
        let quiet = result("quiet", HealthStatus::Healthy);

        let entries = prioritize_namespaces(&[busy, quiet], Strategy::Auto, Some("quiet"), 1);
        let focused = entries.iter().find(|e| e.name == "quiet").unwrap();
        assert!(focused.detailed);
        assert!(focused.score >= 100);
    }

    #[test]
    fn strategy_none_zeroes_all_scores() {
        let mut busy = result("busy", HealthStatus::Failing);
        busy.pods.crashloops = vec!["a".to_string()];
        busy.critical_events = vec!["e".to_string()];
        let entries = prioritize_namespaces(&[busy], Strategy::None, None, 0);
        assert_eq!(entries[0].score, 0);
    }

    #[test]
    fn score_is_monotonic_in_crashloops() {
        for strategy in [Strategy::Auto, Strategy::Events, Strategy::ResourcePressure] {
            let weights = Weights::for_strategy(strategy);
            let mut base = result("ns", HealthStatus::Degraded);
            base.pods.crashloops = vec!["a".to_string()];
            let (low, _) = score_namespace(&base, &weights);
            base.pods.crashloops.push("b".to_string());
            let (high, _) = score_namespace(&base, &weights);
            assert!(high >= low, "strategy {strategy:?} not monotonic");
        }
    }

    #[test]
    fn pod_restart_contribution_is_capped() {
        let weights = Weights::for_strategy(Strategy::Auto);
        let pod: Pod = serde_json::from_value(serde_json::json!({
            "metadata": { "name": "flappy" },
            "status": { "phase": "Running", "containerStatuses": [
                { "name": "app", "restartCount": 50 } ] }
        }))
        .unwrap();
        let (score, reasons) = score_pod(&pod, &weights);
        assert_eq!(score, 20 * weights.events);
        assert!(reasons.iter().any(|r| r.contains("50 restart")));
    }
}
