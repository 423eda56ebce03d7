//! Cluster-wide triage: namespace sweeps, prioritization, and the bounded
//! low-latency path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::StreamExt;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analyze::{analyze_nodes, NodeHealthAnalysis};
use crate::clock::Clock;
use crate::config::TriageConfig;
use crate::error::Result;
use crate::exec::{ClusterExec, ClusterResources};
use crate::namespace::{HealthStatus, NamespaceHealthChecker, NamespaceHealthResult};
use crate::score::{prioritize_namespaces, PrioritizationEntry, Scope, Strategy};

/// Namespaces inferred for bounded triage when no explicit list is given.
const INGRESS_NAMESPACE_PATTERN: &str = r"^(openshift-ingress(-operator)?|cert-manager)$";

/// Parameters of a cluster sweep.
#[derive(Debug, Clone)]
pub struct ClusterTriageRequest {
    pub scope: Scope,
    pub strategy: Strategy,
    /// Namespace guaranteed deep analysis regardless of score.
    pub focus: Option<String>,
    /// How many namespaces get full detail.
    pub max_detailed: usize,
    /// Explicit namespace list; non-empty implies bounded mode.
    pub namespaces: Vec<String>,
    /// Force the bounded path.
    pub bounded: bool,
    /// Wall-clock budget; set implies bounded mode.
    pub max_runtime: Option<Duration>,
    pub test_connectivity: bool,
}

impl Default for ClusterTriageRequest {
    fn default() -> Self {
        Self {
            scope: Scope::All,
            strategy: Strategy::Auto,
            focus: None,
            max_detailed: 3,
            namespaces: Vec::new(),
            bounded: false,
            max_runtime: None,
            test_connectivity: false,
        }
    }
}

impl ClusterTriageRequest {
    /// Bounded mode: explicit flag, an explicit namespace list, or a runtime
    /// budget.
    pub fn is_bounded(&self) -> bool {
        self.bounded || !self.namespaces.is_empty() || self.max_runtime.is_some()
    }
}

/// Result of a cluster sweep.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterOverview {
    pub scope: Scope,
    pub strategy: Strategy,
    pub status: HealthStatus,
    pub nodes: NodeHealthAnalysis,
    /// Every evaluated namespace, ranked by score.
    pub entries: Vec<PrioritizationEntry>,
    /// Full results for the namespaces selected for deep analysis.
    pub detailed: Vec<NamespaceHealthResult>,
    pub recommendations: Vec<String>,
    /// True when the runtime budget cut the sweep short.
    pub partial: bool,
    pub evaluated: usize,
    pub timestamp: String,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

/// Sweeps namespaces and ranks them for attention.
pub struct ClusterTriage {
    exec: Arc<dyn ClusterExec>,
    clock: Arc<dyn Clock>,
    config: TriageConfig,
    checker: NamespaceHealthChecker,
}

impl ClusterTriage {
    pub fn new(exec: Arc<dyn ClusterExec>, clock: Arc<dyn Clock>, config: TriageConfig) -> Self {
        let checker =
            NamespaceHealthChecker::new(Arc::clone(&exec), Arc::clone(&clock), config.clone());
        Self {
            exec,
            clock,
            config,
            checker,
        }
    }

    /// Run a sweep, taking the bounded path when the request asks for it.
    ///
    /// # Errors
    /// Fails only when the namespace listing itself cannot be fetched; all
    /// per-namespace errors are folded into entries with status `error`.
    pub async fn run(&self, request: &ClusterTriageRequest) -> Result<ClusterOverview> {
        if request.is_bounded() {
            self.run_bounded(request).await
        } else {
            self.run_full(request).await
        }
    }

    async fn run_full(&self, request: &ClusterTriageRequest) -> Result<ClusterOverview> {
        let started = Instant::now();
        let listing = self.exec.as_ref().get_namespaces().await?;
        let names: Vec<String> = listing
            .items
            .into_iter()
            .map(|ns| ns.metadata.name)
            .filter(|name| request.scope.contains(name))
            .collect();
        info!(count = names.len(), scope = ?request.scope, "starting cluster sweep");

        let nodes = match self.exec.as_ref().get_nodes().await {
            Ok(listing) => analyze_nodes(&listing),
            Err(err) => {
                debug!(error = %err, "node listing unavailable for overview");
                NodeHealthAnalysis::default()
            }
        };

        let checks = names
            .iter()
            .map(|name| self.checker.check(name, request.test_connectivity));
        let results: Vec<NamespaceHealthResult> = futures::stream::iter(checks)
            .buffered(self.config.max_concurrent_checks.max(1))
            .collect()
            .await;

        Ok(self.assemble(request, results, nodes, false, started))
    }

    /// Bounded path: no cluster-wide sweep. Evaluates only the explicit or
    /// inferred namespace set and stops once the budget is spent, returning
    /// partial results instead of failing.
    async fn run_bounded(&self, request: &ClusterTriageRequest) -> Result<ClusterOverview> {
        let started = Instant::now();
        let targets = if request.namespaces.is_empty() {
            self.infer_ingress_namespaces().await
        } else {
            request.namespaces.clone()
        };
        info!(count = targets.len(), "starting bounded triage");

        let budget = request.max_runtime.unwrap_or(self.config.max_check_time);
        let mut results = Vec::new();
        let mut partial = false;
        for name in &targets {
            if started.elapsed() > budget {
                warn!(
                    evaluated = results.len(),
                    remaining = targets.len() - results.len(),
                    "bounded triage budget exhausted"
                );
                partial = true;
                break;
            }
            results.push(self.checker.check(name, request.test_connectivity).await);
        }

        // Bounded mode skips the node sweep along with everything else
        // cluster-wide.
        Ok(self.assemble(request, results, NodeHealthAnalysis::default(), partial, started))
    }

    /// Candidate set for bounded triage with no explicit list: ingress and
    /// certificate plumbing, the usual suspects for connectivity incidents.
    async fn infer_ingress_namespaces(&self) -> Vec<String> {
        let pattern = match Regex::new(INGRESS_NAMESPACE_PATTERN) {
            Ok(pattern) => pattern,
            Err(_) => return Vec::new(),
        };
        match self.exec.as_ref().get_namespaces().await {
            Ok(listing) => listing
                .items
                .into_iter()
                .map(|ns| ns.metadata.name)
                .filter(|name| pattern.is_match(name))
                .collect(),
            Err(err) => {
                debug!(error = %err, "namespace inference failed, nothing to triage");
                Vec::new()
            }
        }
    }

    fn assemble(
        &self,
        request: &ClusterTriageRequest,
        results: Vec<NamespaceHealthResult>,
        nodes: NodeHealthAnalysis,
        partial: bool,
        started: Instant,
    ) -> ClusterOverview {
        let entries = prioritize_namespaces(
            &results,
            request.strategy,
            request.focus.as_deref(),
            request.max_detailed,
        );
        let detailed: Vec<NamespaceHealthResult> = entries
            .iter()
            .filter(|e| e.detailed)
            .filter_map(|e| results.iter().find(|r| r.namespace == e.name).cloned())
            .collect();

        let any_failing = results.iter().any(|r| {
            matches!(r.status, HealthStatus::Failing | HealthStatus::Error)
        });
        let any_degraded =
            results.iter().any(|r| r.status == HealthStatus::Degraded);
        let status = if any_failing || !nodes.not_ready.is_empty() {
            HealthStatus::Failing
        } else if any_degraded || !nodes.pressure.is_empty() {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let mut recommendations = Vec::new();
        if !nodes.not_ready.is_empty() {
            recommendations.push(format!(
                "investigate not-ready node(s): {}",
                nodes.not_ready.join(", ")
            ));
        }
        for entry in entries.iter().filter(|e| e.score > 0).take(3) {
            recommendations.push(format!(
                "investigate namespace {}: {}",
                entry.name,
                entry.reasons.join("; ")
            ));
        }
        if partial {
            recommendations.push(
                "re-run with a larger budget to cover the remaining namespaces".to_string(),
            );
        }

        ClusterOverview {
            scope: request.scope,
            strategy: request.strategy,
            status,
            nodes,
            evaluated: results.len(),
            entries,
            detailed,
            recommendations,
            partial,
            timestamp: self.clock.now().to_rfc3339(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_mode_triggers() {
        let mut request = ClusterTriageRequest::default();
        assert!(!request.is_bounded());
        request.bounded = true;
        assert!(request.is_bounded());

        let mut request = ClusterTriageRequest::default();
        request.namespaces = vec!["shop".to_string()];
        assert!(request.is_bounded());

        let mut request = ClusterTriageRequest::default();
        request.max_runtime = Some(Duration::from_secs(5));
        assert!(request.is_bounded());
    }

    #[test]
    fn ingress_pattern_matches_expected_namespaces() {
        let pattern = Regex::new(INGRESS_NAMESPACE_PATTERN).unwrap();
        assert!(pattern.is_match("openshift-ingress"));
        assert!(pattern.is_match("openshift-ingress-operator"));
        assert!(pattern.is_match("cert-manager"));
        assert!(!pattern.is_match("openshift-ingress-canary"));
        assert!(!pattern.is_match("shop"));
    }
}
