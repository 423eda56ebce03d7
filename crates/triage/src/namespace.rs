//! Namespace health checking.
//!
//! Pulls the resource listings for one namespace, runs them through the
//! analyzers and the scale-down classifier, and folds everything into a
//! single immutable [`NamespaceHealthResult`].

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::analyze::{
    analyze_pods, analyze_pvcs, analyze_routes, critical_events, PodHealthSummary,
    PvcHealthSummary, RouteHealthSummary,
};
use crate::clock::Clock;
use crate::config::TriageConfig;
use crate::error::{Result, TriageError};
use crate::exec::{ClusterExec, ClusterResources};
use crate::scaledown::{classify_scale_down, ScaleDownAnalysis, ScaleDownVerdict};
use crate::suspicion::generate_suspicions;

/// Overall health of a namespace, a check, or a whole report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[default]
    Healthy,
    Degraded,
    Failing,
    /// The entity could not be probed at all (access denied, missing).
    Error,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Failing => "failing",
            Self::Error => "error",
        }
    }
}

/// Immutable result of one namespace health check.
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceHealthResult {
    pub namespace: String,
    pub status: HealthStatus,
    pub pods: PodHealthSummary,
    pub pvcs: PvcHealthSummary,
    pub routes: RouteHealthSummary,
    #[serde(rename = "criticalEvents")]
    pub critical_events: Vec<String>,
    #[serde(rename = "scaleDown", skip_serializing_if = "Option::is_none")]
    pub scale_down: Option<ScaleDownAnalysis>,
    pub suspicions: Vec<String>,
    pub summary: String,
    pub timestamp: String,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

/// Decide the namespace status from the analyzer outputs.
///
/// An empty namespace (no pods, no PVCs) with no scale-down evidence is
/// failing, not healthy: something should be running there. An intentional
/// scale-down caps out at degraded.
fn determine_status(
    pods: &PodHealthSummary,
    pvcs: &PvcHealthSummary,
    routes: &RouteHealthSummary,
    scale_down: &ScaleDownAnalysis,
) -> HealthStatus {
    if pods.total == 0 && pvcs.total == 0 {
        return if scale_down.is_scale_down {
            HealthStatus::Degraded
        } else {
            HealthStatus::Failing
        };
    }

    if scale_down.verdict == ScaleDownVerdict::IntentionalScaleDown {
        return HealthStatus::Degraded;
    }

    if !pods.crashloops.is_empty() || !pods.image_pull_errors.is_empty() {
        return HealthStatus::Failing;
    }
    if pods.total > 0 && pods.ready == 0 {
        return HealthStatus::Failing;
    }

    let degraded = pods.ready < pods.total
        || !pods.pending.is_empty()
        || !pods.oom_killed.is_empty()
        || pvcs.pending > 0
        || pvcs.failed > 0
        || routes.probe.as_ref().is_some_and(|p| !p.reachable());
    if degraded {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

/// Checks the health of individual namespaces.
pub struct NamespaceHealthChecker {
    exec: Arc<dyn ClusterExec>,
    clock: Arc<dyn Clock>,
    http: reqwest::Client,
    config: TriageConfig,
}

impl NamespaceHealthChecker {
    pub fn new(exec: Arc<dyn ClusterExec>, clock: Arc<dyn Clock>, config: TriageConfig) -> Self {
        Self {
            exec,
            clock,
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Check one namespace, never failing: any error short-circuits into a
    /// failing result whose summary carries the error text.
    pub async fn check(&self, namespace: &str, test_connectivity: bool) -> NamespaceHealthResult {
        match self.try_check(namespace, test_connectivity).await {
            Ok(result) => result,
            Err(err) => {
                debug!(namespace, error = %err, "namespace check short-circuited");
                self.error_result(namespace, &err)
            }
        }
    }

    /// Fallible inner check.
    ///
    /// # Errors
    /// Returns [`TriageError::NamespaceNotFound`] when the namespace is
    /// missing or inaccessible, or the underlying executor/parse error when a
    /// listing cannot be fetched.
    pub async fn try_check(
        &self,
        namespace: &str,
        test_connectivity: bool,
    ) -> Result<NamespaceHealthResult> {
        let started = Instant::now();
        let exec = self.exec.as_ref();

        if !exec.namespace_exists(namespace).await {
            return Err(TriageError::NamespaceNotFound(namespace.to_string()));
        }

        let (pods, events, pvcs, routes, deployments) = tokio::join!(
            exec.get_pods(namespace),
            exec.get_events(Some(namespace)),
            exec.get_pvcs(Some(namespace)),
            exec.get_routes(Some(namespace)),
            exec.get_deployments(namespace),
        );
        let pod_list = pods?;
        let event_list = events?;
        let pvc_list = pvcs?;
        // Routes are an OpenShift extension; a vanilla cluster reports an
        // unknown resource kind, which reads as "no routes".
        let route_list = routes.unwrap_or_default();
        let deployment_list = deployments.unwrap_or_default();

        let now = self.clock.now();
        let pod_summary = analyze_pods(&pod_list, now);
        let pvc_summary = analyze_pvcs(&pvc_list);
        let route_summary = analyze_routes(
            &route_list,
            &self.http,
            test_connectivity,
            self.config.probe_timeout,
        )
        .await;
        let events_summary = critical_events(&event_list, now);
        let scale_down =
            classify_scale_down(&deployment_list, &event_list, pod_list.items.len(), now);

        let suspicions = generate_suspicions(
            &pod_summary,
            &pvc_summary,
            &route_summary,
            &events_summary,
            &scale_down,
        );
        let status = determine_status(&pod_summary, &pvc_summary, &route_summary, &scale_down);

        let summary = format!(
            "namespace {namespace} is {}: {}/{} pods ready, {} suspicion(s)",
            status.as_str(),
            pod_summary.ready,
            pod_summary.total,
            suspicions.len()
        );
        info!(namespace, status = status.as_str(), "namespace health check complete");

        Ok(NamespaceHealthResult {
            namespace: namespace.to_string(),
            status,
            pods: pod_summary,
            pvcs: pvc_summary,
            routes: route_summary,
            critical_events: events_summary,
            scale_down: Some(scale_down),
            suspicions,
            summary,
            timestamp: now.to_rfc3339(),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn error_result(&self, namespace: &str, err: &TriageError) -> NamespaceHealthResult {
        let status = match err {
            TriageError::NamespaceNotFound(_) => HealthStatus::Failing,
            _ => HealthStatus::Error,
        };
        NamespaceHealthResult {
            namespace: namespace.to_string(),
            status,
            pods: PodHealthSummary::default(),
            pvcs: PvcHealthSummary::default(),
            routes: RouteHealthSummary::default(),
            critical_events: Vec::new(),
            scale_down: None,
            suspicions: Vec::new(),
            summary: format!("namespace {namespace} check failed: {err}"),
            timestamp: self.clock.now().to_rfc3339(),
            duration_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaledown::DeploymentCounts;

    fn scale_down(verdict: ScaleDownVerdict, is_scale_down: bool) -> ScaleDownAnalysis {
        ScaleDownAnalysis {
            is_scale_down,
            evidence: Vec::new(),
            deployments: DeploymentCounts::default(),
            scale_down_events: Vec::new(),
            verdict,
        }
    }

    #[test]
    fn empty_namespace_without_evidence_is_failing() {
        let status = determine_status(
            &PodHealthSummary::default(),
            &PvcHealthSummary::default(),
            &RouteHealthSummary::default(),
            &scale_down(ScaleDownVerdict::ResourcePressure, false),
        );
        assert_eq!(status, HealthStatus::Failing);
    }

    #[test]
    fn intentional_scale_down_is_degraded_not_failing() {
        let status = determine_status(
            &PodHealthSummary::default(),
            &PvcHealthSummary::default(),
            &RouteHealthSummary::default(),
            &scale_down(ScaleDownVerdict::IntentionalScaleDown, true),
        );
        assert_eq!(status, HealthStatus::Degraded);
    }

    #[test]
    fn crashloops_force_failing() {
        let pods = PodHealthSummary {
            ready: 2,
            total: 3,
            crashloops: vec!["web-1".to_string()],
            ..PodHealthSummary::default()
        };
        let status = determine_status(
            &pods,
            &PvcHealthSummary::default(),
            &RouteHealthSummary::default(),
            &scale_down(ScaleDownVerdict::Unknown, false),
        );
        assert_eq!(status, HealthStatus::Failing);
    }

    #[test]
    fn partial_readiness_is_degraded() {
        let pods = PodHealthSummary {
            ready: 2,
            total: 3,
            ..PodHealthSummary::default()
        };
        let status = determine_status(
            &pods,
            &PvcHealthSummary::default(),
            &RouteHealthSummary::default(),
            &scale_down(ScaleDownVerdict::Unknown, false),
        );
        assert_eq!(status, HealthStatus::Degraded);
    }

    #[test]
    fn all_ready_is_healthy() {
        let pods = PodHealthSummary {
            ready: 3,
            total: 3,
            ..PodHealthSummary::default()
        };
        let status = determine_status(
            &pods,
            &PvcHealthSummary::default(),
            &RouteHealthSummary::default(),
            &scale_down(ScaleDownVerdict::Unknown, false),
        );
        assert_eq!(status, HealthStatus::Healthy);
    }
}
