//! Checklist orchestration.
//!
//! Runs the fixed diagnostic sequence in four phases, with bounded
//! concurrency inside a phase and a single overall timeout around the whole
//! run. Every check is fault-isolated: an error becomes a fail-status item,
//! never an aborted run.

use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use futures::stream::StreamExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analyze::{analyze_constraints, analyze_nodes, analyze_pvcs, analyze_recent_events};
use crate::clock::Clock;
use crate::config::TriageConfig;
use crate::exec::{ClusterExec, ClusterResources};
use crate::memory::{ExecutionRecord, MemorySink};
use crate::namespace::{HealthStatus, NamespaceHealthChecker};
use crate::report::{
    finalize, render_markdown, ChecklistItem, CheckStatus, RcaChecklistResult, Severity,
};
use crate::rootcause::{derive_root_cause, RootCauseInput};

/// System namespaces swept when no target namespace is given.
const CRITICAL_NAMESPACES: &[&str] = &[
    "openshift-apiserver",
    "openshift-etcd",
    "openshift-kube-apiserver",
    "kube-system",
];

/// Parameters of one checklist run.
#[derive(Debug, Clone, Default)]
pub struct ChecklistRequest {
    /// Target namespace; when absent, critical system namespaces are swept.
    pub namespace: Option<String>,
    /// Run the Phase 4 resource-constraint deep check.
    pub deep_analysis: bool,
    /// Probe route backends during namespace checks.
    pub test_connectivity: bool,
    /// Attach a markdown rendering to the result.
    pub include_markdown: bool,
    /// Overrides the configured overall budget.
    pub max_check_time: Option<std::time::Duration>,
    pub session_id: Option<String>,
}

/// Mutable state of one run: items append in dispatch order, facts feed
/// root-cause derivation afterwards.
#[derive(Default)]
struct RunState {
    items: Vec<ChecklistItem>,
    pending_pvcs: usize,
    default_storage_class_present: Option<bool>,
    services_without_endpoints: usize,
    namespace_degraded: bool,
    symptoms: Vec<String>,
    affected_resources: Vec<String>,
}

/// What one check contributes to the run.
#[derive(Default)]
struct CheckOutcome {
    item: Option<ChecklistItem>,
    pending_pvcs: usize,
    default_storage_class_present: Option<bool>,
    services_without_endpoints: usize,
    namespace_degraded: bool,
    symptoms: Vec<String>,
    affected_resources: Vec<String>,
}

impl CheckOutcome {
    fn from_item(item: ChecklistItem) -> Self {
        Self {
            item: Some(item),
            ..Self::default()
        }
    }
}

impl RunState {
    fn merge(&mut self, outcome: CheckOutcome) {
        if let Some(item) = outcome.item {
            self.items.push(item);
        }
        self.pending_pvcs += outcome.pending_pvcs;
        if outcome.default_storage_class_present.is_some() {
            self.default_storage_class_present = outcome.default_storage_class_present;
        }
        self.services_without_endpoints += outcome.services_without_endpoints;
        self.namespace_degraded |= outcome.namespace_degraded;
        self.symptoms.extend(outcome.symptoms);
        self.affected_resources.extend(outcome.affected_resources);
    }
}

/// Runs the diagnostic checklist against a cluster.
pub struct ChecklistEngine {
    exec: Arc<dyn ClusterExec>,
    clock: Arc<dyn Clock>,
    config: TriageConfig,
    memory: Arc<dyn MemorySink>,
    checker: NamespaceHealthChecker,
}

impl ChecklistEngine {
    pub fn new(
        exec: Arc<dyn ClusterExec>,
        clock: Arc<dyn Clock>,
        config: TriageConfig,
        memory: Arc<dyn MemorySink>,
    ) -> Self {
        let checker =
            NamespaceHealthChecker::new(Arc::clone(&exec), Arc::clone(&clock), config.clone());
        Self {
            exec,
            clock,
            config,
            memory,
            checker,
        }
    }

    /// Execute the full checklist. Always returns a well-formed result; the
    /// only run-level failure mode is the overall timeout.
    pub async fn run(&self, request: &ChecklistRequest) -> RcaChecklistResult {
        let started = Instant::now();
        let budget = request.max_check_time.unwrap_or(self.config.max_check_time);
        let report_id = format!("rca-{}", Uuid::new_v4());
        info!(%report_id, namespace = ?request.namespace, "starting checklist run");

        let state = Mutex::new(RunState::default());
        let timed_out = tokio::time::timeout(budget, self.run_phases(request, &state))
            .await
            .is_err();

        // The phase future is dropped by now, so the lock is free.
        let run_state = state.into_inner();
        let mut result = RcaChecklistResult::new(
            report_id,
            request.namespace.clone(),
            self.clock.now().to_rfc3339(),
        );
        result.checks_performed = run_state.items;
        result.duration_ms = started.elapsed().as_millis() as u64;

        if timed_out {
            warn!(budget_ms = budget.as_millis() as u64, "checklist run timed out");
            result.overall_status = HealthStatus::Failing;
            result.critical_issues.push(format!(
                "checklist execution timed out after {}ms; partial results only",
                result.duration_ms
            ));
        }

        finalize(&mut result);

        let input = RootCauseInput {
            findings: result
                .checks_performed
                .iter()
                .flat_map(|i| i.findings.iter().cloned())
                .collect(),
            pending_pvcs: run_state.pending_pvcs,
            default_storage_class_present: run_state
                .default_storage_class_present
                .unwrap_or(true),
            services_without_endpoints: run_state.services_without_endpoints,
            namespace_degraded: run_state.namespace_degraded,
            overall_status: result.overall_status,
        };
        result.root_cause = derive_root_cause(&input);

        result.evidence.symptoms = run_state.symptoms;
        result.evidence.affected_resources = run_state.affected_resources;
        result.evidence.diagnostic_steps = result
            .checks_performed
            .iter()
            .map(|i| format!("checked {}", i.name))
            .collect();

        if request.include_markdown {
            result.markdown = Some(render_markdown(&result));
        }

        self.notify_memory(request, &result).await;
        info!(
            status = result.overall_status.as_str(),
            checks = result.summary.total_checks,
            "checklist run complete"
        );
        result
    }

    async fn run_phases(&self, request: &ChecklistRequest, state: &Mutex<RunState>) {
        // Phase 1: cluster reachability and node health.
        self.run_batch(
            vec![
                Box::pin(self.check_cluster_reachability()),
                Box::pin(self.check_node_health()),
            ],
            state,
        )
        .await;

        // Phase 2: target namespace, or the critical system sweep.
        match &request.namespace {
            Some(namespace) => {
                let outcome = self
                    .check_namespace_health(namespace, request.test_connectivity)
                    .await;
                state.lock().await.merge(outcome);
            }
            None => {
                for namespace in CRITICAL_NAMESPACES {
                    let outcome = self.check_namespace_health(namespace, false).await;
                    state.lock().await.merge(outcome);
                }
            }
        }

        // Phase 3: storage, network, events.
        let scope = request.namespace.as_deref();
        self.run_batch(
            vec![
                Box::pin(self.check_storage(scope)),
                Box::pin(self.check_network(scope)),
                Box::pin(self.check_events(scope)),
            ],
            state,
        )
        .await;

        // Phase 4: deep resource-constraint check, on request only.
        if request.deep_analysis {
            let outcome = self.check_resource_constraints(scope).await;
            state.lock().await.merge(outcome);
        }
    }

    /// Run one wave-barriered batch. `buffered` keeps output in dispatch
    /// order regardless of completion order, so reports are ordering-stable.
    async fn run_batch(
        &self,
        checks: Vec<BoxFuture<'_, CheckOutcome>>,
        state: &Mutex<RunState>,
    ) {
        let cap = self.config.max_concurrent_checks.max(1);
        let outcomes: Vec<CheckOutcome> =
            futures::stream::iter(checks).buffered(cap).collect().await;
        let mut state = state.lock().await;
        for outcome in outcomes {
            state.merge(outcome);
        }
    }

    async fn check_cluster_reachability(&self) -> CheckOutcome {
        let started = Instant::now();
        let name = "cluster reachability";
        let mut item = match self.exec.as_ref().get_namespaces().await {
            Ok(namespaces) => {
                let mut item = ChecklistItem::new(name);
                item.findings.push(format!(
                    "cluster API reachable, {} namespace(s) visible",
                    namespaces.items.len()
                ));
                item
            }
            Err(err) => {
                let mut item = ChecklistItem::failed(name, &err.to_string());
                item.severity = Severity::Critical;
                item.recommendations =
                    vec!["verify kubeconfig and API server availability".to_string()];
                item
            }
        };
        item.duration_ms = started.elapsed().as_millis() as u64;
        CheckOutcome::from_item(item)
    }

    async fn check_node_health(&self) -> CheckOutcome {
        let started = Instant::now();
        let name = "node health";
        let mut outcome = CheckOutcome::default();
        let mut item = match self.exec.as_ref().get_nodes().await {
            Ok(nodes) => {
                let analysis = analyze_nodes(&nodes);
                let mut item = ChecklistItem::new(name);
                if analysis.not_ready.is_empty() && analysis.pressure.is_empty() {
                    item.findings
                        .push(format!("{}/{} nodes ready", analysis.ready, analysis.total));
                } else {
                    for node in &analysis.not_ready {
                        item.findings.push(format!("node {node} is not ready (NodeNotReady)"));
                        outcome.affected_resources.push(format!("node/{node}"));
                    }
                    for pressure in &analysis.pressure {
                        item.findings.push(format!("node pressure: {pressure}"));
                    }
                    item.status = if analysis.not_ready.is_empty() {
                        CheckStatus::Warning
                    } else {
                        CheckStatus::Fail
                    };
                    item.severity = if analysis.not_ready.is_empty() {
                        Severity::Medium
                    } else {
                        Severity::Critical
                    };
                    item.recommendations
                        .push("inspect affected nodes and their kubelet logs".to_string());
                }
                item
            }
            Err(err) => ChecklistItem::failed(name, &err.to_string()),
        };
        item.duration_ms = started.elapsed().as_millis() as u64;
        outcome.item = Some(item);
        outcome
    }

    async fn check_namespace_health(
        &self,
        namespace: &str,
        test_connectivity: bool,
    ) -> CheckOutcome {
        let name = format!("namespace health: {namespace}");
        let result = self.checker.check(namespace, test_connectivity).await;

        // Pending-PVC facts come from the storage check, which sees the
        // authoritative listing; counting them here too would double them.
        let mut outcome = CheckOutcome {
            namespace_degraded: result.status != HealthStatus::Healthy,
            symptoms: result.suspicions.clone(),
            ..CheckOutcome::default()
        };
        for pod in result
            .pods
            .crashloops
            .iter()
            .chain(&result.pods.image_pull_errors)
            .chain(&result.pods.pending)
        {
            outcome.affected_resources.push(format!("{namespace}/pod/{pod}"));
        }

        let mut item = ChecklistItem::new(name);
        item.duration_ms = result.duration_ms;
        item.findings.push(result.summary.clone());
        item.findings.extend(result.suspicions.iter().cloned());
        match result.status {
            HealthStatus::Healthy => {}
            HealthStatus::Degraded => {
                item.status = CheckStatus::Warning;
                item.severity = Severity::Medium;
                item.recommendations
                    .push(format!("review workloads in namespace {namespace}"));
            }
            HealthStatus::Failing | HealthStatus::Error => {
                item.status = CheckStatus::Fail;
                item.severity = Severity::High;
                item.recommendations.push(format!(
                    "investigate failing workloads in namespace {namespace}"
                ));
            }
        }
        outcome.item = Some(item);
        outcome
    }

    async fn check_storage(&self, namespace: Option<&str>) -> CheckOutcome {
        let started = Instant::now();
        let name = "storage health";
        let exec = self.exec.as_ref();
        let (pvcs, classes) = tokio::join!(exec.get_pvcs(namespace), exec.get_storage_classes());

        let mut outcome = CheckOutcome::default();
        let mut item = match pvcs {
            Ok(pvc_list) => {
                let summary = analyze_pvcs(&pvc_list);
                let has_default = classes
                    .map(|list| list.items.iter().any(crate::resources::StorageClass::is_default))
                    .unwrap_or(false);
                outcome.pending_pvcs = summary.pending;
                outcome.default_storage_class_present = Some(has_default);

                let mut item = ChecklistItem::new(name);
                if summary.pending == 0 && summary.failed == 0 {
                    item.findings
                        .push(format!("{}/{} PVC(s) bound", summary.bound, summary.total));
                } else {
                    item.findings.push(format!(
                        "{} of {} PVC(s) not bound",
                        summary.pending + summary.failed,
                        summary.total
                    ));
                    item.findings.extend(summary.errors.iter().cloned());
                    if !has_default {
                        item.findings.push("no default storage class present".to_string());
                        item.status = CheckStatus::Fail;
                        item.severity = Severity::High;
                        item.recommendations
                            .push("configure a default storage class or set storageClassName explicitly".to_string());
                    } else {
                        item.status = CheckStatus::Warning;
                        item.severity = Severity::Medium;
                        item.recommendations
                            .push("check the storage provisioner for the pending claims".to_string());
                    }
                }
                item
            }
            Err(err) => ChecklistItem::failed(name, &err.to_string()),
        };
        item.duration_ms = started.elapsed().as_millis() as u64;
        outcome.item = Some(item);
        outcome
    }

    async fn check_network(&self, namespace: Option<&str>) -> CheckOutcome {
        let started = Instant::now();
        let name = "network health";
        let exec = self.exec.as_ref();
        let (services, endpoints) =
            tokio::join!(exec.get_services(namespace), exec.get_endpoints(namespace));

        let mut outcome = CheckOutcome::default();
        let mut item = match (services, endpoints) {
            (Ok(services), Ok(endpoints)) => {
                let analysis = crate::analyze::analyze_network(&services, &endpoints);
                outcome.services_without_endpoints = analysis.services_without_endpoints.len();

                let mut item = ChecklistItem::new(name);
                if analysis.services_without_endpoints.is_empty() {
                    item.findings.push(format!(
                        "{} service(s) checked, all have endpoints",
                        analysis.services
                    ));
                } else {
                    for service in &analysis.services_without_endpoints {
                        item.findings.push(format!("service {service} has no endpoints"));
                        outcome.affected_resources.push(format!("service/{service}"));
                    }
                    item.status = CheckStatus::Warning;
                    item.severity = Severity::High;
                    item.recommendations.push(
                        "check selectors and pod readiness behind the listed services".to_string(),
                    );
                }
                item
            }
            (Err(err), _) | (_, Err(err)) => ChecklistItem::failed(name, &err.to_string()),
        };
        item.duration_ms = started.elapsed().as_millis() as u64;
        outcome.item = Some(item);
        outcome
    }

    async fn check_events(&self, namespace: Option<&str>) -> CheckOutcome {
        let started = Instant::now();
        let name = "recent events";
        let mut item = match self.exec.as_ref().get_events(namespace).await {
            Ok(events) => {
                let analysis =
                    analyze_recent_events(&events, self.clock.now(), chrono::Duration::hours(1));
                let mut item = ChecklistItem::new(name);
                item.findings.push(format!(
                    "{} event(s) in the last hour, {} warning(s)",
                    analysis.total, analysis.warnings
                ));
                for (reason, count) in &analysis.patterns {
                    item.findings.push(format!("recurring warning: {reason} (x{count})"));
                }
                if analysis.warnings > 0 {
                    item.status = CheckStatus::Warning;
                    item.severity = Severity::Medium;
                    item.recommendations
                        .push("correlate recurring warning reasons with workload changes".to_string());
                }
                item
            }
            Err(err) => ChecklistItem::failed(name, &err.to_string()),
        };
        item.duration_ms = started.elapsed().as_millis() as u64;
        CheckOutcome::from_item(item)
    }

    async fn check_resource_constraints(&self, namespace: Option<&str>) -> CheckOutcome {
        let started = Instant::now();
        let name = "resource constraints";
        let exec = self.exec.as_ref();
        let (quotas, limits) = tokio::join!(
            exec.get_resource_quotas(namespace),
            exec.get_limit_ranges(namespace)
        );

        let mut item = match (quotas, limits) {
            (Ok(quotas), Ok(limits)) => {
                let analysis = analyze_constraints(&quotas, &limits);
                let mut item = ChecklistItem::new(name);
                item.findings.push(format!(
                    "{} quota(s), {} limit range(s)",
                    analysis.quotas, analysis.limit_ranges
                ));
                if analysis.violations.is_empty() {
                    debug!("no quota utilization above threshold");
                } else {
                    item.findings.extend(analysis.violations.iter().cloned());
                    item.status = CheckStatus::Warning;
                    item.severity = Severity::High;
                    item.recommendations
                        .push("raise the quota or reduce workload resource requests".to_string());
                }
                item
            }
            (Err(err), _) | (_, Err(err)) => ChecklistItem::failed(name, &err.to_string()),
        };
        item.duration_ms = started.elapsed().as_millis() as u64;
        CheckOutcome::from_item(item)
    }

    async fn notify_memory(&self, request: &ChecklistRequest, result: &RcaChecklistResult) {
        let record = ExecutionRecord {
            tool: "rca_checklist".to_string(),
            args_summary: format!(
                "namespace={:?} deep={}",
                request.namespace, request.deep_analysis
            ),
            result_summary: result.human_summary.clone(),
            session_id: request.session_id.clone().unwrap_or_default(),
            tags: vec!["diagnostic".to_string(), "checklist".to_string()],
            domain: "cluster-triage".to_string(),
            environment: "cluster".to_string(),
            severity: result.overall_status.as_str().to_string(),
        };
        if !self.memory.store_tool_execution(&record).await {
            debug!("memory store rejected the execution record");
        }
    }
}
