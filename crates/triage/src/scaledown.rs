//! Scale-down vs. failure classification.
//!
//! Distinguishes "someone deliberately scaled this workload to zero" from
//! genuine failure modes by combining deployment replica state with recent
//! event history.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::resources::{Deployment, Event, List};

/// Deployments modified inside this window count as recently scaled.
const DEPLOYMENT_WINDOW_HOURS: i64 = 2;

/// Only events inside this window are considered.
const EVENT_WINDOW_HOURS: i64 = 1;

/// Final verdict of the classifier, in descending priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleDownVerdict {
    IntentionalScaleDown,
    NodeFailure,
    ResourcePressure,
    ApplicationFailure,
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeploymentCounts {
    pub total: usize,
    #[serde(rename = "scaledToZero")]
    pub scaled_to_zero: usize,
    #[serde(rename = "recentlyScaled")]
    pub recently_scaled: usize,
}

/// Immutable classification computed once per health check invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ScaleDownAnalysis {
    #[serde(rename = "isScaleDown")]
    pub is_scale_down: bool,
    pub evidence: Vec<String>,
    pub deployments: DeploymentCounts,
    #[serde(rename = "scaleDownEvents")]
    pub scale_down_events: Vec<String>,
    pub verdict: ScaleDownVerdict,
}

/// Classify a namespace's deployment and event snapshots.
///
/// Verdict assignment is a priority chain, not independent rules: the first
/// matching branch wins.
pub fn classify_scale_down(
    deployments: &List<Deployment>,
    events: &List<Event>,
    pod_count: usize,
    now: DateTime<Utc>,
) -> ScaleDownAnalysis {
    let mut evidence = Vec::new();
    let mut counts = DeploymentCounts {
        total: deployments.items.len(),
        ..DeploymentCounts::default()
    };

    for deployment in &deployments.items {
        let name = &deployment.metadata.name;
        let desired = deployment.spec.replicas.unwrap_or(0);
        let available = deployment.status.available_replicas.unwrap_or(0);

        if desired == 0 {
            counts.scaled_to_zero += 1;
            evidence.push(format!("deployment {name} is scaled to 0 replicas"));
        }
        if desired != available && was_recently_modified(deployment, now) {
            counts.recently_scaled += 1;
            evidence.push(format!(
                "deployment {name} was modified recently ({desired} desired, {available} available)"
            ));
        }
    }

    let mut scale_down_events = Vec::new();
    let mut node_issue = false;
    let event_cutoff = now - Duration::hours(EVENT_WINDOW_HOURS);
    for event in &events.items {
        if !event.occurred_at().is_some_and(|t| t >= event_cutoff) {
            continue;
        }
        match event.reason.as_str() {
            "ScalingReplicaSet" if event.message.to_lowercase().contains("scaled down") => {
                scale_down_events.push(event.message.clone());
                evidence.push(format!("scaling event: {}", event.message));
            }
            "Killing" if event.involved_object.kind == "Pod" => {
                scale_down_events.push(format!(
                    "pod {} killed: {}",
                    event.involved_object.name, event.message
                ));
                evidence.push(format!("pod {} was killed", event.involved_object.name));
            }
            "NodeNotReady" | "NodeUnavailable" => {
                node_issue = true;
                evidence.push(format!(
                    "node issue detected ({}): {}",
                    event.reason, event.message
                ));
            }
            _ => {}
        }
    }

    let is_scale_down = counts.scaled_to_zero > 0 || !scale_down_events.is_empty();

    let verdict = if counts.scaled_to_zero > 0 && !scale_down_events.is_empty() {
        ScaleDownVerdict::IntentionalScaleDown
    } else if node_issue {
        ScaleDownVerdict::NodeFailure
    } else if pod_count == 0 && counts.total == 0 {
        ScaleDownVerdict::ResourcePressure
    } else if pod_count == 0 {
        ScaleDownVerdict::ApplicationFailure
    } else {
        ScaleDownVerdict::Unknown
    };

    ScaleDownAnalysis {
        is_scale_down,
        evidence,
        deployments: counts,
        scale_down_events,
        verdict,
    }
}

fn was_recently_modified(deployment: &Deployment, now: DateTime<Utc>) -> bool {
    deployment
        .last_modified()
        .is_some_and(|t| now - t < Duration::hours(DEPLOYMENT_WINDOW_HOURS))
}
