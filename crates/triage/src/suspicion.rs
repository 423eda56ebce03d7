//! Suspicion generation.
//!
//! Pure mapping from analyzer summaries and the scale-down verdict to an
//! ordered list of human-readable suspicion strings. Scale-down findings go
//! to the front; the rest follow in a fixed order so reports stay stable.

use crate::analyze::{PodHealthSummary, PvcHealthSummary, RouteHealthSummary};
use crate::scaledown::{ScaleDownAnalysis, ScaleDownVerdict};

fn list_names(names: &[String]) -> String {
    names.join(", ")
}

fn keyword_hits(events: &[String], keywords: &[&str]) -> usize {
    events
        .iter()
        .filter(|e| keywords.iter().any(|k| e.contains(k)))
        .count()
}

/// Build the ranked suspicion list for one namespace.
pub fn generate_suspicions(
    pods: &PodHealthSummary,
    pvcs: &PvcHealthSummary,
    routes: &RouteHealthSummary,
    critical_events: &[String],
    scale_down: &ScaleDownAnalysis,
) -> Vec<String> {
    let mut suspicions = Vec::new();

    // Scale-down verdicts take display priority over everything else.
    match scale_down.verdict {
        ScaleDownVerdict::IntentionalScaleDown => suspicions.push(format!(
            "scale-down detected: {} deployment(s) intentionally scaled to 0 - not an application failure",
            scale_down.deployments.scaled_to_zero
        )),
        ScaleDownVerdict::NodeFailure => suspicions
            .push("node failure suspected: pods may have been evicted or lost".to_string()),
        ScaleDownVerdict::ResourcePressure => suspicions.push(
            "no pods or deployments found - namespace may be unused or cleaned up".to_string(),
        ),
        ScaleDownVerdict::ApplicationFailure => suspicions.push(
            "deployments exist but no pods are running - possible application failure".to_string(),
        ),
        ScaleDownVerdict::Unknown => {}
    }

    if !pods.crashloops.is_empty() {
        suspicions.push(format!(
            "{} pod(s) in CrashLoopBackOff: {}",
            pods.crashloops.len(),
            list_names(&pods.crashloops)
        ));
    }
    if !pods.image_pull_errors.is_empty() {
        suspicions.push(format!(
            "{} pod(s) failing image pull (ImagePullBackOff): {}",
            pods.image_pull_errors.len(),
            list_names(&pods.image_pull_errors)
        ));
    }
    if !pods.oom_killed.is_empty() {
        suspicions.push(format!(
            "{} pod(s) recently OOMKilled: {}",
            pods.oom_killed.len(),
            list_names(&pods.oom_killed)
        ));
    }
    if !pods.pending.is_empty() {
        suspicions.push(format!(
            "{} pod(s) stuck pending: {}",
            pods.pending.len(),
            list_names(&pods.pending)
        ));
    }

    if pvcs.pending > 0 || pvcs.failed > 0 {
        suspicions.push(format!(
            "{} PVC(s) not bound: {}",
            pvcs.pending + pvcs.failed,
            pvcs.errors.join("; ")
        ));
    }

    if let Some(probe) = &routes.probe {
        if !probe.reachable() {
            suspicions.push(format!(
                "route backend unhealthy at {}: {}",
                probe.url, probe.message
            ));
        }
    }

    // Image pull noise is common; only three or more hits count as a pattern.
    if keyword_hits(critical_events, &["ImagePullBackOff", "ErrImagePull", "Failed to pull"]) > 2 {
        suspicions.push("frequent image pull failures in recent events".to_string());
    }
    if keyword_hits(critical_events, &["FailedMount", "MountVolume"]) >= 1 {
        suspicions.push("volume mount failures in recent events".to_string());
    }
    if keyword_hits(critical_events, &["FailedScheduling"]) >= 1 {
        suspicions.push("pod scheduling failures in recent events".to_string());
    }

    suspicions
}
