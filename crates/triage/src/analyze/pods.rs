//! Pod health analysis.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::resources::{parse_timestamp, List, Pod};

/// How long a pod may sit in `ContainerCreating`/`PodInitializing` before it
/// counts as stuck.
const STUCK_CREATING_MINUTES: i64 = 5;

/// Restart count above which a pod is reclassified as crashlooping even
/// without a `CrashLoopBackOff` waiting reason.
const RESTART_RECLASSIFY_THRESHOLD: i64 = 5;

/// Compact pod health summary for one namespace.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PodHealthSummary {
    pub ready: usize,
    pub total: usize,
    pub crashloops: Vec<String>,
    pub pending: Vec<String>,
    #[serde(rename = "imagePullErrors")]
    pub image_pull_errors: Vec<String>,
    #[serde(rename = "oomKilled")]
    pub oom_killed: Vec<String>,
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

/// Analyze a pod listing.
///
/// A pod is ready only when its phase is `Running` and every container
/// reports ready. Container waiting reasons drive failure bucketing; a pod
/// lands in at most one of the crashloop / image-pull / OOM lists per
/// container state, and a high restart count only adds to the crashloop list
/// when the container was not already classified.
pub fn analyze_pods(list: &List<Pod>, now: DateTime<Utc>) -> PodHealthSummary {
    let mut summary = PodHealthSummary {
        total: list.items.len(),
        ..PodHealthSummary::default()
    };

    for pod in &list.items {
        let name = pod.metadata.name.as_str();
        let phase = pod.status.phase.as_str();

        let all_ready = pod.status.container_statuses.iter().all(|c| c.ready);
        if phase == "Running" && all_ready {
            summary.ready += 1;
        }

        for container in &pod.status.container_statuses {
            let mut classified = false;

            if let Some(waiting) = &container.state.waiting {
                match waiting.reason.as_str() {
                    "CrashLoopBackOff" => {
                        push_unique(&mut summary.crashloops, name);
                        classified = true;
                    }
                    "ImagePullBackOff" | "ErrImagePull" => {
                        push_unique(&mut summary.image_pull_errors, name);
                        classified = true;
                    }
                    "ContainerCreating" | "PodInitializing" => {
                        if is_stuck_creating(pod, now) {
                            push_unique(&mut summary.pending, name);
                        }
                    }
                    _ => {}
                }
            }

            if let Some(terminated) = &container.state.terminated {
                if terminated.reason == "OOMKilled" {
                    push_unique(&mut summary.oom_killed, name);
                    classified = true;
                }
            }

            if container.restart_count > RESTART_RECLASSIFY_THRESHOLD && !classified {
                push_unique(&mut summary.crashloops, name);
            }
        }

        if phase == "Pending" {
            push_unique(&mut summary.pending, name);
        }
    }

    summary
}

fn is_stuck_creating(pod: &Pod, now: DateTime<Utc>) -> bool {
    match parse_timestamp(pod.metadata.creation_timestamp.as_deref()) {
        Some(created) => now - created > Duration::minutes(STUCK_CREATING_MINUTES),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pods(value: serde_json::Value) -> List<Pod> {
        serde_json::from_value(value).unwrap()
    }

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn running_with_all_containers_ready_counts_ready() {
        let list = pods(json!({ "items": [
            { "metadata": { "name": "web-1" },
              "status": { "phase": "Running",
                          "containerStatuses": [ { "name": "app", "ready": true } ] } },
            { "metadata": { "name": "web-2" },
              "status": { "phase": "Running",
                          "containerStatuses": [ { "name": "app", "ready": false } ] } },
        ]}));
        let summary = analyze_pods(&list, now());
        assert_eq!(summary.ready, 1);
        assert_eq!(summary.total, 2);
        assert!(summary.ready <= summary.total);
    }

    #[test]
    fn waiting_reasons_bucket_into_distinct_lists() {
        let list = pods(json!({ "items": [
            { "metadata": { "name": "crash-1" },
              "status": { "phase": "Running", "containerStatuses": [
                  { "name": "app", "state": { "waiting": { "reason": "CrashLoopBackOff" } } } ] } },
            { "metadata": { "name": "pull-1" },
              "status": { "phase": "Pending", "containerStatuses": [
                  { "name": "app", "state": { "waiting": { "reason": "ImagePullBackOff" } } } ] } },
            { "metadata": { "name": "oom-1" },
              "status": { "phase": "Running", "containerStatuses": [
                  { "name": "app", "state": { "terminated": { "reason": "OOMKilled" } } } ] } },
        ]}));
        let summary = analyze_pods(&list, now());
        assert_eq!(summary.crashloops, vec!["crash-1"]);
        assert_eq!(summary.image_pull_errors, vec!["pull-1"]);
        assert_eq!(summary.oom_killed, vec!["oom-1"]);
        // Pending phase also lands pull-1 in the pending list; the failure
        // lists themselves stay disjoint.
        for name in &summary.crashloops {
            assert!(!summary.image_pull_errors.contains(name));
            assert!(!summary.oom_killed.contains(name));
        }
    }

    #[test]
    fn high_restart_count_reclassifies_once() {
        let list = pods(json!({ "items": [
            { "metadata": { "name": "flappy" },
              "status": { "phase": "Running", "containerStatuses": [
                  { "name": "app", "restartCount": 9,
                    "state": { "waiting": { "reason": "CrashLoopBackOff" } } } ] } },
            { "metadata": { "name": "restarty" },
              "status": { "phase": "Running", "containerStatuses": [
                  { "name": "app", "restartCount": 6 } ] } },
        ]}));
        let summary = analyze_pods(&list, now());
        assert_eq!(summary.crashloops, vec!["flappy", "restarty"]);
    }

    #[test]
    fn high_restarts_do_not_override_image_pull_classification() {
        let list = pods(json!({ "items": [
            { "metadata": { "name": "pull-2" },
              "status": { "phase": "Running", "containerStatuses": [
                  { "name": "app", "restartCount": 12,
                    "state": { "waiting": { "reason": "ImagePullBackOff" } } } ] } },
        ]}));
        let summary = analyze_pods(&list, now());
        assert_eq!(summary.image_pull_errors, vec!["pull-2"]);
        assert!(summary.crashloops.is_empty());
    }

    #[test]
    fn stuck_creating_needs_to_exceed_threshold() {
        let list = pods(json!({ "items": [
            { "metadata": { "name": "slow", "creationTimestamp": "2026-03-01T11:50:00Z" },
              "status": { "phase": "Running", "containerStatuses": [
                  { "name": "app", "state": { "waiting": { "reason": "ContainerCreating" } } } ] } },
            { "metadata": { "name": "fresh", "creationTimestamp": "2026-03-01T11:58:00Z" },
              "status": { "phase": "Running", "containerStatuses": [
                  { "name": "app", "state": { "waiting": { "reason": "PodInitializing" } } } ] } },
        ]}));
        let summary = analyze_pods(&list, now());
        assert_eq!(summary.pending, vec!["slow"]);
    }

    #[test]
    fn empty_listing_is_all_zero() {
        let summary = analyze_pods(&List::default(), now());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.ready, 0);
        assert!(summary.crashloops.is_empty());
    }
}
