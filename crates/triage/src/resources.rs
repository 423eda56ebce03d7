//! Typed views over raw cluster resource listings.
//!
//! The cluster command executor hands back arbitrary JSON; everything is
//! deserialized into these structs at the analyzer boundary so that untyped
//! maps never travel further into the engine. Every field defaults to a safe
//! zero value, so partial or malformed objects degrade gracefully instead of
//! failing deserialization.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Generic `kubectl get ... -o json` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct List<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

/// Common object metadata. Timestamps are kept as raw strings and parsed
/// lazily so that a malformed timestamp never poisons a whole listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub creation_timestamp: Option<String>,
    pub annotations: BTreeMap<String, String>,
}

/// Parse an RFC 3339 timestamp, returning `None` for absent or garbage input.
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Pod {
    pub metadata: ObjectMeta,
    pub status: PodStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodStatus {
    pub phase: String,
    pub container_statuses: Vec<ContainerStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
    pub restart_count: i64,
    pub state: ContainerState,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContainerState {
    pub waiting: Option<StateDetail>,
    pub terminated: Option<StateDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StateDetail {
    pub reason: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Pvc {
    pub metadata: ObjectMeta,
    pub status: PvcStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PvcStatus {
    pub phase: String,
    pub conditions: Vec<Condition>,
}

/// Status condition shared by several resource kinds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub reason: String,
    pub message: String,
    pub last_update_time: Option<String>,
    pub last_transition_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub reason: String,
    pub message: String,
    pub last_timestamp: Option<String>,
    pub event_time: Option<String>,
    pub involved_object: InvolvedObject,
}

impl Event {
    /// Best-effort event time: `lastTimestamp` with `eventTime` fallback.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.last_timestamp.as_deref())
            .or_else(|| parse_timestamp(self.event_time.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InvolvedObject {
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Deployment {
    pub metadata: ObjectMeta,
    pub spec: DeploymentSpec,
    pub status: DeploymentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeploymentSpec {
    pub replicas: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploymentStatus {
    pub available_replicas: Option<i64>,
    pub ready_replicas: Option<i64>,
    pub conditions: Vec<Condition>,
}

impl Deployment {
    /// Most recent trustworthy modification timestamp: creation timestamp or
    /// a condition update/transition time. `resourceVersion` is an opaque
    /// counter, not a timestamp, and is never consulted.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.metadata.creation_timestamp.as_deref())
            .or_else(|| {
                self.status
                    .conditions
                    .iter()
                    .find_map(|c| parse_timestamp(c.last_update_time.as_deref()))
            })
            .or_else(|| {
                self.status
                    .conditions
                    .iter()
                    .find_map(|c| parse_timestamp(c.last_transition_time.as_deref()))
            })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Node {
    pub metadata: ObjectMeta,
    pub status: NodeStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeStatus {
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Route {
    pub metadata: ObjectMeta,
    pub spec: RouteSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteSpec {
    pub host: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Service {
    pub metadata: ObjectMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub metadata: ObjectMeta,
    pub subsets: Vec<EndpointSubset>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointSubset {
    pub addresses: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Namespace {
    pub metadata: ObjectMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageClass {
    pub metadata: ObjectMeta,
}

/// Annotation marking a storage class as the cluster default.
pub const DEFAULT_STORAGE_CLASS_ANNOTATION: &str =
    "storageclass.kubernetes.io/is-default-class";

impl StorageClass {
    pub fn is_default(&self) -> bool {
        self.metadata
            .annotations
            .get(DEFAULT_STORAGE_CLASS_ANNOTATION)
            .is_some_and(|v| v == "true")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResourceQuota {
    pub metadata: ObjectMeta,
    pub status: QuotaStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuotaStatus {
    pub hard: BTreeMap<String, String>,
    pub used: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LimitRange {
    pub metadata: ObjectMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_zero_values() {
        let pod: Pod = serde_json::from_value(serde_json::json!({
            "metadata": { "name": "web-1" }
        }))
        .unwrap();
        assert_eq!(pod.metadata.name, "web-1");
        assert_eq!(pod.status.phase, "");
        assert!(pod.status.container_statuses.is_empty());
    }

    #[test]
    fn garbage_timestamp_is_none() {
        assert!(parse_timestamp(Some("not-a-date")).is_none());
        assert!(parse_timestamp(None).is_none());
        assert!(parse_timestamp(Some("2026-01-02T03:04:05Z")).is_some());
    }

    #[test]
    fn deployment_prefers_creation_timestamp() {
        let dep: Deployment = serde_json::from_value(serde_json::json!({
            "metadata": { "name": "api", "creationTimestamp": "2026-01-01T00:00:00Z" },
            "status": { "conditions": [ { "lastUpdateTime": "2026-02-01T00:00:00Z" } ] }
        }))
        .unwrap();
        let ts = dep.last_modified().unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn default_storage_class_annotation() {
        let sc: StorageClass = serde_json::from_value(serde_json::json!({
            "metadata": {
                "name": "gp3",
                "annotations": { "storageclass.kubernetes.io/is-default-class": "true" }
            }
        }))
        .unwrap();
        assert!(sc.is_default());
    }
}
