//! Node health analysis.

use serde::Serialize;

use crate::resources::{List, Node};

#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeHealthAnalysis {
    pub total: usize,
    pub ready: usize,
    #[serde(rename = "notReady")]
    pub not_ready: Vec<String>,
    /// `"node: condition"` entries for memory/disk/PID pressure.
    pub pressure: Vec<String>,
}

/// Classify nodes by their `Ready` condition and pressure conditions.
pub fn analyze_nodes(list: &List<Node>) -> NodeHealthAnalysis {
    let mut analysis = NodeHealthAnalysis {
        total: list.items.len(),
        ..NodeHealthAnalysis::default()
    };

    for node in &list.items {
        let name = &node.metadata.name;
        let is_ready = node
            .status
            .conditions
            .iter()
            .any(|c| c.kind == "Ready" && c.status == "True");
        if is_ready {
            analysis.ready += 1;
        } else {
            analysis.not_ready.push(name.clone());
        }

        for condition in &node.status.conditions {
            let pressured = matches!(
                condition.kind.as_str(),
                "MemoryPressure" | "DiskPressure" | "PIDPressure"
            ) && condition.status == "True";
            if pressured {
                analysis.pressure.push(format!("{name}: {}", condition.kind));
            }
        }
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_ready_and_pressured_nodes() {
        let list: List<Node> = serde_json::from_value(json!({ "items": [
            { "metadata": { "name": "worker-0" },
              "status": { "conditions": [
                  { "type": "Ready", "status": "True" },
                  { "type": "MemoryPressure", "status": "False" } ] } },
            { "metadata": { "name": "worker-1" },
              "status": { "conditions": [
                  { "type": "Ready", "status": "False" },
                  { "type": "DiskPressure", "status": "True" } ] } },
        ]}))
        .unwrap();
        let analysis = analyze_nodes(&list);
        assert_eq!(analysis.total, 2);
        assert_eq!(analysis.ready, 1);
        assert_eq!(analysis.not_ready, vec!["worker-1"]);
        assert_eq!(analysis.pressure, vec!["worker-1: DiskPressure"]);
    }

    #[test]
    fn node_without_conditions_counts_as_not_ready() {
        let list: List<Node> = serde_json::from_value(json!({ "items": [
            { "metadata": { "name": "mystery" } },
        ]}))
        .unwrap();
        let analysis = analyze_nodes(&list);
        assert_eq!(analysis.not_ready, vec!["mystery"]);
    }
}
