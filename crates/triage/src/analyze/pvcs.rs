//! PVC health analysis.

use serde::Serialize;

use crate::resources::{List, Pvc};

/// Fallback reason when a pending PVC carries no explanatory condition.
const DEFAULT_PENDING_REASON: &str = "no storageclass or provisioner unavailable";

/// PVC phase buckets for one namespace.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PvcHealthSummary {
    pub bound: usize,
    pub pending: usize,
    pub failed: usize,
    pub total: usize,
    pub errors: Vec<String>,
}

/// Bucket PVCs strictly by reported phase. Phases other than
/// `Bound`/`Pending`/`Failed`/`Lost` are counted only in the total.
pub fn analyze_pvcs(list: &List<Pvc>) -> PvcHealthSummary {
    let mut summary = PvcHealthSummary {
        total: list.items.len(),
        ..PvcHealthSummary::default()
    };

    for pvc in &list.items {
        let name = &pvc.metadata.name;
        match pvc.status.phase.as_str() {
            "Bound" => summary.bound += 1,
            "Pending" => {
                summary.pending += 1;
                let reason = pvc
                    .status
                    .conditions
                    .iter()
                    .find(|c| !c.message.is_empty())
                    .map_or(DEFAULT_PENDING_REASON, |c| c.message.as_str());
                summary.errors.push(format!("{name}: pending ({reason})"));
            }
            "Lost" => {
                summary.failed += 1;
                summary.errors.push(format!("{name}: volume lost"));
            }
            "Failed" => {
                summary.failed += 1;
                summary.errors.push(format!("{name}: claim failed"));
            }
            _ => {}
        }
    }

    summary
}
