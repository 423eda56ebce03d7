//! Event stream analysis.

use chrono::{DateTime, Duration, Utc};

use crate::resources::{Event, List};

/// Window for the critical-event list attached to namespace health results.
const CRITICAL_WINDOW_MINUTES: i64 = 10;

/// Cap on critical events carried into a health result.
const CRITICAL_EVENT_CAP: usize = 10;

/// How many distinct warning reasons the pattern list keeps.
const PATTERN_LIMIT: usize = 5;

/// Aggregate view of recent cluster or namespace events.
#[derive(Debug, Clone, Default)]
pub struct EventAnalysis {
    pub total: usize,
    pub warnings: usize,
    /// Most frequent warning reasons within the window, descending by count.
    pub patterns: Vec<(String, usize)>,
}

/// Warning events within the last ten minutes, newest wording preserved,
/// capped so a noisy namespace cannot flood the report.
pub fn critical_events(list: &List<Event>, now: DateTime<Utc>) -> Vec<String> {
    let cutoff = now - Duration::minutes(CRITICAL_WINDOW_MINUTES);
    list.items
        .iter()
        .filter(|e| e.kind == "Warning")
        .filter(|e| e.occurred_at().is_some_and(|t| t >= cutoff))
        .map(|e| format!("{}: {}", e.reason, e.message))
        .take(CRITICAL_EVENT_CAP)
        .collect()
}

/// Summarize events inside `window`, extracting the dominant warning reasons.
pub fn analyze_recent_events(
    list: &List<Event>,
    now: DateTime<Utc>,
    window: Duration,
) -> EventAnalysis {
    let cutoff = now - window;
    let mut analysis = EventAnalysis::default();
    let mut reason_counts: Vec<(String, usize)> = Vec::new();

    for event in &list.items {
        if !event.occurred_at().is_some_and(|t| t >= cutoff) {
            continue;
        }
        analysis.total += 1;
        if event.kind != "Warning" {
            continue;
        }
        analysis.warnings += 1;
        match reason_counts.iter_mut().find(|(r, _)| *r == event.reason) {
            Some((_, count)) => *count += 1,
            None => reason_counts.push((event.reason.clone(), 1)),
        }
    }

    reason_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    reason_counts.truncate(PATTERN_LIMIT);
    analysis.patterns = reason_counts;
    analysis
}
