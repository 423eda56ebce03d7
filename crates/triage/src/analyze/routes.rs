//! Route health analysis with an optional reachability probe.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::resources::{List, Route};

/// Result of the single HEAD probe against the first route host.
#[derive(Debug, Clone, Serialize)]
pub struct RouteProbe {
    pub url: String,
    /// HTTP status code, or 0 when the request itself failed.
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub message: String,
}

impl RouteProbe {
    /// A backend is considered reachable for any response below 500.
    pub fn reachable(&self) -> bool {
        self.status_code != 0 && self.status_code < 500
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteHealthSummary {
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<RouteProbe>,
}

/// Summarize routes and, when requested, probe the first route's host.
///
/// The probe is attempted only when `test_connectivity` is set and at least
/// one route exists. Probe failures are recorded as status code 0, never
/// surfaced as errors.
pub async fn analyze_routes(
    list: &List<Route>,
    client: &reqwest::Client,
    test_connectivity: bool,
    probe_timeout: Duration,
) -> RouteHealthSummary {
    let mut summary = RouteHealthSummary {
        total: list.items.len(),
        probe: None,
    };

    if !test_connectivity {
        return summary;
    }
    let Some(route) = list.items.iter().find(|r| !r.spec.host.is_empty()) else {
        return summary;
    };

    let url = format!("https://{}", route.spec.host);
    debug!(%url, "probing route backend");
    let probe = match client.head(&url).timeout(probe_timeout).send().await {
        Ok(response) => {
            let code = response.status().as_u16();
            RouteProbe {
                url,
                status_code: code,
                message: format!("HTTP {code}"),
            }
        }
        Err(err) => RouteProbe {
            url,
            status_code: 0,
            message: format!("unreachable: {err}"),
        },
    };
    summary.probe = Some(probe);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn no_probe_without_connectivity_request() {
        let list: List<Route> = serde_json::from_value(json!({ "items": [
            { "metadata": { "name": "web" }, "spec": { "host": "web.apps.example.com" } },
        ]}))
        .unwrap();
        let client = reqwest::Client::new();
        let summary = analyze_routes(&list, &client, false, Duration::from_secs(5)).await;
        assert_eq!(summary.total, 1);
        assert!(summary.probe.is_none());
    }

    #[tokio::test]
    async fn no_probe_when_no_routes_exist() {
        let client = reqwest::Client::new();
        let summary =
            analyze_routes(&List::default(), &client, true, Duration::from_secs(5)).await;
        assert_eq!(summary.total, 0);
        assert!(summary.probe.is_none());
    }

    #[tokio::test]
    async fn probe_failure_is_status_zero() {
        let list: List<Route> = serde_json::from_value(json!({ "items": [
            { "metadata": { "name": "web" },
              "spec": { "host": "route-probe.invalid" } },
        ]}))
        .unwrap();
        let client = reqwest::Client::new();
        let summary = analyze_routes(&list, &client, true, Duration::from_millis(500)).await;
        let probe = summary.probe.unwrap();
        assert_eq!(probe.status_code, 0);
        assert!(!probe.reachable());
    }
}
