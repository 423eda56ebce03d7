//! Service/endpoint wiring analysis.

use serde::Serialize;

use crate::resources::{Endpoints, List, Service};

#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkAnalysis {
    pub services: usize,
    /// `namespace/name` of every service with no ready endpoint address.
    #[serde(rename = "servicesWithoutEndpoints")]
    pub services_without_endpoints: Vec<String>,
}

/// Cross-reference services with their endpoint objects.
///
/// A service has backends when an endpoints object with the same
/// namespace/name carries at least one subset with a non-empty address list.
pub fn analyze_network(services: &List<Service>, endpoints: &List<Endpoints>) -> NetworkAnalysis {
    let mut analysis = NetworkAnalysis {
        services: services.items.len(),
        ..NetworkAnalysis::default()
    };

    for service in &services.items {
        let has_backends = endpoints
            .items
            .iter()
            .filter(|e| {
                e.metadata.name == service.metadata.name
                    && e.metadata.namespace == service.metadata.namespace
            })
            .any(|e| e.subsets.iter().any(|s| !s.addresses.is_empty()));
        if !has_backends {
            let ns = &service.metadata.namespace;
            let name = &service.metadata.name;
            if ns.is_empty() {
                analysis.services_without_endpoints.push(name.clone());
            } else {
                analysis.services_without_endpoints.push(format!("{ns}/{name}"));
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
    fn flags_services_without_endpoint_addresses() {
        let services: List<Service> = serde_json::from_value(json!({ "items": [
            { "metadata": { "name": "api", "namespace": "shop" } },
            { "metadata": { "name": "worker", "namespace": "shop" } },
            { "metadata": { "name": "empty-subset", "namespace": "shop" } },
        ]}))
        .unwrap();
        let endpoints: List<Endpoints> = serde_json::from_value(json!({ "items": [
            { "metadata": { "name": "api", "namespace": "shop" },
              "subsets": [ { "addresses": [ { "ip": "10.0.0.4" } ] } ] },
            { "metadata": { "name": "empty-subset", "namespace": "shop" },
              "subsets": [ { "addresses": [] } ] },
        ]}))
        .unwrap();
        let analysis = analyze_network(&services, &endpoints);
        assert_eq!(analysis.services, 3);
        assert_eq!(
            analysis.services_without_endpoints,
            vec!["shop/worker", "shop/empty-subset"]
        );
    }

    #[test]
    fn empty_listings_produce_empty_analysis() {
        let analysis = analyze_network(&List::default(), &List::default());
        assert_eq!(analysis.services, 0);
        assert!(analysis.services_without_endpoints.is_empty());
    }
}
