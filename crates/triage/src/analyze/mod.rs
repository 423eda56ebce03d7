//! Resource analyzers.
//!
//! Pure functions that turn raw resource listings into compact summaries.
//! They never fail on malformed input: absent fields are already zeroed at
//! the deserialization boundary, and anything unparseable is skipped.

pub mod events;
pub mod network;
pub mod nodes;
pub mod pods;
pub mod pvcs;
pub mod quota;
pub mod routes;

pub use events::{analyze_recent_events, critical_events, EventAnalysis};
pub use network::{analyze_network, NetworkAnalysis};
pub use nodes::{analyze_nodes, NodeHealthAnalysis};
pub use pods::{analyze_pods, PodHealthSummary};
pub use pvcs::{analyze_pvcs, PvcHealthSummary};
pub use quota::{analyze_constraints, parse_quantity, ResourceConstraintAnalysis};
pub use routes::{analyze_routes, RouteHealthSummary, RouteProbe};
