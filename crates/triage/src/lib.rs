//! Cluster diagnostic triage engine.
//!
//! Turns raw Kubernetes/OpenShift resource listings into an actionable
//! diagnostic report: per-namespace health, scale-down classification,
//! prioritized attention ranking, root-cause derivation, and a phased
//! diagnostic checklist with bounded concurrency and an overall timeout.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use triage::checklist::{ChecklistEngine, ChecklistRequest};
//! use triage::clock::SystemClock;
//! use triage::config::TriageConfig;
//! use triage::exec::KubectlExec;
//! use triage::memory::NoopMemory;
//!
//! # async fn run() {
//! let engine = ChecklistEngine::new(
//!     Arc::new(KubectlExec::kubectl()),
//!     Arc::new(SystemClock),
//!     TriageConfig::default(),
//!     Arc::new(NoopMemory),
//! );
//! let report = engine
//!     .run(&ChecklistRequest {
//!         namespace: Some("shop".to_string()),
//!         ..ChecklistRequest::default()
//!     })
//!     .await;
//! println!("{}", report.human_summary);
//! # }
//! ```
//!
//! # Architecture
//!
//! Data flows strictly downward: resource listings → [`analyze`] →
//! [`scaledown`]/[`suspicion`] → [`score`]/[`rootcause`] → [`checklist`] →
//! final report. Nothing above the orchestrator depends on its internals.

pub mod analyze;
pub mod checklist;
pub mod clock;
pub mod cluster;
pub mod config;
pub mod error;
pub mod exec;
pub mod memory;
pub mod namespace;
pub mod report;
pub mod resources;
pub mod rootcause;
pub mod scaledown;
pub mod score;
pub mod suspicion;

pub use checklist::{ChecklistEngine, ChecklistRequest};
pub use cluster::{ClusterOverview, ClusterTriage, ClusterTriageRequest};
pub use config::TriageConfig;
pub use error::{Result, TriageError};
pub use namespace::{HealthStatus, NamespaceHealthChecker, NamespaceHealthResult};
pub use report::RcaChecklistResult;
