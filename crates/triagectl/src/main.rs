//! Cluster triage CLI
//!
//! Runs the diagnostic checklist, single-namespace health checks, and
//! cluster-wide prioritization sweeps against a live cluster via `kubectl`
//! or `oc`, emitting JSON or markdown reports.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use triage::checklist::{ChecklistEngine, ChecklistRequest};
use triage::clock::SystemClock;
use triage::cluster::{ClusterTriage, ClusterTriageRequest};
use triage::config::TriageConfig;
use triage::exec::KubectlExec;
use triage::memory::NoopMemory;
use triage::namespace::NamespaceHealthChecker;
use triage::score::{Scope, Strategy};

/// Cluster diagnostic triage - checklist runs, namespace health, prioritization
#[derive(Parser)]
#[command(name = "triagectl")]
#[command(about = "Cluster diagnostic triage - checklist runs, namespace health, prioritization")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Cluster CLI to shell out to
    #[arg(long, default_value = "kubectl", global = true)]
    kubectl: String,

    /// Output format
    #[arg(long, value_enum, default_value = "json", global = true)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    All,
    System,
    User,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::All => Scope::All,
            ScopeArg::System => Scope::System,
            ScopeArg::User => Scope::User,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Auto,
    Events,
    ResourcePressure,
    None,
}

impl From<StrategyArg> for Strategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Auto => Strategy::Auto,
            StrategyArg::Events => Strategy::Events,
            StrategyArg::ResourcePressure => Strategy::ResourcePressure,
            StrategyArg::None => Strategy::None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full diagnostic checklist
    Checklist {
        /// Target namespace; omit to sweep critical system namespaces
        #[arg(long)]
        namespace: Option<String>,

        /// Run the deep resource-constraint check
        #[arg(long)]
        deep: bool,

        /// Probe route backends for reachability
        #[arg(long)]
        test_connectivity: bool,

        /// Overall run budget in seconds
        #[arg(long)]
        max_seconds: Option<u64>,
    },

    /// Check the health of a single namespace
    Namespace {
        name: String,

        /// Probe route backends for reachability
        #[arg(long)]
        test_connectivity: bool,
    },

    /// Rank the pods of one namespace by severity
    Pods {
        namespace: String,

        /// Scoring strategy
        #[arg(long, value_enum, default_value = "auto")]
        strategy: StrategyArg,

        /// Pod guaranteed deep analysis
        #[arg(long)]
        focus: Option<String>,

        /// How many pods get full detail
        #[arg(long, default_value_t = 5)]
        max_detailed: usize,
    },

    /// Sweep and prioritize namespaces across the cluster
    Cluster {
        /// Namespace scope to sweep
        #[arg(long, value_enum, default_value = "all")]
        scope: ScopeArg,

        /// Scoring strategy
        #[arg(long, value_enum, default_value = "auto")]
        strategy: StrategyArg,

        /// Namespace guaranteed deep analysis
        #[arg(long)]
        focus: Option<String>,

        /// How many namespaces get full detail
        #[arg(long, default_value_t = 3)]
        max_detailed: usize,

        /// Restrict the sweep to these namespaces (implies bounded mode)
        #[arg(long)]
        namespace: Vec<String>,

        /// Force the bounded low-latency path
        #[arg(long)]
        bounded: bool,

        /// Wall-clock budget in seconds (implies bounded mode)
        #[arg(long)]
        max_seconds: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exec = Arc::new(KubectlExec::new(cli.kubectl.clone()));
    let clock = Arc::new(SystemClock);
    let config = TriageConfig::default();
    debug!(program = cli.kubectl, "cluster executor configured");

    match cli.command {
        Commands::Checklist {
            namespace,
            deep,
            test_connectivity,
            max_seconds,
        } => {
            let engine = ChecklistEngine::new(exec, clock, config, Arc::new(NoopMemory));
            let request = ChecklistRequest {
                namespace,
                deep_analysis: deep,
                test_connectivity,
                include_markdown: cli.format == OutputFormat::Markdown,
                max_check_time: max_seconds.map(Duration::from_secs),
                session_id: None,
            };
            let report = engine.run(&request).await;
            match cli.format {
                OutputFormat::Markdown => {
                    if let Some(markdown) = &report.markdown {
                        println!("{markdown}");
                    }
                }
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&report)
                            .context("failed to serialize checklist report")?
                    );
                }
            }
        }

        Commands::Namespace {
            name,
            test_connectivity,
        } => {
            let checker = NamespaceHealthChecker::new(exec, clock, config);
            let result = checker.check(&name, test_connectivity).await;
            println!(
                "{}",
                serde_json::to_string_pretty(&result)
                    .context("failed to serialize namespace health result")?
            );
        }

        Commands::Pods {
            namespace,
            strategy,
            focus,
            max_detailed,
        } => {
            use triage::exec::ClusterResources;
            use triage::score::prioritize_pods;

            let pods = exec
                .as_ref()
                .get_pods(&namespace)
                .await
                .with_context(|| format!("failed to list pods in {namespace}"))?;
            let entries = prioritize_pods(&pods, strategy.into(), focus.as_deref(), max_detailed);
            println!(
                "{}",
                serde_json::to_string_pretty(&entries)
                    .context("failed to serialize pod ranking")?
            );
        }

        Commands::Cluster {
            scope,
            strategy,
            focus,
            max_detailed,
            namespace,
            bounded,
            max_seconds,
        } => {
            let triage = ClusterTriage::new(exec, clock, config);
            let request = ClusterTriageRequest {
                scope: scope.into(),
                strategy: strategy.into(),
                focus,
                max_detailed,
                namespaces: namespace,
                bounded,
                max_runtime: max_seconds.map(Duration::from_secs),
                test_connectivity: false,
            };
            let overview = triage.run(&request).await.context("cluster sweep failed")?;
            println!(
                "{}",
                serde_json::to_string_pretty(&overview)
                    .context("failed to serialize cluster overview")?
            );
        }
    }

    Ok(())
}
