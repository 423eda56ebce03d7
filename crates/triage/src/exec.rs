//! Cluster command execution.
//!
//! [`ClusterExec`] is the single seam between the engine and a live cluster:
//! an async command runner with a per-call timeout and retry count. The
//! narrow resource accessors in [`ClusterResources`] are thin wrappers over
//! it with fixed arguments, so a test double only has to fake one method.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Result, TriageError};
use crate::resources::{
    Deployment, Endpoints, Event, LimitRange, List, Namespace, Node, Pod, Pvc, ResourceQuota,
    Route, Service, StorageClass,
};

/// Default per-command timeout when the caller does not set one.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(15);

/// Base delay between retry attempts.
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Per-call execution options.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub namespace: Option<String>,
    pub timeout: Option<Duration>,
    pub retries: u32,
}

impl ExecOptions {
    pub fn in_namespace(namespace: &str) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Raw output of a cluster command.
#[derive(Debug, Clone, Default)]
pub struct CmdOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes commands against the cluster (`kubectl`, `oc`, or a test fake).
///
/// Retry and backoff for transient failures live here, not in the checks:
/// callers treat any returned error as "this check failed".
#[async_trait]
pub trait ClusterExec: Send + Sync {
    async fn execute(&self, args: &[&str], opts: ExecOptions) -> Result<CmdOutput>;
}

/// Typed resource accessors, provided for every [`ClusterExec`].
///
/// Accessors taking `Option<&str>` fall back to a cluster-wide (`-A`) listing
/// when no namespace is given.
#[async_trait]
pub trait ClusterResources: ClusterExec {
    async fn fetch_list<T>(
        &self,
        kind: &'static str,
        namespace: Option<&str>,
    ) -> Result<List<T>>
    where
        T: DeserializeOwned + Send,
    {
        let mut args = vec!["get", kind, "-o", "json"];
        let opts = match namespace {
            Some(ns) => ExecOptions::in_namespace(ns),
            None => {
                args.insert(2, "-A");
                ExecOptions::default()
            }
        };
        let out = self.execute(&args, opts).await?;
        serde_json::from_str(&out.stdout).map_err(|source| TriageError::Parse { resource: kind, source })
    }

    async fn get_pods(&self, namespace: &str) -> Result<List<Pod>> {
        self.fetch_list("pods", Some(namespace)).await
    }

    async fn get_events(&self, namespace: Option<&str>) -> Result<List<Event>> {
        self.fetch_list("events", namespace).await
    }

    async fn get_pvcs(&self, namespace: Option<&str>) -> Result<List<Pvc>> {
        self.fetch_list("pvc", namespace).await
    }

    async fn get_routes(&self, namespace: Option<&str>) -> Result<List<Route>> {
        self.fetch_list("routes", namespace).await
    }

    async fn get_deployments(&self, namespace: &str) -> Result<List<Deployment>> {
        self.fetch_list("deployments", Some(namespace)).await
    }

    async fn get_nodes(&self) -> Result<List<Node>> {
        let out = self.execute(&["get", "nodes", "-o", "json"], ExecOptions::default()).await?;
        serde_json::from_str(&out.stdout)
            .map_err(|source| TriageError::Parse { resource: "nodes", source })
    }

    async fn get_namespaces(&self) -> Result<List<Namespace>> {
        let out = self
            .execute(&["get", "namespaces", "-o", "json"], ExecOptions::default())
            .await?;
        serde_json::from_str(&out.stdout)
            .map_err(|source| TriageError::Parse { resource: "namespaces", source })
    }

    async fn get_services(&self, namespace: Option<&str>) -> Result<List<Service>> {
        self.fetch_list("services", namespace).await
    }

    async fn get_endpoints(&self, namespace: Option<&str>) -> Result<List<Endpoints>> {
        self.fetch_list("endpoints", namespace).await
    }

    async fn get_storage_classes(&self) -> Result<List<StorageClass>> {
        let out = self
            .execute(&["get", "storageclass", "-o", "json"], ExecOptions::default())
            .await?;
        serde_json::from_str(&out.stdout)
            .map_err(|source| TriageError::Parse { resource: "storageclass", source })
    }

    async fn get_resource_quotas(&self, namespace: Option<&str>) -> Result<List<ResourceQuota>> {
        self.fetch_list("resourcequota", namespace).await
    }

    async fn get_limit_ranges(&self, namespace: Option<&str>) -> Result<List<LimitRange>> {
        self.fetch_list("limitrange", namespace).await
    }

    /// Whether a namespace exists and is accessible. Any executor failure is
    /// treated as "not accessible" rather than an error.
    async fn namespace_exists(&self, namespace: &str) -> bool {
        self.execute(
            &["get", "namespace", namespace, "-o", "json"],
            ExecOptions::default().with_timeout(Duration::from_secs(5)),
        )
        .await
        .is_ok()
    }
}

#[async_trait]
impl<T: ClusterExec + ?Sized> ClusterResources for T {}

/// Subprocess-backed executor invoking `kubectl` or `oc`.
pub struct KubectlExec {
    program: String,
}

impl KubectlExec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn kubectl() -> Self {
        Self::new("kubectl")
    }

    pub fn oc() -> Self {
        Self::new("oc")
    }

    async fn run_once(
        &self,
        args: &[&str],
        namespace: Option<&str>,
        timeout: Duration,
    ) -> Result<CmdOutput> {
        let command_line = args.join(" ");
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(ns) = namespace {
            cmd.args(["-n", ns]);
        }
        cmd.kill_on_drop(true);

        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| TriageError::ExecTimeout {
                command: command_line.clone(),
                timeout_ms: timeout.as_millis() as u64,
            })?
            .map_err(|e| TriageError::Exec {
                command: command_line.clone(),
                message: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(CmdOutput { stdout, stderr })
        } else {
            Err(TriageError::Exec {
                command: command_line,
                message: if stderr.trim().is_empty() {
                    format!("exit status {}", output.status)
                } else {
                    stderr.trim().to_string()
                },
            })
        }
    }
}

#[async_trait]
impl ClusterExec for KubectlExec {
    /// Runs the command, retrying transient failures up to `opts.retries`
    /// times with linear backoff.
    async fn execute(&self, args: &[&str], opts: ExecOptions) -> Result<CmdOutput> {
        let timeout = opts.timeout.unwrap_or(DEFAULT_COMMAND_TIMEOUT);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.run_once(args, opts.namespace.as_deref(), timeout).await {
                Ok(out) => {
                    debug!(command = %args.join(" "), attempt, "cluster command succeeded");
                    return Ok(out);
                }
                Err(err) if attempt <= opts.retries => {
                    warn!(
                        command = %args.join(" "),
                        attempt,
                        error = %err,
                        "cluster command failed, retrying"
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    /// Writes a fake cluster CLI that fails its first invocation (creating a
    /// marker file) and succeeds on every one after that.
    fn flaky_program(dir: &PathBuf) -> KubectlExec {
        let marker = dir.join("attempted");
        let script = dir.join("fake-kubectl");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\n\
                 if [ -e {marker} ]; then echo '{{\"items\":[]}}'; \
                 else touch {marker}; echo transient >&2; exit 1; fi\n",
                marker = marker.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        KubectlExec::new(script.display().to_string())
    }

    #[tokio::test]
    async fn no_retries_surfaces_the_first_failure() {
        let dir = std::env::temp_dir().join(format!("triage-exec-{}", uuid::Uuid::new_v4()));
        fs::create_dir(&dir).unwrap();
        let exec = flaky_program(&dir);

        let result = exec.execute(&["get", "nodes"], ExecOptions::default()).await;
        assert!(matches!(result, Err(TriageError::Exec { .. })));
        let message = result.unwrap_err().to_string();
        assert!(message.contains("transient"), "unexpected error: {message}");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn retry_budget_recovers_from_a_transient_failure() {
        let dir = std::env::temp_dir().join(format!("triage-exec-{}", uuid::Uuid::new_v4()));
        fs::create_dir(&dir).unwrap();
        let exec = flaky_program(&dir);

        let opts = ExecOptions {
            retries: 2,
            ..ExecOptions::default()
        };
        let out = exec.execute(&["get", "nodes"], opts).await.unwrap();
        assert_eq!(out.stdout.trim(), r#"{"items":[]}"#);

        fs::remove_dir_all(&dir).unwrap();
    }
}
