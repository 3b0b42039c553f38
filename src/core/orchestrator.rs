/// Backup tool invocation per instance
///
/// Wraps the external tool's command-line contract: every action is keyed by
/// the instance id (the tool's stanza) plus an action-specific flag set.
/// Subprocess failures propagate unchanged so the API layer and scheduler
/// can log and surface them.

use std::path::PathBuf;
use std::sync::Arc;

use super::error::Result;
use super::registry::{BackupKind, InstanceRegistry};
use super::runner::ProcessRunner;

/// Supplies the "is a backup currently running for this instance" signal.
///
/// Process enumeration lives outside the core; the default probe reports
/// nothing running.
pub trait RunningProbe: Send + Sync {
    fn is_backup_running(&self, instance_id: &str) -> bool;
}

/// Probe that never reports a running backup
pub struct NoProbe;

impl RunningProbe for NoProbe {
    fn is_backup_running(&self, _instance_id: &str) -> bool {
        false
    }
}

pub struct BackupOrchestrator {
    executable: PathBuf,
    runner: ProcessRunner,
    registry: Arc<InstanceRegistry>,
}

impl BackupOrchestrator {
    pub fn new(
        executable: impl Into<PathBuf>,
        runner: ProcessRunner,
        registry: Arc<InstanceRegistry>,
    ) -> Self {
        Self {
            executable: executable.into(),
            runner,
            registry,
        }
    }

    async fn invoke(&self, instance_id: &str, args: &[&str]) -> Result<String> {
        // Fail fast on unknown instances before spawning anything
        self.registry.get(instance_id)?;

        let program = self.executable.to_string_lossy();
        tracing::info!(instance = instance_id, "executing: {} {}", program, args.join(" "));

        let output = self.runner.run(&program, args).await?;
        if !output.stderr.trim().is_empty() {
            tracing::warn!(instance = instance_id, "tool stderr: {}", output.stderr.trim());
        }

        Ok(output.stdout)
    }

    /// Run a backup of the given type for an instance
    pub async fn run_backup(&self, instance_id: &str, kind: BackupKind) -> Result<String> {
        let stanza = format!("--stanza={}", instance_id);
        let backup_type = format!("--type={}", kind);
        self.invoke(instance_id, &[&stanza, "backup", &backup_type])
            .await
    }

    /// Expire backups past the retention policy for an instance
    pub async fn run_cleanup(&self, instance_id: &str) -> Result<String> {
        let stanza = format!("--stanza={}", instance_id);
        self.invoke(instance_id, &[&stanza, "expire"]).await
    }

    /// Fetch the tool's raw info report for an instance.
    /// Structuring the text is the info parser's job, not this one's.
    pub async fn info(&self, instance_id: &str) -> Result<String> {
        let stanza = format!("--stanza={}", instance_id);
        self.invoke(instance_id, &["info", &stanza]).await
    }

    /// Run the tool's stanza consistency check for an instance
    pub async fn check(&self, instance_id: &str) -> Result<String> {
        let stanza = format!("--stanza={}", instance_id);
        self.invoke(instance_id, &[&stanza, "check"]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;
    use crate::core::registry::Instance;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn registry_with(id: &str) -> Arc<InstanceRegistry> {
        let registry = InstanceRegistry::new();
        registry
            .add(Instance {
                id: id.to_string(),
                name: "postgres".to_string(),
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                password: "postgres".to_string(),
                policies: vec![],
            })
            .unwrap();
        Arc::new(registry)
    }

    /// Write a fake backup tool that echoes its arguments
    fn fake_tool(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("pgbackrest.sh");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh\n{}", body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_backup_passes_stanza_and_type() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(&dir, r#"echo "$@""#);
        let orchestrator =
            BackupOrchestrator::new(tool, ProcessRunner::new(), registry_with("main"));

        let stdout = orchestrator
            .run_backup("main", BackupKind::Incr)
            .await
            .unwrap();
        assert_eq!(stdout.trim(), "--stanza=main backup --type=incr");
    }

    #[tokio::test]
    async fn test_cleanup_uses_expire_action() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(&dir, r#"echo "$@""#);
        let orchestrator =
            BackupOrchestrator::new(tool, ProcessRunner::new(), registry_with("main"));

        let stdout = orchestrator.run_cleanup("main").await.unwrap();
        assert_eq!(stdout.trim(), "--stanza=main expire");
    }

    #[tokio::test]
    async fn test_unknown_instance_never_spawns() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("ran");
        let tool = fake_tool(&dir, &format!("touch {}", marker.display()));
        let orchestrator =
            BackupOrchestrator::new(tool, ProcessRunner::new(), registry_with("main"));

        let err = orchestrator.info("ghost").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_tool_failure_propagates_unchanged() {
        let dir = TempDir::new().unwrap();
        let tool = fake_tool(&dir, "echo 'stanza missing' >&2; exit 82");
        let orchestrator =
            BackupOrchestrator::new(tool, ProcessRunner::new(), registry_with("main"));

        let err = orchestrator.check("main").await.unwrap_err();
        match err {
            Error::Execution { code, stderr } => {
                assert_eq!(code, 82);
                assert!(stderr.contains("stanza missing"));
            }
            other => panic!("expected Execution error, got {:?}", other),
        }
    }
}
