/// Cron-driven dispatch of scheduled backups and retention cleanup
///
/// A single timer ticks once per minute and walks the registry; every due
/// policy produces an independent task. A failing instance is logged and
/// never blocks the other instances scheduled in the same tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, Timelike};
use tokio::task::JoinHandle;

use super::orchestrator::BackupOrchestrator;
use super::registry::{parse_schedule, BackupKind, InstanceRegistry};

/// Default retention cleanup cadence, daily at 03:00
pub const DEFAULT_CLEANUP_SCHEDULE: &str = "0 3 * * *";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Backup(BackupKind),
    Cleanup,
}

/// One unit of work due in the current tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledAction {
    pub instance_id: String,
    pub action: Action,
}

/// True when the 5-field expression covers the given minute
fn due(expr: &str, minute: &DateTime<Local>) -> bool {
    match parse_schedule(expr) {
        Ok(schedule) => schedule.includes(*minute),
        Err(e) => {
            // Policies are validated on entry, so this only fires for a
            // misconfigured cleanup schedule
            tracing::error!("unusable cron expression: {}", e);
            false
        }
    }
}

pub struct Scheduler {
    registry: Arc<InstanceRegistry>,
    orchestrator: Arc<BackupOrchestrator>,
    cleanup_schedule: String,
}

impl Scheduler {
    pub fn new(
        registry: Arc<InstanceRegistry>,
        orchestrator: Arc<BackupOrchestrator>,
        cleanup_schedule: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            orchestrator,
            cleanup_schedule: cleanup_schedule.into(),
        }
    }

    /// Collect everything due at the given instant (truncated to the minute).
    ///
    /// For each instance, the first policy of each backup type is consulted;
    /// the cleanup schedule applies to every instance.
    pub fn collect_due(&self, now: DateTime<Local>) -> Vec<ScheduledAction> {
        let minute = now
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);

        let mut actions = Vec::new();

        for instance in self.registry.list() {
            for kind in [BackupKind::Full, BackupKind::Incr, BackupKind::Diff] {
                let policy = instance.policies.iter().find(|p| p.kind == kind);
                if let Some(policy) = policy {
                    if policy.enabled && due(&policy.schedule, &minute) {
                        actions.push(ScheduledAction {
                            instance_id: instance.id.clone(),
                            action: Action::Backup(kind),
                        });
                    }
                }
            }

            if due(&self.cleanup_schedule, &minute) {
                actions.push(ScheduledAction {
                    instance_id: instance.id.clone(),
                    action: Action::Cleanup,
                });
            }
        }

        actions
    }

    /// Spawn one independent task per action. Failures are logged here and
    /// do not propagate: one instance's failure must never suppress another
    /// instance's scheduled operation.
    pub fn dispatch(&self, actions: Vec<ScheduledAction>) -> Vec<JoinHandle<()>> {
        actions
            .into_iter()
            .map(|scheduled| {
                let orchestrator = self.orchestrator.clone();
                tokio::spawn(async move {
                    let id = scheduled.instance_id;
                    let result = match scheduled.action {
                        Action::Backup(kind) => {
                            tracing::info!(instance = %id, "running scheduled {} backup", kind);
                            orchestrator.run_backup(&id, kind).await
                        }
                        Action::Cleanup => {
                            tracing::info!(instance = %id, "running scheduled cleanup");
                            orchestrator.run_cleanup(&id).await
                        }
                    };

                    if let Err(e) = result {
                        tracing::error!(instance = %id, "scheduled operation failed: {}", e);
                    }
                })
            })
            .collect()
    }

    /// Tick every minute until a shutdown signal arrives
    pub async fn run(&self) {
        tracing::info!(
            "scheduler started (cleanup schedule: {})",
            self.cleanup_schedule
        );

        let tick_loop = async {
            loop {
                // Sleep to the next minute boundary so cron minutes line up
                let wait = 60 - Local::now().second().min(59) as u64;
                tokio::time::sleep(Duration::from_secs(wait)).await;

                let actions = self.collect_due(Local::now());
                if !actions.is_empty() {
                    tracing::debug!("tick dispatching {} action(s)", actions.len());
                }
                self.dispatch(actions);
            }
        };

        tokio::select! {
            _ = tick_loop => {}
            _ = wait_for_shutdown_signal() => {
                tracing::info!("scheduler shutting down");
            }
        }
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
