/// In-memory registry of backup instances
///
/// Each instance maps to one stanza of the external backup tool and carries
/// its connection info plus scheduled backup policies. The registry is the
/// single owner of this state; durable storage is a collaborator concern and
/// can be swapped in behind the same contract.

use std::str::FromStr;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// Backup type understood by the external tool's --type flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    Full,
    Incr,
    Diff,
}

impl BackupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupKind::Full => "full",
            BackupKind::Incr => "incr",
            BackupKind::Diff => "diff",
        }
    }
}

impl std::fmt::Display for BackupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackupKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full" => Ok(BackupKind::Full),
            "incr" => Ok(BackupKind::Incr),
            "diff" => Ok(BackupKind::Diff),
            other => Err(Error::Parse(format!(
                "unknown backup type '{}' (expected full, incr or diff)",
                other
            ))),
        }
    }
}

/// One scheduled backup or cleanup rule for an instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupPolicy {
    #[serde(rename = "type")]
    pub kind: BackupKind,
    /// 5-field cron expression (minute hour day-of-month month day-of-week)
    pub schedule: String,
    pub retention: u32,
    pub enabled: bool,
}

/// One managed database target with its backup policies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Unique, immutable after creation; doubles as the tool's stanza name
    pub id: String,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    #[serde(default)]
    pub policies: Vec<BackupPolicy>,
}

/// Partial update payload; only supplied fields overwrite.
/// The policy list is replaced wholesale, not merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceUpdate {
    pub name: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub policies: Option<Vec<BackupPolicy>>,
}

/// Parse a 5-field cron expression into a schedule.
///
/// The cron crate wants a seconds field, so a literal `0` is prefixed.
pub fn parse_schedule(expr: &str) -> Result<cron::Schedule> {
    if expr.split_whitespace().count() != 5 {
        return Err(Error::Parse(format!(
            "cron expression '{}' must have 5 space-separated fields",
            expr
        )));
    }

    cron::Schedule::from_str(&format!("0 {}", expr))
        .map_err(|e| Error::Parse(format!("invalid cron expression '{}': {}", expr, e)))
}

fn validate_policies(policies: &[BackupPolicy]) -> Result<()> {
    for policy in policies {
        parse_schedule(&policy.schedule)?;
    }
    Ok(())
}

pub struct InstanceRegistry {
    instances: RwLock<Vec<Instance>>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self {
            instances: RwLock::new(Vec::new()),
        }
    }

    /// Seed the registry from pre-configured instances, skipping duplicates
    pub fn seed(instances: Vec<Instance>) -> Self {
        let registry = Self::new();
        for instance in instances {
            if let Err(e) = registry.add(instance) {
                tracing::warn!("skipping seeded instance: {}", e);
            }
        }
        registry
    }

    /// List all instances in insertion order
    pub fn list(&self) -> Vec<Instance> {
        self.instances.read().unwrap().clone()
    }

    /// Look up a single instance by id
    pub fn get(&self, id: &str) -> Result<Instance> {
        self.instances
            .read()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Add a new instance. Fails with Conflict if the id is already taken.
    pub fn add(&self, instance: Instance) -> Result<Instance> {
        validate_policies(&instance.policies)?;

        let mut instances = self.instances.write().unwrap();
        if instances.iter().any(|i| i.id == instance.id) {
            return Err(Error::Conflict(instance.id));
        }

        instances.push(instance.clone());
        Ok(instance)
    }

    /// Shallow-merge the supplied fields into an existing instance
    pub fn update(&self, id: &str, update: InstanceUpdate) -> Result<Instance> {
        if let Some(policies) = &update.policies {
            validate_policies(policies)?;
        }

        let mut instances = self.instances.write().unwrap();
        let instance = instances
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if let Some(name) = update.name {
            instance.name = name;
        }
        if let Some(host) = update.host {
            instance.host = host;
        }
        if let Some(port) = update.port {
            instance.port = port;
        }
        if let Some(user) = update.user {
            instance.user = user;
        }
        if let Some(password) = update.password {
            instance.password = password;
        }
        if let Some(policies) = update.policies {
            instance.policies = policies;
        }

        Ok(instance.clone())
    }

    /// Remove an instance by id
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut instances = self.instances.write().unwrap();
        let index = instances
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        instances.remove(index);
        Ok(())
    }
}

impl Default for InstanceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
