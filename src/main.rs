mod cli;
mod core;
#[cfg(feature = "server")]
mod server;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands, ConfigCommands, InstanceCommands};
use crate::core::info_parser::{self, BackupStatus};
#[cfg(feature = "server")]
use crate::core::orchestrator::NoProbe;
use crate::core::registry::parse_schedule;
use crate::core::{
    BackupKind, BackupOrchestrator, ConfigStore, Error, InstanceRegistry, LogReader,
    ProcessRunner, Scheduler,
};
use crate::utils::{is_sensitive_key, mask_secret, AppConfig};

/// Core components wired from the application configuration
struct Context {
    registry: Arc<InstanceRegistry>,
    orchestrator: Arc<BackupOrchestrator>,
    config_store: Arc<ConfigStore>,
    log_reader: Arc<LogReader>,
    cleanup_schedule: String,
}

impl Context {
    fn build(config: &AppConfig) -> Self {
        let registry = Arc::new(InstanceRegistry::seed(config.instances.clone()));

        let runner = match config.timeout() {
            Some(timeout) => ProcessRunner::with_timeout(timeout),
            None => ProcessRunner::new(),
        };

        let orchestrator = Arc::new(BackupOrchestrator::new(
            config.executable(),
            runner,
            registry.clone(),
        ));

        Self {
            registry,
            orchestrator,
            config_store: Arc::new(ConfigStore::new(config.conf_path())),
            log_reader: Arc::new(LogReader::new(config.log_path())),
            cleanup_schedule: config.cleanup_schedule(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backrest_cli=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let ctx = Context::build(&config);

    match cli.command {
        Commands::Status => {
            handle_status(&ctx).await?;
        }
        Commands::Backup {
            instance,
            backup_type,
        } => {
            let kind: BackupKind = backup_type.parse()?;
            println!("Running {} backup for {}...", kind, instance);
            let stdout = ctx.orchestrator.run_backup(&instance, kind).await?;
            print!("{}", stdout);
            println!("✓ Backup complete");
        }
        Commands::Cleanup { instance } => {
            println!("Expiring old backups for {}...", instance);
            let stdout = ctx.orchestrator.run_cleanup(&instance).await?;
            print!("{}", stdout);
            println!("✓ Cleanup complete");
        }
        Commands::Check { instance } => {
            let stdout = ctx.orchestrator.check(&instance).await?;
            print!("{}", stdout);
            println!("✓ Stanza check passed");
        }
        Commands::Info { instance } => {
            let stdout = ctx.orchestrator.info(&instance).await?;
            print!("{}", stdout);
        }
        Commands::History { instance } => {
            handle_history(&ctx, &instance).await?;
        }
        Commands::Instances { command } => match command {
            InstanceCommands::List => handle_instances_list(&ctx),
        },
        Commands::Config { command } => match command {
            ConfigCommands::View => handle_config_view(&ctx),
            ConfigCommands::Validate => handle_config_validate(&config),
        },
        Commands::Logs { tail } => {
            for line in ctx.log_reader.tail(tail)? {
                println!("{}", line);
            }
        }
        Commands::Schedule => {
            let scheduler = Scheduler::new(
                ctx.registry.clone(),
                ctx.orchestrator.clone(),
                ctx.cleanup_schedule.clone(),
            );
            scheduler.run().await;
        }
        #[cfg(feature = "server")]
        Commands::Serve { port, host, cors } => {
            let state = server::AppState {
                registry: ctx.registry.clone(),
                orchestrator: ctx.orchestrator.clone(),
                config_store: ctx.config_store.clone(),
                log_reader: ctx.log_reader.clone(),
                probe: Arc::new(NoProbe),
            };
            server::run(state, host, port, cors).await?;
        }
    }

    Ok(())
}

async fn handle_status(ctx: &Context) -> Result<()> {
    let instances = ctx.registry.list();
    if instances.is_empty() {
        println!("No instances configured.");
        println!("Add instances to ~/.config/backrest-cli/config.toml or via the API.");
        return Ok(());
    }

    println!("Backup Status\n");
    println!(
        "{:<15} {:<10} {:<22} {:<8} {:<10} {:<8}",
        "Instance", "State", "Last Backup", "Type", "Size", "Count"
    );
    println!("{}", "-".repeat(78));

    for instance in instances {
        let status = match ctx.orchestrator.info(&instance.id).await {
            Ok(text) => info_parser::backup_status(&text, false),
            Err(Error::NotFound(_)) => unreachable!("instance came from the registry"),
            Err(e) => {
                tracing::error!(instance = %instance.id, "status query failed: {}", e);
                BackupStatus::failed()
            }
        };

        println!(
            "{:<15} {:<10} {:<22} {:<8} {:<10} {:<8}",
            instance.id,
            format!("{:?}", status.state).to_lowercase(),
            status.last_backup_time,
            status.last_backup_type,
            status.last_backup_size,
            status.backup_count
        );
    }

    Ok(())
}

async fn handle_history(ctx: &Context, instance: &str) -> Result<()> {
    let text = ctx.orchestrator.info(instance).await?;
    let backups = info_parser::parse_backup_info(&text);

    if backups.is_empty() {
        println!("No backups found for {}", instance);
        return Ok(());
    }

    println!("Backup History for {}\n", instance);
    println!(
        "{:<25} {:<8} {:<22} {:<10} {:<10}",
        "Backup", "Type", "Started", "Size", "Duration"
    );
    println!("{}", "-".repeat(78));

    for backup in backups {
        println!(
            "{:<25} {:<8} {:<22} {:<10} {:<10}",
            backup.id, backup.kind, backup.timestamp, backup.size, backup.duration
        );
    }

    Ok(())
}

fn handle_instances_list(ctx: &Context) {
    let instances = ctx.registry.list();
    if instances.is_empty() {
        println!("No instances configured.");
        return;
    }

    println!("Configured Instances\n");
    for instance in instances {
        println!(
            "{} ({}) - {}:{} as {} (password {})",
            instance.id,
            instance.name,
            instance.host,
            instance.port,
            instance.user,
            mask_secret(&instance.password)
        );

        for policy in &instance.policies {
            let state = if policy.enabled { "enabled" } else { "disabled" };
            println!(
                "  {} backup: '{}' retention={} ({})",
                policy.kind, policy.schedule, policy.retention, state
            );
        }
    }
}

fn handle_config_view(ctx: &Context) {
    let doc = ctx.config_store.load();
    println!("# {}\n", ctx.config_store.path().display());

    println!("[global]");
    for (key, value) in &doc.global {
        let display = if is_sensitive_key(key) { "****" } else { value.as_str() };
        println!("{}={}", key, display);
    }

    for (stanza, settings) in &doc.stanzas {
        println!("\n[{}]", stanza);
        for (key, value) in settings {
            let display = if is_sensitive_key(key) { "****" } else { value.as_str() };
            println!("{}={}", key, display);
        }
    }
}

fn handle_config_validate(config: &AppConfig) {
    let mut errors = Vec::new();

    if let Err(e) = parse_schedule(&config.cleanup_schedule()) {
        errors.push(format!("cleanup_schedule: {}", e));
    }

    for instance in &config.instances {
        for policy in &instance.policies {
            if let Err(e) = parse_schedule(&policy.schedule) {
                errors.push(format!("instance {}: {}", instance.id, e));
            }
        }
    }

    let ids: Vec<&str> = config.instances.iter().map(|i| i.id.as_str()).collect();
    for (index, id) in ids.iter().enumerate() {
        if ids[..index].contains(id) {
            errors.push(format!("duplicate instance id '{}'", id));
        }
    }

    if errors.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        println!("✗ Configuration errors:");
        for error in errors {
            println!("  - {}", error);
        }
        std::process::exit(1);
    }
}
