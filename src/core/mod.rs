pub mod conf;
pub mod error;
pub mod info_parser;
pub mod logs;
pub mod orchestrator;
pub mod registry;
pub mod runner;
pub mod scheduler;

pub use conf::{ConfigDocument, ConfigStore};
pub use error::{Error, Result};
pub use logs::LogReader;
pub use orchestrator::BackupOrchestrator;
pub use registry::{BackupKind, Instance, InstanceRegistry};
pub use runner::ProcessRunner;
pub use scheduler::Scheduler;
