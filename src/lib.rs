//! Runscribe - Automation Run Recorder
//!
//! Runscribe converts the ordered lifecycle event stream of a declarative
//! automation run (plays, tasks, per-host results) into structured records
//! on a remote record-keeping service.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture
//! principles:
//!
//! - **Domain Layer** (`domain`): models, lifecycle events, errors and the
//!   record client port
//! - **Service Layer** (`services`): identity caches, executors, sanitizer,
//!   controller resolution
//! - **Application Layer** (`application`): the event dispatcher and signal
//!   finalization
//! - **Infrastructure Layer** (`infrastructure`): HTTP record client and
//!   configuration loading
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use runscribe::{Dispatcher, RecorderConfig};
//! use runscribe::infrastructure::build_client;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = RecorderConfig::default();
//!     let client = build_client(&config)?;
//!     let mut dispatcher = Dispatcher::new(client, config);
//!     // feed dispatcher.handle_event(..) from the engine's hooks
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{Dispatcher, TerminationSignals};
pub use domain::errors::{RecordError, RecordResult};
pub use domain::models::{
    FileRecord, Host, HostnameFormat, Play, PlayStatus, RecorderConfig, ResultStatus, Run,
    RunEvent, RunStatus, Task, TaskResult, TaskStatus,
};
pub use domain::ports::RecordClient;
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Executor, IdentityCache, Sanitizer};
