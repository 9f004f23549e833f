//! Application layer - configuration, shared state, polling and wiring.

pub mod config;
mod orchestrator;
mod poller;
mod state;

pub use config::{
    Config, LoggingConfig, PollerConfig, SelectorConfig, ServerConfig, SourceConfig, SourceKind,
    StorageConfig,
};
pub use orchestrator::{build_state, App};
pub use poller::{PollOutcome, Poller};
pub use state::{AppState, ServiceStatus};
