// FRIDATA - terminal client for human-in-the-loop data cleaning

pub mod config;
pub mod diff;
pub mod gateway;
pub mod progress;
pub mod runner;
pub mod transcript;
pub mod tui;
pub mod types;
pub mod utils;
pub mod workflow;

// Re-exports for convenience
pub use config::Config;
pub use gateway::{HttpGateway, JobGateway};
pub use workflow::{WorkflowController, WorkflowSnapshot};
