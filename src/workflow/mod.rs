// Job workflow: one dataset at a time, upload through execution

pub mod controller;
pub mod state;

pub use controller::WorkflowController;
pub use state::{Outcome, Phase, WorkflowSnapshot};
