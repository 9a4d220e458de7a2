// Utility functions

pub mod logger;
pub mod retry;

pub use logger::{init_logging, ConsoleMode};
pub use retry::{with_retry, RetryPolicy};
