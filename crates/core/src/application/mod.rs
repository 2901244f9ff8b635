// Application Layer - Dispatch, lifecycle, scheduling and output verification

pub mod context;
pub mod dispatcher;
pub mod executor;
pub mod lifecycle;
pub mod process_io;
pub mod retry;

// Re-exports
pub use context::ExecutionContext;
pub use dispatcher::{Dispatcher, RunnerContext, RunnerFactory, RunnerRegistry};
pub use executor::{ParallelPool, SerialQueue, TaskHandle};
pub use lifecycle::{run_task, TaskTracker};
pub use process_io::{ProcessIoParser, ProcessIoResult};
pub use retry::{RetryDecision, RetryPolicy};
