// Domain Layer - Commands, results and server model

pub mod command;
pub mod error;
pub mod process_io;
pub mod report;
pub mod result;
pub mod server;
pub mod task;

// Re-exports
pub use command::{Command, CommandScope, ResponseFormat, Transport, ValueKind};
pub use error::DomainError;
pub use process_io::{ProcessIoContent, Token};
pub use report::{ActionReport, ExitCode, MessagePart};
pub use result::{CommandResult, LaunchedProcess, LogPayload, ResultValue};
pub use server::{AdminInterface, Scheme, ServerDescriptor, ServerVersion};
pub use task::{TaskEvent, TaskState};
