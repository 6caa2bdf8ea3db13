//! Command execution for builds, compose and terminal windows

mod command;
mod mock;
mod system;
mod r#trait;

pub use command::{CommandOutput, CommandSpec, DetachedProcess, Invocation};
pub use mock::{MockRunner, RecordedCommand};
pub use r#trait::CommandRunner;
pub use system::SystemRunner;
