/// CLI argument parsing and command handling - Gateway
mod args;
mod commands;
mod render;

pub use args::{Cli, Commands, EmployeesCommand, FormsCommand, ProfileCommand, RegisterArgs};
pub use commands::{handle_command, report_error, SessionExpired};
pub use render::{describe_error, TerminalObserver};
