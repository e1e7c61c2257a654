mod args;
mod commands;
mod handlers;
pub mod mcp;

pub use args::{Cli, Commands, EventsCommand, TasksCommand};
pub use commands::run;
