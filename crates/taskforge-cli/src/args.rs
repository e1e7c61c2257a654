use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "taskforge",
    version,
    about = "Orchestration tool server for AI-assisted development",
    long_about = "taskforge decomposes user stories into dependency-linked tasks, walks each \
                  task through an analysis -> implementation workflow over MCP, and learns \
                  from feedback to flag risky patterns."
)]
pub struct Cli {
    /// Workspace data directory (default: TASKFORGE_PATH or the XDG data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize the workspace: data directory, database and default
    /// project configuration
    Init,

    /// Run the MCP tool server over stdio
    Serve,

    /// Inspect tasks from the command line
    Tasks {
        #[command(subcommand)]
        command: TasksCommand,
    },

    /// Inspect and maintain the event queue
    Events {
        #[command(subcommand)]
        command: EventsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum TasksCommand {
    /// List tasks, optionally filtered
    List {
        /// Filter by status (backlog|todo|in_progress|done)
        #[arg(long)]
        status: Option<String>,
        /// Filter by category (design_frontend|backend_database|test_fix)
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// Queue counters
    Stats,
    /// Remove old processed events
    Purge {
        /// Age threshold in hours (default from config, 24h)
        #[arg(long)]
        hours: Option<u64>,
    },
}
