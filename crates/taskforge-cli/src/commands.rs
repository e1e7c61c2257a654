use anyhow::Result;

use crate::args::{Cli, Commands, EventsCommand, TasksCommand};
use crate::handlers;

pub fn run(cli: Cli) -> Result<()> {
    let data_dir = taskforge_runtime::resolve_workspace_path(cli.data_dir.as_deref())?;

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Init => handlers::init::handle(&data_dir),

        Commands::Serve => {
            init_tracing();
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(handlers::serve::handle(&data_dir))
        }

        Commands::Tasks { command } => match command {
            TasksCommand::List { status, category } => {
                handlers::tasks::handle_list(&data_dir, status.as_deref(), category.as_deref())
            }
        },

        Commands::Events { command } => match command {
            EventsCommand::Stats => handlers::events::handle_stats(&data_dir),
            EventsCommand::Purge { hours } => handlers::events::handle_purge(&data_dir, hours),
        },
    }
}

/// Logging goes to stderr; stdout belongs to the JSON-RPC stream.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
