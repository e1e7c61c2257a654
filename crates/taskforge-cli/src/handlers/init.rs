use anyhow::Result;
use std::path::Path;
use taskforge_runtime::{Config, Taskforge};

pub fn handle(data_dir: &Path) -> Result<()> {
    let rt = Taskforge::open(data_dir)?;
    let initialized = rt.project().initialize_configuration(None, None)?;

    let config_path = Config::config_path(data_dir);
    if !config_path.exists() {
        Config::default().save_to(&config_path)?;
    }

    println!("Initialized taskforge workspace at {}", data_dir.display());
    println!(
        "  guidelines: {} added, agents: {} added, tools: {} added, templates: {} added",
        initialized.guidelines_added,
        initialized.agents_added,
        initialized.tools_added,
        initialized.templates_added
    );
    println!("  config: {}", config_path.display());
    println!("\nRun `taskforge serve` to start the MCP server.");
    Ok(())
}
