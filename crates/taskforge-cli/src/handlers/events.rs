use anyhow::Result;
use std::path::Path;
use taskforge_runtime::Taskforge;

pub fn handle_stats(data_dir: &Path) -> Result<()> {
    let rt = Taskforge::open(data_dir)?;
    let stats = rt.events().stats()?;
    println!("Event queue:");
    println!("  total:       {}", stats.total);
    println!("  unprocessed: {}", stats.unprocessed);
    println!("  processed:   {}", stats.processed);
    Ok(())
}

pub fn handle_purge(data_dir: &Path, hours: Option<u64>) -> Result<()> {
    let rt = Taskforge::open(data_dir)?;
    let purged = rt.events().purge(hours)?;
    println!("Purged {} processed event(s).", purged);
    Ok(())
}
