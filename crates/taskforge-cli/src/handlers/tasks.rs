use anyhow::{bail, Result};
use std::path::Path;
use taskforge_runtime::{TaskFilter, Taskforge};
use taskforge_types::{TaskCategory, TaskStatus};

pub fn handle_list(
    data_dir: &Path,
    status: Option<&str>,
    category: Option<&str>,
) -> Result<()> {
    let rt = Taskforge::open(data_dir)?;

    let mut filter = TaskFilter::default();
    if let Some(raw) = status {
        let Some(parsed) = TaskStatus::parse(raw) else {
            bail!("Unknown status '{}' (expected backlog|todo|in_progress|done)", raw);
        };
        filter = filter.status(parsed);
    }
    if let Some(raw) = category {
        let Some(parsed) = TaskCategory::parse(raw) else {
            bail!("Unknown category '{}'", raw);
        };
        filter = filter.category(parsed);
    }

    let tasks = rt.tasks().list(&filter)?;
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    for task in &tasks {
        let marker = if task.is_user_story { "US" } else { "  " };
        println!(
            "{} {:<12} {:<36} {}",
            marker,
            task.status.as_str(),
            task.id,
            task.title
        );
    }
    println!("\n{} task(s)", tasks.len());
    Ok(())
}
