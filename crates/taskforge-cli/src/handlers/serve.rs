use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use taskforge_runtime::Taskforge;

use crate::mcp;

/// Run the MCP stdio server. Stdout stays a clean JSON-RPC stream; all
/// logging goes to stderr.
pub async fn handle(data_dir: &Path) -> Result<()> {
    let rt = Arc::new(Taskforge::open(data_dir)?);

    let maintenance = Arc::clone(&rt).spawn_maintenance();
    tracing::info!(data_dir = %data_dir.display(), "taskforge MCP server starting");

    let result = mcp::run_server(Arc::clone(&rt)).await;

    maintenance.abort();
    tracing::info!("taskforge MCP server stopped");
    result
}
