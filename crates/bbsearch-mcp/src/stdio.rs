use std::sync::Arc;

use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::server::{handle_message, McpServer};

/// Line-delimited JSON-RPC on stdin/stdout. Returns when stdin closes.
pub async fn run_stdio(server: Arc<McpServer>) -> anyhow::Result<()> {
    info!(
        workspace = server.ops.workspace(),
        read_only = server.read_only,
        "MCP server running on stdio"
    );

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let Some(response) = handle_message(&server, &line).await else {
            continue;
        };

        let mut output = serde_json::to_string(&response)?;
        output.push('\n');
        stdout.write_all(output.as_bytes()).await?;
        stdout.flush().await?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}
