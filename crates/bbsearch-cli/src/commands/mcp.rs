use anyhow::Result;
use bbsearch_config::Config;
use bbsearch_mcp::{run_stdio, McpServer};
use std::sync::Arc;

fn server(config: &Config, read_only: bool) -> Result<Arc<McpServer>> {
    let ops = super::connect(config)?;
    Ok(Arc::new(McpServer::new(
        Arc::new(ops),
        read_only || config.mcp.read_only,
    )))
}

pub async fn stdio(config: &Config, read_only: bool) -> Result<()> {
    run_stdio(server(config, read_only)?).await
}

pub async fn serve(config: &Config, host: String, port: u16, read_only: bool) -> Result<()> {
    let server = server(config, read_only)?;

    eprintln!("Starting MCP server on http://{}:{}/mcp", host, port);
    server.serve(&host, port).await
}
