mod cli;
mod commands;

use anyhow::Result;
use bbsearch_config::Config;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries MCP traffic, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let config = Config::load()?;
    tracing::debug!(path = %Config::config_path().display(), "Loaded config");

    match cli.command {
        cli::Commands::Mcp { read_only } => commands::mcp::stdio(&config, read_only).await,
        cli::Commands::Serve {
            host,
            port,
            read_only,
        } => {
            let host = host.unwrap_or_else(|| config.mcp.host.clone());
            let port = port.unwrap_or(config.mcp.port);
            commands::mcp::serve(&config, host, port, read_only).await
        }
        cli::Commands::Search {
            query,
            max_page,
            page,
            page_len,
        } => commands::search::handle(&config, query, max_page, page, page_len).await,
        cli::Commands::Cat { repo, git_ref, path } => {
            commands::cat::handle(&config, repo, git_ref, path).await
        }
        cli::Commands::Config => commands::config::handle(&config),
    }
}
