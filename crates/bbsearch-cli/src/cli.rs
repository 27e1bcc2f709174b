use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bbsearch")]
#[command(about = "Bitbucket code search with credential masking", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server on stdin/stdout
    Mcp {
        /// Hide and refuse the branch and pull request tools
        #[arg(long)]
        read_only: bool,
    },

    /// Run the MCP server over HTTP
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        #[arg(long)]
        read_only: bool,
    },

    /// Search code in the configured workspace
    Search {
        /// Bitbucket code search query
        query: String,

        /// Maximum number of pages to aggregate (default from config: 100)
        #[arg(long)]
        max_page: Option<u32>,

        /// Fetch only this page
        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        page_len: Option<u32>,
    },

    /// Print a file from a repository
    Cat {
        /// Repository slug
        repo: String,

        /// Commit hash, branch or tag
        #[arg(value_name = "REF")]
        git_ref: String,

        /// Path inside the repository
        path: String,
    },

    /// Show the config file location and effective settings
    Config,
}
