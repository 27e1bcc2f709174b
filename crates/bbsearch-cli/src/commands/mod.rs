pub mod cat;
pub mod config;
pub mod mcp;
pub mod search;

use anyhow::Result;
use bbsearch_config::Config;
use bbsearch_engine::RetrievalOperations;

/// Validate the config and build the operations every remote command uses.
pub fn connect(config: &Config) -> Result<RetrievalOperations> {
    config.validate()?;
    Ok(RetrievalOperations::connect(config)?)
}
