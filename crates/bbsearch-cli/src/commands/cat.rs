use anyhow::Result;
use bbsearch_config::Config;

pub async fn handle(config: &Config, repo: String, git_ref: String, path: String) -> Result<()> {
    let ops = super::connect(config)?;
    let content = ops.get_file_content(&repo, &git_ref, &path).await?;
    print!("{}", content);
    Ok(())
}
