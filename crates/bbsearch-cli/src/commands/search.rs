use anyhow::Result;
use bbsearch_config::Config;
use bbsearch_engine::SearchRequest;

pub async fn handle(
    config: &Config,
    query: String,
    max_page: Option<u32>,
    page: Option<u32>,
    page_len: Option<u32>,
) -> Result<()> {
    let ops = super::connect(config)?;

    let request = SearchRequest {
        query,
        page,
        page_len,
        max_pages: max_page,
    };
    let results = ops.search(&request).await?;

    if results.matches.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&results.matches)?);

    if results.truncated {
        eprintln!(
            "⚠ Results truncated after {} pages (use --max-page to fetch more)",
            results.pages_fetched
        );
    }

    Ok(())
}
