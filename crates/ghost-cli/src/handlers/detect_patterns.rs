use anyhow::Result;
use owo_colors::OwoColorize;

use crate::llm;

pub async fn handle(
    data_dir: &std::path::Path,
    org_id: &str,
    llm_base_url: Option<String>,
    llm_api_key: Option<String>,
    llm_model: String,
) -> Result<()> {
    let store = ghost_store::Store::open(&data_dir.join("ghost.db"))?;
    let provider = llm::build(llm_base_url, llm_api_key, llm_model);

    let patterns = ghost_cluster::detect_patterns(&store, provider.as_ref(), org_id).await?;
    if patterns.is_empty() {
        println!("no patterns found for {org_id}");
        return Ok(());
    }
    println!("{} {} pattern(s) for {org_id}:", "found".green().bold(), patterns.len());
    for pattern in &patterns {
        println!(
            "  - {} (confidence {:.2}, {} occurrences) {:?}",
            pattern.suggested_name.as_deref().unwrap_or("unnamed"),
            pattern.confidence,
            pattern.occurrences,
            pattern.intent_sequence,
        );
    }
    Ok(())
}
