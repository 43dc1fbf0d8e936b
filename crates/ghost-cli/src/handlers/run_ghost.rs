use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use uuid::Uuid;

use crate::llm;

pub async fn handle(
    data_dir: &std::path::Path,
    ghost_id: Uuid,
    parameters: &str,
    trigger: &str,
    llm_base_url: Option<String>,
    llm_api_key: Option<String>,
    llm_model: String,
) -> Result<()> {
    let store = ghost_store::Store::open(&data_dir.join("ghost.db"))?;
    let provider = llm::build(llm_base_url, llm_api_key, llm_model);
    let parameters: serde_json::Value = serde_json::from_str(parameters).context("--parameters must be a JSON object")?;

    let result = ghost_engine::run_ghost(&store, provider.as_ref(), ghost_id, parameters, trigger).await?;

    let status_label = format!("{:?}", result.status);
    let colored_status = if matches!(result.status, ghost_types::ExecutionStatus::Completed) {
        status_label.green().bold().to_string()
    } else {
        status_label.red().bold().to_string()
    };
    println!("execution {} -> {}", result.execution_id, colored_status);
    for step in &result.steps {
        println!("  [{}] {:?} via {:?}", step.node_id, step.status, step.strategy);
    }
    Ok(())
}
