use std::path::PathBuf;

use anyhow::Result;

use crate::args::{Cli, Commands};
use crate::handlers;

pub async fn run(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir);

    match cli.command {
        Commands::Serve { addr, llm_base_url, llm_api_key, llm_model } => {
            handlers::serve::handle(&data_dir, &addr, llm_base_url, llm_api_key, llm_model).await
        }
        Commands::Simulate { org_id, device_id, user_id, count, endpoint } => {
            handlers::simulate::handle(&org_id, &device_id, &user_id, count, &endpoint).await
        }
        Commands::DetectPatterns { org_id, llm_base_url, llm_api_key, llm_model } => {
            handlers::detect_patterns::handle(&data_dir, &org_id, llm_base_url, llm_api_key, llm_model).await
        }
        Commands::RunGhost { ghost_id, parameters, trigger, llm_base_url, llm_api_key, llm_model } => {
            handlers::run_ghost::handle(&data_dir, ghost_id, &parameters, &trigger, llm_base_url, llm_api_key, llm_model).await
        }
        Commands::Approve { ghost_id, action, decision_note, approved_by } => {
            handlers::approve::handle(&data_dir, ghost_id, action, decision_note, &approved_by)
        }
    }
}

fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".ghost"))
}
