use std::sync::Arc;

use anyhow::Result;
use ghost_server::AppState;
use ghost_store::Store;
use owo_colors::OwoColorize;

use crate::llm;

pub async fn handle(
    data_dir: &std::path::Path,
    addr: &str,
    llm_base_url: Option<String>,
    llm_api_key: Option<String>,
    llm_model: String,
) -> Result<()> {
    let db_path = data_dir.join("ghost.db");
    std::fs::create_dir_all(data_dir)?;
    let store = Store::open(&db_path)?;
    let provider = llm::build(llm_base_url, llm_api_key, llm_model);
    let state = AppState::new(store, provider);
    let socket_addr: std::net::SocketAddr = addr.parse()?;

    println!("{} listening on {}", "ghost-server".green().bold(), socket_addr);
    println!("  store: {}", db_path.display());
    ghost_server::run(state, socket_addr).await?;
    Ok(())
}
