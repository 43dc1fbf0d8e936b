use anyhow::{bail, Result};
use owo_colors::OwoColorize;
use uuid::Uuid;

use crate::args::ApproveAction;

pub fn handle(data_dir: &std::path::Path, ghost_id: Uuid, action: ApproveAction, decision_note: Option<String>, approved_by: &str) -> Result<()> {
    let store = ghost_store::Store::open(&data_dir.join("ghost.db"))?;

    let ghost = match action {
        ApproveAction::Approve => store.approve_ghost(ghost_id, approved_by, decision_note.as_deref()),
        ApproveAction::Reject => store.reject_ghost(ghost_id, approved_by, decision_note.as_deref()),
        ApproveAction::Pause => store.pause_ghost(ghost_id),
        ApproveAction::Activate => store.activate_ghost(ghost_id),
        ApproveAction::Archive => store.archive_ghost(ghost_id),
    };

    let ghost = match ghost {
        Ok(ghost) => ghost,
        Err(ghost_store::Error::NotFound(what)) => bail!("no such ghost: {what}"),
        Err(err) => return Err(err.into()),
    };

    println!(
        "{} {} ({}) -> {:?}, version {}",
        action.as_str().green().bold(),
        ghost.name,
        ghost.id,
        ghost.status,
        ghost.version,
    );
    Ok(())
}
