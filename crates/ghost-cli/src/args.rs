use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "ghost")]
#[command(about = "On-device capture, clustering, and self-healing execution for browser workflow automation", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Where the sqlite store lives. Defaults to ~/.ghost/ghost.db.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(long, default_value = "info", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bind and serve the §6 HTTP surface (/ingest-events, /pattern-detector,
    /// /ghost-executor, /approve-ghost).
    Serve {
        #[arg(long, default_value = "127.0.0.1:8787")]
        addr: String,

        /// OpenAI-compatible base URL for the LLM port. Falls back to a
        /// scripted stub that always escalates to a human when unset —
        /// useful for trying the server without an API key.
        #[arg(long, env = "GHOST_LLM_BASE_URL")]
        llm_base_url: Option<String>,

        #[arg(long, env = "GHOST_LLM_API_KEY")]
        llm_api_key: Option<String>,

        #[arg(long, env = "GHOST_LLM_MODEL", default_value = "gpt-4o-mini")]
        llm_model: String,
    },

    /// Push synthetic raw capture events through the privacy pipeline and
    /// Transmitter, as a real browser extension would.
    Simulate {
        #[arg(long)]
        org_id: String,

        #[arg(long, default_value = "demo-device")]
        device_id: String,

        #[arg(long, default_value = "demo-user")]
        user_id: String,

        /// Number of synthetic click/navigation events to generate.
        #[arg(long, default_value = "20")]
        count: u32,

        /// Where to send the resulting batches. Defaults to the local
        /// `serve` endpoint.
        #[arg(long, default_value = "http://127.0.0.1:8787/ingest-events")]
        endpoint: String,
    },

    /// Run Temporal Intent Clustering over an org's recent Secure Events.
    DetectPatterns {
        #[arg(long)]
        org_id: String,

        #[arg(long, env = "GHOST_LLM_BASE_URL")]
        llm_base_url: Option<String>,

        #[arg(long, env = "GHOST_LLM_API_KEY")]
        llm_api_key: Option<String>,

        #[arg(long, env = "GHOST_LLM_MODEL", default_value = "gpt-4o-mini")]
        llm_model: String,
    },

    /// Execute a stored Ghost Template by id.
    RunGhost {
        ghost_id: Uuid,

        /// JSON object of execution parameters.
        #[arg(long, default_value = "{}")]
        parameters: String,

        #[arg(long, default_value = "manual")]
        trigger: String,

        #[arg(long, env = "GHOST_LLM_BASE_URL")]
        llm_base_url: Option<String>,

        #[arg(long, env = "GHOST_LLM_API_KEY")]
        llm_api_key: Option<String>,

        #[arg(long, env = "GHOST_LLM_MODEL", default_value = "gpt-4o-mini")]
        llm_model: String,
    },

    /// Advance a Ghost Template's governance state (approve/reject/pause/
    /// activate/archive).
    Approve {
        ghost_id: Uuid,

        #[arg(value_enum)]
        action: ApproveAction,

        #[arg(long)]
        decision_note: Option<String>,

        #[arg(long, default_value = "cli-operator")]
        approved_by: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum ApproveAction {
    Approve,
    Reject,
    Pause,
    Activate,
    Archive,
}

impl ApproveAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ApproveAction::Approve => "approve",
            ApproveAction::Reject => "reject",
            ApproveAction::Pause => "pause",
            ApproveAction::Activate => "activate",
            ApproveAction::Archive => "archive",
        }
    }
}
