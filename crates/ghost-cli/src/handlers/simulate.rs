use anyhow::Result;
use chrono::Utc;
use ghost_privacy::PrivacyPipeline;
use ghost_types::{
    RawContext, RawEvent, RawEventType, RawPayload, SecureEventBatch, TargetInfo, UserAction,
    UserIntPayload,
};
use owo_colors::OwoColorize;
use uuid::Uuid;

/// Generates synthetic click/navigation/fetch traffic, pushes it through the
/// Privacy Pipeline, and posts the resulting batch straight at an
/// `/ingest-events` endpoint — a stand-in for the browser extension's own
/// capture + transmit loop.
pub async fn handle(org_id: &str, device_id: &str, user_id: &str, count: u32, endpoint: &str) -> Result<()> {
    let mut pipeline = PrivacyPipeline::new(org_id, device_id, user_id);
    let session_id = Uuid::new_v4();
    let events: Vec<_> = (0..count).map(|i| pipeline.process(&synthetic_raw_event(session_id, i))).collect();

    let batch = SecureEventBatch { events, device_fingerprint: device_id.to_string(), batch_id: Uuid::new_v4(), sent_at: Utc::now() };

    let response = reqwest::Client::new().post(endpoint).json(&batch).send().await?;
    let status = response.status();
    if status.is_success() {
        println!("{} sent {} events to {}", "ok:".green().bold(), batch.events.len(), endpoint);
    } else {
        let body = response.text().await.unwrap_or_default();
        println!("{} {} responded {} — {}", "warn:".yellow().bold(), endpoint, status, body);
    }
    Ok(())
}

fn synthetic_raw_event(session_id: Uuid, index: u32) -> RawEvent {
    let (action, tag, url) = match index % 3 {
        0 => (UserAction::Click, "button", "https://app.example.com/checkout"),
        1 => (UserAction::Navigate, "a", "https://app.example.com/cart"),
        _ => (UserAction::Input, "input", "https://app.example.com/checkout"),
    };
    RawEvent {
        timestamp: 1_700_000_000_000 + index as u64 * 1_500,
        session_id,
        event_type: RawEventType::UserInt,
        payload: RawPayload::UserInt(UserIntPayload {
            action,
            value: if action == UserAction::Input { Some("user-typed text".to_string()) } else { None },
            target: TargetInfo { tag: tag.to_string(), role: None, input_type: None, in_form: action == UserAction::Input, form_id: None },
        }),
        context: RawContext { url: url.to_string(), viewport: (1280, 800), user_agent: "ghost-simulate".to_string(), tab_id: "tab-1".to_string() },
        element: None,
    }
}
