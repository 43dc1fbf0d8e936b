use serde::{Deserialize, Serialize};

/// Accessible-role/ARIA facts captured for an element (§3 Element Fingerprint).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AriaInfo {
    pub role: Option<String>,
    pub label: Option<String>,
    pub describe_by: Option<String>,
    pub expanded: Option<bool>,
    pub checked: Option<bool>,
    pub selected: Option<bool>,
}

/// Bounding-box and viewport-relative position, already clamped to [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub vw: i32,
    pub vh: i32,
    pub rel_x: f64,
    pub rel_y: f64,
}

impl Position {
    /// Build from a raw bounding rect + viewport, clamping relX/relY to [0,1] (4.A).
    pub fn from_rect(x: i32, y: i32, w: i32, h: i32, vw: i32, vh: i32) -> Self {
        let rel_x = if vw > 0 { (x as f64 / vw as f64).clamp(0.0, 1.0) } else { 0.0 };
        let rel_y = if vh > 0 { (y as f64 / vh as f64).clamp(0.0, 1.0) } else { 0.0 };
        Self { x, y, w, h, vw, vh, rel_x, rel_y }
    }
}

/// Immediate DOM surroundings of the element (§3 Element Fingerprint context).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementContext {
    pub parent_tag: Option<String>,
    pub parent_role: Option<String>,
    /// Truncated to 100 chars (4.B scrubbing happens upstream of transmission, not here).
    pub parent_text: Option<String>,
    pub sibling_count: usize,
    pub sibling_index: usize,
    pub prev_sibling_tag: Option<String>,
    pub next_sibling_tag: Option<String>,
}

/// Stable multi-factor semantic ID for an observed element (§3, 4.A).
///
/// Deterministic given (element, viewport); total — never throws for detached
/// elements, since every producing function returns a best-effort value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementFingerprint {
    pub aria: AriaInfo,
    /// 128-bit simhash over lowercased, trimmed direct-text 3-shingles, lowercase hex.
    pub text_hash: String,
    /// Pre-scrub preview, capped at 200 chars. Never transmitted past the boundary (4.E).
    pub text_preview: String,
    pub position: Position,
    /// Root-to-element path, e.g. `["html", "body", "div[role=main]", "button"]`.
    /// Non-empty; excludes `<html>` per 4.A (kept here as the walk's terminus marker
    /// is trimmed by the caller before this struct is built).
    pub dom_path: Vec<String>,
    pub tag_name: String,
    pub context: ElementContext,
    pub input_type: Option<String>,
    pub form_id: Option<String>,
}

impl ElementFingerprint {
    /// §3 invariant: domPath is non-empty.
    pub fn is_valid(&self) -> bool {
        !self.dom_path.is_empty() && !self.tag_name.is_empty()
    }
}
