//! Element Fingerprinter (4.A).
//!
//! Capture-surface concerns (DOM observation, MutationObserver wiring) are
//! out of scope here; this module takes the raw facts a capture surface would
//! have already read off an element and turns them into the stable
//! [`ElementFingerprint`] the rest of the pipeline operates on.

use ghost_types::{AriaInfo, ElementContext, ElementFingerprint, Position};

use crate::hashing::simhash128_hex;

/// One ancestor on the path from an element up to (but not including) the
/// document root, ordered element-to-root as a real DOM walk would produce it.
#[derive(Debug, Clone)]
pub struct AncestorNode {
    pub tag: String,
    pub role: Option<String>,
}

/// Raw facts about one element, as read by a capture surface immediately
/// before fingerprinting. Everything here is plain data; no live DOM handle.
#[derive(Debug, Clone)]
pub struct ElementObservation {
    pub tag_name: String,
    pub aria: AriaInfo,
    /// Text of direct child text nodes only, not descendants.
    pub direct_text_nodes: Vec<String>,
    /// Ancestors ordered element-to-root, document root (`<html>`) included;
    /// it is filtered out when building the path.
    pub ancestors: Vec<AncestorNode>,
    pub rect: (i32, i32, i32, i32),
    pub viewport: (i32, i32),
    pub parent_tag: Option<String>,
    pub parent_role: Option<String>,
    pub parent_text: Option<String>,
    pub sibling_count: usize,
    pub sibling_index: usize,
    pub prev_sibling_tag: Option<String>,
    pub next_sibling_tag: Option<String>,
    pub input_type_attr: Option<String>,
    pub form_id: Option<String>,
}

fn format_path_segment(tag: &str, role: Option<&str>) -> String {
    match role {
        Some(r) if !r.is_empty() => format!("{}[role={}]", tag.to_lowercase(), r),
        _ => tag.to_lowercase(),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        s.chars().take(max).collect()
    } else {
        s.to_string()
    }
}

fn resolve_input_type(tag_name: &str, input_type_attr: Option<&str>) -> Option<String> {
    match tag_name.to_lowercase().as_str() {
        "input" => Some(
            input_type_attr
                .map(|s| s.to_lowercase())
                .unwrap_or_else(|| "text".to_string()),
        ),
        "select" => Some("select".to_string()),
        "textarea" => Some("textarea".to_string()),
        _ => None,
    }
}

fn text_for_hash(obs: &ElementObservation) -> String {
    let tag = obs.tag_name.to_lowercase();
    if tag == "input" || tag == "textarea" {
        "[input]".to_string()
    } else {
        obs.direct_text_nodes.join(" ").trim().to_lowercase()
    }
}

/// Builds the stable [`ElementFingerprint`] for an observed element. Pure and
/// deterministic: identical `(element, viewport)` facts always produce an
/// identical fingerprint (§8).
pub fn fingerprint_element(obs: &ElementObservation) -> ElementFingerprint {
    let mut dom_path: Vec<String> = obs
        .ancestors
        .iter()
        .rev()
        .filter(|a| !a.tag.eq_ignore_ascii_case("html"))
        .map(|a| format_path_segment(&a.tag, a.role.as_deref()))
        .collect();
    dom_path.push(format_path_segment(&obs.tag_name, obs.aria.role.as_deref()));

    let text_hash = simhash128_hex(&text_for_hash(obs));
    let raw_text = obs.direct_text_nodes.join(" ");
    let text_preview = truncate_chars(raw_text.trim(), 200);

    let (x, y, w, h) = obs.rect;
    let (vw, vh) = obs.viewport;
    let position = Position::from_rect(x, y, w, h, vw, vh);

    let context = ElementContext {
        parent_tag: obs.parent_tag.clone(),
        parent_role: obs.parent_role.clone(),
        parent_text: obs.parent_text.as_deref().map(|t| truncate_chars(t.trim(), 100)),
        sibling_count: obs.sibling_count,
        sibling_index: obs.sibling_index,
        prev_sibling_tag: obs.prev_sibling_tag.clone(),
        next_sibling_tag: obs.next_sibling_tag.clone(),
    };

    ElementFingerprint {
        aria: obs.aria.clone(),
        text_hash,
        text_preview,
        position,
        dom_path,
        tag_name: obs.tag_name.clone(),
        context,
        input_type: resolve_input_type(&obs.tag_name, obs.input_type_attr.as_deref()),
        form_id: obs.form_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_observation() -> ElementObservation {
        ElementObservation {
            tag_name: "button".to_string(),
            aria: AriaInfo {
                role: None,
                label: Some("Submit".to_string()),
                describe_by: None,
                expanded: None,
                checked: None,
                selected: None,
            },
            direct_text_nodes: vec!["Submit".to_string()],
            ancestors: vec![
                AncestorNode { tag: "div".to_string(), role: Some("group".to_string()) },
                AncestorNode { tag: "form".to_string(), role: None },
                AncestorNode { tag: "body".to_string(), role: None },
                AncestorNode { tag: "html".to_string(), role: None },
            ],
            rect: (10, 20, 100, 40),
            viewport: (1280, 800),
            parent_tag: Some("div".to_string()),
            parent_role: Some("group".to_string()),
            parent_text: None,
            sibling_count: 2,
            sibling_index: 0,
            prev_sibling_tag: None,
            next_sibling_tag: Some("span".to_string()),
            input_type_attr: None,
            form_id: Some("checkout-form".to_string()),
        }
    }

    #[test]
    fn fingerprint_is_deterministic_for_identical_input() {
        let obs = sample_observation();
        let a = fingerprint_element(&obs);
        let b = fingerprint_element(&obs);
        assert_eq!(a.text_hash, b.text_hash);
        assert_eq!(a.dom_path, b.dom_path);
    }

    #[test]
    fn dom_path_excludes_html_and_is_rooted_first() {
        let obs = sample_observation();
        let fp = fingerprint_element(&obs);
        assert!(!fp.dom_path.iter().any(|seg| seg == "html"));
        assert_eq!(fp.dom_path.first().unwrap(), "body");
        assert_eq!(fp.dom_path.last().unwrap(), "button");
    }

    #[test]
    fn input_type_defaults_to_text() {
        let mut obs = sample_observation();
        obs.tag_name = "input".to_string();
        obs.input_type_attr = None;
        let fp = fingerprint_element(&obs);
        assert_eq!(fp.input_type.as_deref(), Some("text"));
    }
}
