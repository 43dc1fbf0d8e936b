//! PII Scrubber (4.B): detects and replaces configured entity kinds with
//! stable `[TYPE_N]` tokens, `N` assigned in first-seen order per distinct
//! normalized value within a session.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PiiKind {
    Email,
    Phone,
    Ssn,
    CreditCard,
    IpAddress,
    AuthToken,
    Dob,
}

impl PiiKind {
    pub fn label(self) -> &'static str {
        match self {
            PiiKind::Email => "EMAIL",
            PiiKind::Phone => "PHONE",
            PiiKind::Ssn => "SSN",
            PiiKind::CreditCard => "CREDIT_CARD",
            PiiKind::IpAddress => "IP_ADDRESS",
            PiiKind::AuthToken => "AUTH_TOKEN",
            PiiKind::Dob => "DOB",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PiiMatch {
    pub kind: PiiKind,
    pub start: usize,
    pub end: usize,
    pub raw: String,
}

struct Detector {
    kind: PiiKind,
    regex: &'static Regex,
}

fn detectors() -> &'static Vec<Detector> {
    static DETECTORS: OnceLock<Vec<Detector>> = OnceLock::new();
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    static PHONE: OnceLock<Regex> = OnceLock::new();
    static SSN: OnceLock<Regex> = OnceLock::new();
    static CREDIT_CARD: OnceLock<Regex> = OnceLock::new();
    static IP_ADDRESS: OnceLock<Regex> = OnceLock::new();
    static AUTH_TOKEN: OnceLock<Regex> = OnceLock::new();
    static DOB: OnceLock<Regex> = OnceLock::new();

    DETECTORS.get_or_init(|| {
        vec![
            Detector {
                kind: PiiKind::Email,
                regex: EMAIL.get_or_init(|| {
                    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
                }),
            },
            Detector {
                kind: PiiKind::CreditCard,
                regex: CREDIT_CARD.get_or_init(|| {
                    Regex::new(r"\b(?:\d[ -]?){13,16}\b").unwrap()
                }),
            },
            Detector {
                kind: PiiKind::Ssn,
                regex: SSN.get_or_init(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap()),
            },
            Detector {
                kind: PiiKind::Phone,
                regex: PHONE.get_or_init(|| {
                    Regex::new(r"(\+?1[ -.]?)?\(?\d{3}\)?[ -.]?\d{3}[ -.]?\d{4}\b").unwrap()
                }),
            },
            Detector {
                kind: PiiKind::IpAddress,
                regex: IP_ADDRESS.get_or_init(|| {
                    Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap()
                }),
            },
            Detector {
                kind: PiiKind::AuthToken,
                regex: AUTH_TOKEN.get_or_init(|| {
                    Regex::new(
                        r"(?i)\b(?:bearer|api_key|token|secret|password|auth)\s*[:=]?\s*[A-Za-z0-9._-]{6,}",
                    )
                    .unwrap()
                }),
            },
            Detector {
                kind: PiiKind::Dob,
                regex: DOB.get_or_init(|| {
                    Regex::new(r"\b\d{4}-\d{2}-\d{2}\b|\b\d{1,2}/\d{1,2}/\d{2,4}\b").unwrap()
                }),
            },
        ]
    })
}

/// Lowercases and strips spaces, dashes, and dots — the normalization used to
/// key the first-seen counter table (4.B).
fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '.')
        .collect::<String>()
        .to_lowercase()
}

/// Per-session counter table assigning each distinct normalized PII value a
/// stable `[TYPE_N]` token. Reset on session rotation (4.B, 4.E `reset()`).
#[derive(Debug, Default)]
pub struct Scrubber {
    counters: HashMap<PiiKind, u32>,
    tokens: HashMap<(PiiKind, String), String>,
}

impl Scrubber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.counters.clear();
        self.tokens.clear();
    }

    /// Raw, possibly-overlapping matches across all detectors, longest-wins
    /// then earliest-wins on overlap.
    pub fn detect(&self, text: &str) -> Vec<PiiMatch> {
        let mut raw_matches: Vec<PiiMatch> = Vec::new();
        for detector in detectors() {
            for m in detector.regex.find_iter(text) {
                raw_matches.push(PiiMatch {
                    kind: detector.kind,
                    start: m.start(),
                    end: m.end(),
                    raw: m.as_str().to_string(),
                });
            }
        }
        raw_matches.sort_by_key(|m| (m.start, std::cmp::Reverse(m.end - m.start)));

        let mut kept: Vec<PiiMatch> = Vec::new();
        for candidate in raw_matches {
            let overlaps = kept.iter().position(|k| candidate.start < k.end && k.start < candidate.end);
            match overlaps {
                None => kept.push(candidate),
                Some(idx) => {
                    let existing = &kept[idx];
                    let existing_len = existing.end - existing.start;
                    let candidate_len = candidate.end - candidate.start;
                    if candidate_len > existing_len
                        || (candidate_len == existing_len && candidate.start < existing.start)
                    {
                        kept[idx] = candidate;
                    }
                }
            }
        }
        kept.sort_by_key(|m| m.start);
        kept
    }

    pub fn contains_pii(&self, text: &str) -> bool {
        !self.detect(text).is_empty()
    }

    fn token_for(&mut self, kind: PiiKind, raw: &str) -> String {
        let key = (kind, normalize(raw));
        if let Some(existing) = self.tokens.get(&key) {
            return existing.clone();
        }
        let counter = self.counters.entry(kind).or_insert(0);
        let token = format!("[{}_{}]", kind.label(), *counter);
        *counter += 1;
        self.tokens.insert(key, token.clone());
        token
    }

    /// Replaces every detected entity with its stable token. Malformed input
    /// never raises; text with no matches is returned unchanged (4.B).
    pub fn scrub(&mut self, text: &str) -> String {
        let matches = self.detect(text);
        if matches.is_empty() {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0usize;
        for m in matches {
            out.push_str(&text[cursor..m.start]);
            out.push_str(&self.token_for(m.kind, &m.raw));
            cursor = m.end;
        }
        out.push_str(&text[cursor..]);
        out
    }
}
