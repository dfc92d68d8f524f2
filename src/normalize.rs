//! Reading normalizer: turns a loosely-typed Responses API body into a [`Reading`].
//!
//! The remote structured-output feature is not honored on every call, so two
//! reply shapes are accepted:
//!
//! 1. a content item tagged as JSON output, whose embedded object is used as-is;
//! 2. free text (a content item, or the aggregate `output_text` field) that
//!    itself encodes the JSON object.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::reading::Reading;

/// One content item of a response, classified by its `type` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    StructuredJson(Value),
    FreeText(String),
    Other,
}

impl ContentItem {
    pub fn classify(item: &Value) -> Self {
        let tag = item.get("type").and_then(Value::as_str).unwrap_or_default();
        match tag {
            "output_json" | "json" | "json_schema" => {
                let embedded = ["json", "parsed"]
                    .iter()
                    .filter_map(|k| item.get(*k))
                    .find(|v| v.is_object());
                match embedded {
                    Some(v) => ContentItem::StructuredJson(v.clone()),
                    None => ContentItem::Other,
                }
            }
            "output_text" | "text" => match item.get("text").and_then(Value::as_str) {
                Some(t) if !t.trim().is_empty() => ContentItem::FreeText(t.to_string()),
                _ => ContentItem::Other,
            },
            _ => ContentItem::Other,
        }
    }
}

/// All content items in response order: `output[*].content[*]`, plus bare
/// `output[*]` entries that have no `content` array of their own.
pub fn content_items(body: &Value) -> Vec<ContentItem> {
    let Some(output) = body.get("output").and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut items = Vec::new();
    for entry in output {
        match entry.get("content").and_then(Value::as_array) {
            Some(parts) => items.extend(parts.iter().map(ContentItem::classify)),
            None => items.push(ContentItem::classify(entry)),
        }
    }
    items
}

/// Top-level `output_text`: a string, or a list of strings (first one wins).
fn aggregate_text(body: &Value) -> Option<String> {
    let text = match body.get("output_text")? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(list) => list.first().and_then(Value::as_str),
        _ => None,
    }?;
    (!text.trim().is_empty()).then(|| text.to_string())
}

/// Two-tier payload lookup, ending in a candidate object.
pub fn extract_candidate(body: &Value) -> Result<Value, FetchError> {
    let items = content_items(body);

    if let Some(obj) = items.iter().find_map(|it| match it {
        ContentItem::StructuredJson(v) => Some(v.clone()),
        _ => None,
    }) {
        return Ok(obj);
    }

    let text = items
        .into_iter()
        .find_map(|it| match it {
            ContentItem::FreeText(t) => Some(t),
            _ => None,
        })
        .or_else(|| aggregate_text(body))
        .ok_or(FetchError::NoContent)?;

    serde_json::from_str(strip_code_fence(&text)).map_err(FetchError::MalformedJson)
}

/// Strip a surrounding Markdown fence such as ```` ```json ... ``` ````.
fn strip_code_fence(text: &str) -> &str {
    static RE_FENCE: OnceCell<Regex> = OnceCell::new();
    let re = RE_FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n(.*?)\n?\s*```\s*$").expect("fence regex")
    });
    match re.captures(text).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => text.trim(),
    }
}

/// Validate a candidate object into a [`Reading`]. Values are not rewritten.
pub fn validate(candidate: &Value) -> Result<Reading, FetchError> {
    let empty = Map::new();
    let obj = candidate.as_object().unwrap_or(&empty);

    let ppm = obj.get("ppm").and_then(coerce_ppm);
    let source = obj.get("source").and_then(non_empty_str);
    let timestamp = obj.get("timestamp").and_then(non_empty_str);

    match (ppm, source, timestamp) {
        (Some(concentration), Some(source), Some(timestamp)) => Ok(Reading {
            concentration,
            timestamp: timestamp.to_string(),
            source: source.to_string(),
        }),
        (ppm, source, timestamp) => {
            let mut missing = Vec::new();
            if ppm.is_none() {
                missing.push("ppm");
            }
            if source.is_none() {
                missing.push("source");
            }
            if timestamp.is_none() {
                missing.push("timestamp");
            }
            Err(FetchError::Validation { missing })
        }
    }
}

fn coerce_ppm(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n > 0.0).then_some(n)
}

fn non_empty_str(v: &Value) -> Option<&str> {
    v.as_str().filter(|s| !s.trim().is_empty())
}

/// Full normalization: locate the payload, then validate it.
pub fn normalize(body: &Value) -> Result<Reading, FetchError> {
    let candidate = extract_candidate(body)?;
    validate(&candidate)
}
