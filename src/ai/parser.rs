use serde::de::Error as _;
use serde::Deserialize;
use serde_json::Value;

use crate::models::ParsedRewrite;

#[derive(Debug, Deserialize)]
struct RewriteReply {
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    rewritten_article: String,
}

/// Decode a model reply into its three fields.
///
/// Never fails: a reply that is not a JSON object with string fields yields
/// empty fields.
pub fn parse_rewrite(raw: &str) -> ParsedRewrite {
    let cleaned = strip_code_fence(raw);

    match decode(cleaned) {
        Ok(reply) => ParsedRewrite {
            title: reply.title,
            summary: reply.summary,
            rewritten_article: reply.rewritten_article,
        },
        Err(e) => {
            tracing::debug!(
                error = %e,
                reply = %truncate_for_log(cleaned, 200),
                "model reply is not a rewrite object"
            );
            ParsedRewrite::default()
        }
    }
}

fn decode(cleaned: &str) -> serde_json::Result<RewriteReply> {
    let value: Value = serde_json::from_str(cleaned)?;
    if !value.is_object() {
        return Err(serde_json::Error::custom("top level is not an object"));
    }
    serde_json::from_value(value)
}

/// First `max_chars` characters of `text`, marked when cut.
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let mut cleaned = raw.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest.trim();
    }
    if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest.trim();
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest.trim();
    }
    cleaned
}
