use crate::llm::RawExplanation;
use anyhow::Context;
use serde_json::Value;

/// Pulls the JSON object out of a model reply: an optional Markdown fence (with or without a
/// language tag or newline) is stripped, then the span from the first `{` to the last `}` is kept.
pub fn extract_json(text: &str) -> Option<String> {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.strip_suffix("```").unwrap_or(rest);
    }

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (start < end).then(|| body[start..=end].to_string())
}

#[derive(Debug, Clone, Default)]
pub struct ParsedExplanations {
    pub model_name: Option<String>,
    pub results: Vec<RawExplanation>,
}

/// Parses the explainer's text output.
///
/// The whole document must be a JSON object with a `results` array; anything else is an
/// error. Individual entries that are not objects are skipped.
pub fn parse_explanations(text: &str) -> anyhow::Result<ParsedExplanations> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    let doc = serde_json::from_str::<Value>(&json_str)
        .with_context(|| format!("explainer output is not valid JSON: {json_str}"))?;

    let results = doc
        .get("results")
        .and_then(Value::as_array)
        .context("explainer output has no `results` array")?;

    let mut out = Vec::with_capacity(results.len());
    for item in results {
        match item.as_object() {
            Some(obj) => out.push(RawExplanation::from_object(obj)),
            None => tracing::debug!(%item, "skipping non-object explainer result"),
        }
    }

    Ok(ParsedExplanations {
        model_name: doc
            .get("model_name")
            .and_then(Value::as_str)
            .map(str::to_string),
        results: out,
    })
}
