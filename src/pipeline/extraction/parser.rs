use serde::Deserialize;
use tracing::warn;

use crate::models::{AnalysisOutcome, ChallengeAnalysis, Urgency};

/// One element of the oracle's extraction array, as it appears on the wire.
#[derive(Debug, Deserialize)]
struct RawChallengeItem {
    challenge: String,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    urgency: Urgency,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Parse the oracle's generated text into challenge texts plus structured
/// analysis. The decision between structured and degraded is made here,
/// exactly once: callers get either a list of valid items or the raw text
/// carried as a single fallback challenge.
pub fn parse_extraction(raw: &str) -> (Vec<String>, AnalysisOutcome) {
    let candidate = extract_json_block(raw).unwrap_or_else(|| raw.trim());

    let items: Vec<serde_json::Value> = match serde_json::from_str(candidate) {
        Ok(serde_json::Value::Array(items)) => items,
        Ok(_) | Err(_) => {
            warn!("Extraction output is not a JSON array, degrading");
            return degraded(raw);
        }
    };

    // Lenient per-item parse: a malformed element is skipped, not fatal.
    let mut challenges = Vec::new();
    let mut analyses = Vec::new();
    for item in items {
        match serde_json::from_value::<RawChallengeItem>(item) {
            Ok(parsed) if !parsed.challenge.trim().is_empty() => {
                challenges.push(parsed.challenge.trim().to_string());
                analyses.push(ChallengeAnalysis {
                    categories: parsed.categories,
                    urgency: parsed.urgency,
                    keywords: parsed.keywords,
                });
            }
            Ok(_) => warn!("Skipping extraction item with empty challenge text"),
            Err(e) => warn!(error = %e, "Skipping malformed extraction item"),
        }
    }

    if challenges.is_empty() {
        warn!("No valid items in extraction output, degrading");
        return degraded(raw);
    }

    (challenges, AnalysisOutcome::Structured { items: analyses })
}

fn degraded(raw: &str) -> (Vec<String>, AnalysisOutcome) {
    let fallback = if raw.trim().is_empty() {
        "No challenges could be extracted".to_string()
    } else {
        raw.trim().to_string()
    };
    (
        vec![fallback],
        AnalysisOutcome::Degraded {
            raw: raw.trim().to_string(),
        },
    )
}

/// Pull the contents of the first fenced code block out of `raw`, if any.
/// Oracles often wrap JSON in ```json fences despite instructions.
pub(crate) fn extract_json_block(raw: &str) -> Option<&str> {
    let start = raw.find("```")?;
    let after_fence = &raw[start + 3..];
    let body_start = after_fence.find('\n')?;
    let body = &after_fence[body_start + 1..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}
