use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// All extraction strategies failed to produce parseable JSON.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("could not extract valid JSON from response")]
pub struct ExtractionError;

//
// ─── EXTRACTION ────────────────────────────────────────────────────────────────
//

/// A strategy produces a candidate JSON object substring, or nothing.
type Strategy = fn(&str) -> Option<String>;

/// Candidate extraction strategies, tried in order after a strict parse of
/// the whole text. First strategy whose sanitized candidate parses wins.
const STRATEGIES: &[Strategy] = &[fenced_block, brace_span, marker_object];

/// Best-effort extraction of a JSON value from generated text.
///
/// The full text is first parsed as strict JSON. Failing that, each strategy
/// in [`STRATEGIES`] is tried in order; its candidate is sanitized (smart
/// quotes, trailing commas, unquoted/single-quoted keys, single-quoted
/// values), required to span `{`..`}`, and parsed. The first candidate that
/// parses is returned.
///
/// # Errors
///
/// Returns [`ExtractionError`] when every strategy fails.
pub fn extract(raw: &str) -> Result<Value, ExtractionError> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Ok(value);
    }
    tracing::debug!("direct JSON parse failed, attempting extraction");

    for strategy in STRATEGIES {
        let Some(candidate) = strategy(raw) else {
            continue;
        };

        let cleaned = sanitize(&candidate);
        if !(cleaned.starts_with('{') && cleaned.ends_with('}')) {
            continue;
        }

        match serde_json::from_str::<Value>(&cleaned) {
            Ok(value) => {
                tracing::debug!("successfully extracted and parsed JSON");
                return Ok(value);
            }
            Err(err) => {
                tracing::debug!(error = %err, "extracted candidate failed to parse");
            }
        }
    }

    Err(ExtractionError)
}

/// Contents of the first ```json fenced code block.
fn fenced_block(text: &str) -> Option<String> {
    static FENCED: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("valid fenced-block pattern")
    });
    FENCED
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Substring from the first `{` to the last `}`, inclusive.
fn brace_span(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| text[start..=end].to_string())
}

/// Object following one of the literal markers `JSON:`, `Response:`, `Output:`.
fn marker_object(text: &str) -> Option<String> {
    static MARKERS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
        [
            Regex::new(r"(?s)JSON:\s*(\{.*\})").expect("valid JSON marker pattern"),
            Regex::new(r"(?s)Response:\s*(\{.*\})").expect("valid Response marker pattern"),
            Regex::new(r"(?s)Output:\s*(\{.*\})").expect("valid Output marker pattern"),
        ]
    });
    MARKERS
        .iter()
        .find_map(|pattern| pattern.captures(text).map(|caps| caps[1].to_string()))
}

//
// ─── SANITIZATION ──────────────────────────────────────────────────────────────
//

/// Repairs the JSON dialects language models actually emit: typographic
/// quotes, trailing commas, and JavaScript-style object keys and strings.
fn sanitize(candidate: &str) -> String {
    static SMART_DOUBLE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new("[\u{201C}\u{201D}\u{201E}\u{201F}]").expect("valid smart double-quote class")
    });
    static SMART_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new("[\u{2018}\u{2019}\u{201A}\u{201B}]").expect("valid smart single-quote class")
    });
    static TRAILING_COMMA: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid trailing-comma pattern"));
    static SINGLE_QUOTED_KEY: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"([{,]\s*)'([^']*)'\s*:").expect("valid quoted-key pattern"));
    static UNQUOTED_KEY: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)\s*:").expect("valid bare-key pattern")
    });
    static SINGLE_QUOTED_VALUE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r":\s*'([^']*?)'").expect("valid quoted-value pattern"));

    let cleaned = SMART_DOUBLE.replace_all(candidate, "\"");
    let cleaned = SMART_SINGLE.replace_all(&cleaned, "'");
    let cleaned = TRAILING_COMMA.replace_all(&cleaned, "${1}");
    let cleaned = SINGLE_QUOTED_KEY.replace_all(&cleaned, "${1}\"${2}\":");
    let cleaned = UNQUOTED_KEY.replace_all(&cleaned, "${1}\"${2}\":");
    let cleaned = SINGLE_QUOTED_VALUE.replace_all(&cleaned, ": \"${1}\"");
    cleaned.trim().to_string()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
