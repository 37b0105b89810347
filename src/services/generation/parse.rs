use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::SuggestionCandidate,
};

use super::{MAX_REASON_WORDS, MAX_SUGGESTIONS};

/// Parses a model reply into suggestion candidates
///
/// The reply must contain a JSON array; code fences and chatter around it are
/// ignored, including bracketed asides that are not JSON. Entries without a
/// non-empty `title` and a string `reason`, or with a `year` that is not
/// number-like, are dropped. Reasons are clipped to
/// `MAX_REASON_WORDS` words and at most `MAX_SUGGESTIONS` entries are kept.
pub fn parse_candidates(raw: &str) -> AppResult<Vec<SuggestionCandidate>> {
    let entries = extract_array(raw)
        .ok_or_else(|| AppError::Generation("Reply contained no JSON array".to_string()))?;

    let total = entries.len();
    let candidates: Vec<SuggestionCandidate> = entries
        .into_iter()
        .filter_map(candidate_from_value)
        .take(MAX_SUGGESTIONS)
        .collect();

    if candidates.len() < total.min(MAX_SUGGESTIONS) {
        tracing::warn!(
            total,
            kept = candidates.len(),
            "Dropped malformed suggestion entries"
        );
    }

    Ok(candidates)
}

/// First complete JSON array in the reply that holds at least one object,
/// falling back to the first array of any kind
fn extract_array(raw: &str) -> Option<Vec<Value>> {
    let mut arrays = raw
        .char_indices()
        .filter(|&(_, c)| c == '[')
        .filter_map(|(start, _)| {
            serde_json::Deserializer::from_str(&raw[start..])
                .into_iter::<Vec<Value>>()
                .next()
                .and_then(Result::ok)
        });

    let first = arrays.next()?;
    if first.iter().any(Value::is_object) {
        return Some(first);
    }
    Some(arrays.find(|a| a.iter().any(Value::is_object)).unwrap_or(first))
}

/// Integer years, also when sent as `1995.0`
fn year_from_number(n: &serde_json::Number) -> Option<i32> {
    match n.as_i64() {
        Some(year) => i32::try_from(year).ok(),
        None => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && (i32::MIN as f64..=i32::MAX as f64).contains(f))
            .map(|f| f as i32),
    }
}

fn candidate_from_value(value: Value) -> Option<SuggestionCandidate> {
    let entry = value.as_object()?;

    let title = entry.get("title")?.as_str()?.trim();
    if title.is_empty() {
        return None;
    }

    let year = match entry.get("year") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(year_from_number(n)?),
        Some(Value::String(s)) => Some(s.trim().parse::<i32>().ok()?),
        Some(_) => return None,
    };

    let reason = clip_words(entry.get("reason")?.as_str()?, MAX_REASON_WORDS);

    Some(SuggestionCandidate {
        title: title.to_string(),
        year,
        reason,
    })
}

fn clip_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}
