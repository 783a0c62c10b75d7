//! Score extraction from free-text provider replies.

use regex::Regex;
use std::sync::LazyLock;

/// First number that looks like a score: 0, 1, 0.x, 1.x or .x
static SCORE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([01](?:\.\d+)?|0?\.\d+)").expect("score pattern is valid"));

/// Pull a score in [0, 1] out of a reply.
///
/// Only the first candidate is considered. A reply that mentions some other
/// number first ("1 point: 0.8") yields that number; callers accept this.
pub fn extract_score(reply: Option<&str>) -> Option<f64> {
    let text = reply?;
    let candidate = SCORE_PATTERN.captures(text)?.get(1)?.as_str();
    let value: f64 = candidate.parse().ok()?;
    (0.0..=1.0).contains(&value).then_some(value)
}
