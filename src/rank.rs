//! Score filtering and ordering.
//!
//! Turns raw listing records into ranked [`Item`]s: parse the score
//! annotation, drop anything unparsable or at/below the threshold, and sort
//! by score descending. Pure; no I/O and no shared state.

use crate::models::{Item, RawRecord};

/// Items must score strictly above this to be kept.
pub const SCORE_THRESHOLD: u32 = 100;

/// Ranks `records` against [`SCORE_THRESHOLD`].
pub fn rank(records: Vec<RawRecord>) -> Vec<Item> {
    rank_with_threshold(records, SCORE_THRESHOLD)
}

/// Ranks `records`, keeping only those scoring strictly above `threshold`.
///
/// The sort is stable, so items with equal scores keep their source order.
pub fn rank_with_threshold(records: Vec<RawRecord>, threshold: u32) -> Vec<Item> {
    let mut items: Vec<Item> = records
        .into_iter()
        .filter_map(|record| {
            let score = parse_score(record.score_text.as_deref()?)?;
            (score > threshold).then(|| Item {
                title: record.title,
                link: record.link,
                score,
            })
        })
        .collect();

    items.sort_by(|a, b| b.score.cmp(&a.score));
    items
}

/// Parses a score annotation such as `"150 points"` or `"1 point"`.
///
/// Returns `None` for anything that is not a non-negative integer once the
/// unit word is stripped.
pub fn parse_score(text: &str) -> Option<u32> {
    let text = text.trim();
    let number = text
        .strip_suffix("points")
        .or_else(|| text.strip_suffix("point"))
        .unwrap_or(text)
        .trim();
    number.parse().ok()
}
