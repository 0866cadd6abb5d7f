//! Listing page parser.
//!
//! Extracts `(title, link, score)` triples from a Hacker News style listing.
//! Each entry's `.titleline > a` anchor is paired positionally with the
//! `.subtext` row that follows it; the row's `.score` span, if any, becomes
//! the record's score annotation. Rows without a score (job postings) yield
//! `score_text: None` and are left for the ranker to drop.

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::escape::{resolve_html5_entity, unescape_with};
use regex::Regex;

use crate::models::RawRecord;

static TITLE_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)class=["']titleline["'][^>]*>\s*<a\s([^>]*)>(.*?)</a>"#)
        .expect("valid titleline pattern")
});

static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid href pattern"));

static SUBTEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class=["']subtext["']"#).expect("valid subtext pattern"));

static SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<span\s+class=["']score["'][^>]*>(.*?)</span>"#).expect("valid score pattern")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));

/// Parses a listing document into raw records, in page order.
pub fn parse_listing(html: &str) -> Vec<RawRecord> {
    let subtext_starts: Vec<usize> = SUBTEXT.find_iter(html).map(|m| m.start()).collect();
    let scores: Vec<Option<String>> = subtext_starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = subtext_starts.get(i + 1).copied().unwrap_or(html.len());
            SCORE
                .captures(&html[start..end])
                .map(|c| decode_entities(c[1].trim()))
        })
        .collect();

    TITLE_ANCHOR
        .captures_iter(html)
        .enumerate()
        .map(|(idx, caps)| {
            let link = HREF
                .captures(&caps[1])
                .and_then(|h| h.get(1).or_else(|| h.get(2)))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            let title = decode_entities(TAG.replace_all(&caps[2], "").trim());
            RawRecord {
                title,
                link,
                score_text: scores.get(idx).cloned().flatten(),
            }
        })
        .collect()
}

/// Decodes HTML5 named and numeric character references in listing text.
///
/// Text that is not a well-formed reference sequence (a bare `&`, an
/// unknown entity name) is returned as-is.
pub fn decode_entities(text: &str) -> String {
    unescape_with(text, resolve_html5_entity)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| text.to_string())
}
