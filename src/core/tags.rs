use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(?P<tag>[\p{L}\p{N}_-]+)").unwrap());

/// Pull the `#hashtag` tokens out of free text.
///
/// Tags are lowercased and de-duplicated; the returned set has no meaningful
/// order beyond being sorted. Empty input yields an empty set.
pub fn extract_tags(text: &str) -> BTreeSet<String> {
    HASHTAG_RE
        .captures_iter(text)
        .map(|caps| caps["tag"].to_lowercase())
        .collect()
}

/// Normalise a tag typed by hand (filter chips, legacy tag lists).
///
/// A leading `#` is dropped. Returns `None` when nothing usable remains.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().trim_start_matches('#').trim().to_lowercase();
    (!tag.is_empty()).then_some(tag)
}
