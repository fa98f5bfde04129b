//! Fuzzy Matcher
//!
//! Scores how well a query matches candidate text and ranks in-memory
//! collections for search boxes. Tolerates typos, partial matches, and
//! characters matched out of adjacency (but never out of order).

use std::borrow::Cow;
use std::cmp::Ordering;
use tracing::debug;

/// Field names probed when no explicit search fields are configured
pub const COMMON_FIELDS: &[&str] = &[
    "name",
    "title",
    "description",
    "email",
    "id",
    "label",
    "text",
    "content",
];

/// Options controlling scoring and filtering
#[derive(Debug, Clone)]
pub struct FuzzyOptions {
    /// Minimum score (0-1) an item must reach to be kept. Lower values
    /// tolerate heavier typos.
    pub threshold: f32,
    /// Case-fold both sides before comparing
    pub ignore_case: bool,
    /// Whether a bare substring hit counts as a match
    pub allow_partial: bool,
    /// Record fields to score; empty falls back to `COMMON_FIELDS`
    pub search_fields: Vec<String>,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            ignore_case: true,
            allow_partial: true,
            search_fields: Vec::new(),
        }
    }
}

impl FuzzyOptions {
    /// Options scoped to the given record fields
    pub fn with_fields(fields: &[&str]) -> Self {
        Self {
            search_fields: fields.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }
}

/// Resolves a named field of a record to searchable text.
///
/// This is the static seam replacing reflective field probing: plain
/// strings resolve to themselves whatever the field name, JSON objects
/// resolve string-valued keys, and domain types implement it directly.
pub trait SearchRecord {
    fn field_text(&self, field: &str) -> Option<Cow<'_, str>>;
}

impl SearchRecord for str {
    fn field_text(&self, _field: &str) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }
}

impl SearchRecord for String {
    fn field_text(&self, _field: &str) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.as_str()))
    }
}

impl SearchRecord for &str {
    fn field_text(&self, _field: &str) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }
}

/// Non-string values never contribute to a score
impl SearchRecord for serde_json::Value {
    fn field_text(&self, field: &str) -> Option<Cow<'_, str>> {
        self.get(field).and_then(|v| v.as_str()).map(Cow::Borrowed)
    }
}

/// Calculate the match score between `query` and `text`.
///
/// Returns a score between 0 and 1, where 1 is a perfect match. Rules are
/// applied in order: empty query matches everything (1), empty text
/// matches nothing (0), exact match (1), prefix (0.9), substring (0.8),
/// otherwise a greedy in-order character walk weighted by match ratio,
/// longest consecutive run, and how early in the text matching finished.
pub fn fuzzy_score(query: &str, text: &str, options: &FuzzyOptions) -> f32 {
    let normalized_query = if options.ignore_case {
        query.to_lowercase()
    } else {
        query.to_string()
    };
    let normalized_query = normalized_query.trim();
    let normalized_text = if options.ignore_case {
        text.to_lowercase()
    } else {
        text.to_string()
    };

    if normalized_query.is_empty() {
        return 1.0;
    }
    if normalized_text.is_empty() {
        return 0.0;
    }

    if normalized_text == normalized_query {
        return 1.0;
    }

    if normalized_text.starts_with(normalized_query) {
        return 0.9;
    }

    if options.allow_partial && normalized_text.contains(normalized_query) {
        return 0.8;
    }

    // Greedy walk over scalar values, consuming query characters in order
    let query_chars: Vec<char> = normalized_query.chars().collect();
    let text_chars: Vec<char> = normalized_text.chars().collect();

    let mut query_index = 0usize;
    let mut text_index = 0usize;
    let mut matches = 0usize;
    let mut consecutive = 0usize;
    let mut max_consecutive = 0usize;

    while text_index < text_chars.len() && query_index < query_chars.len() {
        if text_chars[text_index] == query_chars[query_index] {
            matches += 1;
            consecutive += 1;
            max_consecutive = max_consecutive.max(consecutive);
            query_index += 1;
        } else {
            consecutive = 0;
        }
        text_index += 1;
    }

    // Query must be a full subsequence of the text
    if query_index < query_chars.len() {
        return 0.0;
    }

    let query_len = query_chars.len() as f32;
    let text_len = text_chars.len() as f32;
    let match_ratio = matches as f32 / query_len;
    let consecutive_bonus = max_consecutive as f32 / query_len * 0.2;
    let position_bonus = if matches > 0 {
        (text_len - text_index as f32) / text_len * 0.1
    } else {
        0.0
    };

    (match_ratio * 0.7 + consecutive_bonus + position_bonus).min(1.0)
}

/// Filter and rank `items` by their best field score against `query`.
///
/// Fields come from `options.search_fields`, falling back to
/// `COMMON_FIELDS` when none are configured. Items scoring below the
/// threshold are dropped; equal scores keep input order. A blank query
/// returns everything unfiltered.
pub fn fuzzy_search<'a, T: SearchRecord>(
    items: &'a [T],
    query: &str,
    options: &FuzzyOptions,
) -> Vec<&'a T> {
    rank(items, query, options, |item| {
        let mut best = 0.0f32;
        if options.search_fields.is_empty() {
            for field in COMMON_FIELDS {
                if let Some(value) = item.field_text(field) {
                    best = best.max(fuzzy_score(query, &value, options));
                }
            }
        } else {
            for field in &options.search_fields {
                if let Some(value) = item.field_text(field) {
                    best = best.max(fuzzy_score(query, &value, options));
                }
            }
        }
        best
    })
}

/// Filter and rank with a caller-supplied accessor instead of named
/// fields. An accessor returning `None` scores the item 0.
pub fn fuzzy_search_by<'a, T, F>(
    items: &'a [T],
    query: &str,
    get_field_value: F,
    options: &FuzzyOptions,
) -> Vec<&'a T>
where
    F: Fn(&T) -> Option<String>,
{
    rank(items, query, options, |item| {
        get_field_value(item)
            .map(|value| fuzzy_score(query, &value, options))
            .unwrap_or(0.0)
    })
}

fn rank<'a, T, F>(items: &'a [T], query: &str, options: &FuzzyOptions, score_item: F) -> Vec<&'a T>
where
    F: Fn(&T) -> f32,
{
    if query.trim().is_empty() {
        return items.iter().collect();
    }

    let mut hits: Vec<(f32, &T)> = Vec::new();
    for item in items {
        let score = score_item(item);
        if score >= options.threshold {
            hits.push((score, item));
        }
    }

    // sort_by is stable, so equal scores retain input order
    hits.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    debug!(
        "🔍 fuzzy search '{}': kept {} of {} items",
        query.trim(),
        hits.len(),
        items.len()
    );

    hits.into_iter().map(|(_, item)| item).collect()
}
