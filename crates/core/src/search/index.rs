//! Immutable inverted index over event text fields.
//!
//! Scoring follows BM25+ per field, weighted by a per-field boost and by how
//! the index term was derived from the query token (exact, prefix or fuzzy).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;

use crate::store::IndexableEvent;

/// Indexed fields, in `FIELD_BOOSTS` order.
const FIELD_COUNT: usize = 4;

/// Boosts for title, subtitle, summary and description.
const FIELD_BOOSTS: [f64; FIELD_COUNT] = [4.0, 3.0, 2.0, 1.0];

const BM25_K: f64 = 1.2;
const BM25_B: f64 = 0.7;
const BM25_D: f64 = 0.5;

const PREFIX_WEIGHT: f64 = 0.375;
const FUZZY_WEIGHT: f64 = 0.45;

/// Allowed edit distance as a fraction of query token length.
const FUZZY_FRACTION: f64 = 0.2;
const MAX_FUZZY_DISTANCE: usize = 6;

#[derive(Debug, Clone, Copy)]
struct Posting {
    doc: usize,
    field: usize,
    term_freq: u32,
}

#[derive(Debug, Default)]
pub(crate) struct InvertedIndex {
    /// Document position -> event id.
    event_ids: Vec<i64>,
    field_lengths: Vec<[u32; FIELD_COUNT]>,
    avg_field_lengths: [f64; FIELD_COUNT],
    /// Postings per term; one posting per (doc, field) pair.
    terms: BTreeMap<String, Vec<Posting>>,
    /// Number of documents containing each term, per field.
    doc_freqs: HashMap<String, [u32; FIELD_COUNT]>,
}

/// Split text into lowercase alphanumeric tokens.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect()
}

impl InvertedIndex {
    pub(crate) fn build(documents: &[IndexableEvent]) -> Self {
        let mut index = InvertedIndex::default();
        let mut length_totals = [0u64; FIELD_COUNT];

        for (doc, event) in documents.iter().enumerate() {
            index.event_ids.push(event.event_id);
            let fields = [
                &event.title,
                &event.subtitle,
                &event.summary,
                &event.description,
            ];
            let mut lengths = [0u32; FIELD_COUNT];

            for (field, text) in fields.iter().enumerate() {
                let tokens = tokenize(text);
                lengths[field] = tokens.len() as u32;
                length_totals[field] += tokens.len() as u64;

                let mut freqs: HashMap<String, u32> = HashMap::new();
                for token in tokens {
                    *freqs.entry(token).or_insert(0) += 1;
                }
                for (term, term_freq) in freqs {
                    index.doc_freqs.entry(term.clone()).or_insert([0; FIELD_COUNT])[field] += 1;
                    index.terms.entry(term).or_default().push(Posting {
                        doc,
                        field,
                        term_freq,
                    });
                }
            }

            index.field_lengths.push(lengths);
        }

        if !documents.is_empty() {
            for (field, total) in length_totals.iter().enumerate() {
                index.avg_field_lengths[field] = *total as f64 / documents.len() as f64;
            }
        }

        index
    }

    pub(crate) fn document_count(&self) -> usize {
        self.event_ids.len()
    }

    /// Score every document against the query, highest first.
    ///
    /// Ties keep document order.
    pub(crate) fn search(&self, query: &str, limit: usize) -> Vec<(i64, f64)> {
        let mut seen = HashSet::new();
        let query_tokens: Vec<String> = tokenize(query)
            .into_iter()
            .filter(|token| seen.insert(token.clone()))
            .collect();
        if query_tokens.is_empty() || limit == 0 || self.event_ids.is_empty() {
            return Vec::new();
        }

        let mut scores: HashMap<usize, f64> = HashMap::new();
        let mut matched_tokens: HashMap<usize, HashSet<usize>> = HashMap::new();

        for (token_idx, token) in query_tokens.iter().enumerate() {
            for (term, weight) in self.expand(token) {
                for posting in &self.terms[term] {
                    let score = weight * FIELD_BOOSTS[posting.field] * self.bm25(term, posting);
                    *scores.entry(posting.doc).or_insert(0.0) += score;
                    matched_tokens
                        .entry(posting.doc)
                        .or_default()
                        .insert(token_idx);
                }
            }
        }

        // Documents matching more query tokens rank higher.
        let mut results: Vec<(usize, f64)> = scores
            .into_iter()
            .map(|(doc, score)| {
                let quality = matched_tokens.get(&doc).map_or(1, |t| t.len()) as f64;
                (doc, score * quality)
            })
            .collect();

        results.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        results.truncate(limit);
        results
            .into_iter()
            .map(|(doc, score)| (self.event_ids[doc], score))
            .collect()
    }

    /// Index terms derived from a query token, with their match weight.
    fn expand<'a>(&'a self, token: &str) -> Vec<(&'a str, f64)> {
        let query_len = token.chars().count();
        let mut derived: BTreeMap<&'a str, f64> = BTreeMap::new();

        if let Some((term, _)) = self.terms.get_key_value(token) {
            derived.insert(term.as_str(), 1.0);
        }

        let from_token = (Bound::Included(token), Bound::Unbounded);
        for (term, _) in self.terms.range::<str, _>(from_token) {
            if !term.starts_with(token) {
                break;
            }
            let term_len = term.chars().count();
            let distance = term_len.saturating_sub(query_len);
            if distance == 0 {
                continue;
            }
            let weight =
                PREFIX_WEIGHT * term_len as f64 / (term_len as f64 + 0.3 * distance as f64);
            derived.insert(term.as_str(), weight);
        }

        let max_distance =
            ((query_len as f64 * FUZZY_FRACTION).round() as usize).min(MAX_FUZZY_DISTANCE);
        if max_distance > 0 {
            for term in self.terms.keys() {
                if derived.contains_key(term.as_str()) {
                    continue;
                }
                let term_len = term.chars().count();
                if term_len.abs_diff(query_len) > max_distance {
                    continue;
                }
                if let Some(distance) = bounded_levenshtein(token, term, max_distance) {
                    if distance == 0 {
                        continue;
                    }
                    let weight = FUZZY_WEIGHT * term_len as f64 / (term_len + distance) as f64;
                    derived.insert(term.as_str(), weight);
                }
            }
        }

        derived.into_iter().collect()
    }

    fn bm25(&self, term: &str, posting: &Posting) -> f64 {
        let field = posting.field;
        let total = self.event_ids.len() as f64;
        let matching = self.doc_freqs.get(term).map_or(0, |f| f[field]) as f64;
        let inv_doc_freq = (1.0 + (total - matching + 0.5) / (matching + 0.5)).ln();

        let field_length = self.field_lengths[posting.doc][field] as f64;
        let avg_length = self.avg_field_lengths[field].max(f64::EPSILON);
        let tf = posting.term_freq as f64;

        inv_doc_freq
            * (BM25_D
                + tf * (BM25_K + 1.0)
                    / (tf + BM25_K * (1.0 - BM25_B + BM25_B * field_length / avg_length)))
    }
}

/// Levenshtein distance between `a` and `b`, or `None` if it exceeds `max`.
fn bounded_levenshtein(a: &str, b: &str, max: usize) -> Option<usize> {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.len().abs_diff(b_chars.len()) > max {
        return None;
    }
    if a_chars.is_empty() {
        return Some(b_chars.len());
    }
    if b_chars.is_empty() {
        return Some(a_chars.len());
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0usize; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = if a_char == b_char { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
            row_min = row_min.min(curr[j + 1]);
        }
        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[b_chars.len()];
    (distance <= max).then_some(distance)
}
