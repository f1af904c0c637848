//! Word-frequency aggregation over collected page texts
//!
//! # Algorithm
//!
//! 1. Tokenize: lowercase, replace every character that is not a word
//!    character, number or whitespace with a space, split on whitespace,
//!    drop tokens made only of decimal digits
//! 2. Count tokens over all texts
//! 3. Drop words on the ignore list (case-insensitive)
//! 4. Compute each word's share of the remaining total
//! 5. Optionally keep only the most frequent `100 - percentile` percent

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\p{N}\s]").unwrap());
/// Unicode decimal digits (category Nd) only
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

/// Occurrence statistics for one word
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WordFrequency {
    pub count: u64,

    /// Share of all counted words after ignore-list removal, in `[0, 100]`
    pub percentage: f64,
}

/// Word to frequency mapping
pub type FrequencyTable = HashMap<String, WordFrequency>;

/// Splits text into lowercase word tokens
///
/// # Example
///
/// ```
/// use wiki_ripple::frequency::tokenize;
///
/// assert_eq!(tokenize("Hello, world! 123"), vec!["hello", "world"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_WORD
        .replace_all(&lowered, " ")
        .split_whitespace()
        .filter(|token| !DIGITS.is_match(token))
        .map(str::to_string)
        .collect()
}

/// Calculates word frequencies over `texts`
///
/// # Arguments
///
/// * `texts` - Page texts; order does not matter
/// * `ignore_list` - Words to exclude, compared case-insensitively
/// * `percentile` - If given (0-100), keep only the words ranked above this
///   percentile by count; `0` keeps all, `100` keeps none
///
/// # Returns
///
/// The frequency table; empty when no words remain
pub fn calculate<S: AsRef<str>>(
    texts: &[S],
    ignore_list: Option<&[String]>,
    percentile: Option<u8>,
) -> FrequencyTable {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for text in texts {
        for token in tokenize(text.as_ref()) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }

    if let Some(ignore_list) = ignore_list {
        let ignored: HashSet<String> = ignore_list
            .iter()
            .map(|word| word.trim().to_lowercase())
            .collect();
        counts.retain(|word, _| !ignored.contains(word));
    }

    let total: u64 = counts.values().sum();
    if total == 0 {
        return FrequencyTable::new();
    }

    let mut table: FrequencyTable = counts
        .into_iter()
        .map(|(word, count)| {
            let percentage = count as f64 / total as f64 * 100.0;
            (word, WordFrequency { count, percentage })
        })
        .collect();

    if let Some(percentile) = percentile {
        table = filter_by_percentile(table, percentile);
    }

    tracing::debug!(
        "Calculated frequencies: {} texts, {} words counted, {} unique kept",
        texts.len(),
        total,
        table.len()
    );

    table
}

fn filter_by_percentile(table: FrequencyTable, percentile: u8) -> FrequencyTable {
    let percentile = usize::from(percentile.min(100));
    let unique = table.len();
    let cutoff = unique * percentile / 100;

    let mut ranked: Vec<(String, WordFrequency)> = table.into_iter().collect();
    sort_ranked(&mut ranked);
    ranked.truncate(unique - cutoff);

    ranked.into_iter().collect()
}

/// Returns the table's entries ordered by count descending, then word
pub fn sorted_by_count(table: &FrequencyTable) -> Vec<(&str, WordFrequency)> {
    let mut entries: Vec<(&str, WordFrequency)> = table
        .iter()
        .map(|(word, frequency)| (word.as_str(), *frequency))
        .collect();
    entries.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(b.0)));
    entries
}

fn sort_ranked(entries: &mut [(String, WordFrequency)]) {
    entries.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(&b.0)));
}
