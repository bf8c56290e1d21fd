//! Free-text vote extraction.
//!
//! Turns noisy line-oriented text (typically OCR output) into a mapping of
//! catalog candidate names to counts. Candidate names are resolved with
//! case-insensitive Levenshtein matching so small recognition errors still
//! land on the right candidate; lines with no plausible candidate are
//! dropped with a diagnostic, never surfaced individually to the user.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Maximum edit distance for an extracted name to be accepted as a match.
pub const MAX_NAME_DISTANCE: usize = 2;

/// Pattern: `<name part><separator><digits with optional thousands commas>`.
/// The name part is letters/spaces/periods/hyphens; the separator is a colon
/// and/or whitespace. Anchored at the start of the line only, trailing noise
/// is tolerated.
static LINE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z.\-\s]+)[:\s]+([\d,]+)").expect("valid line pattern"));

/// Extracts candidate counts from free text.
///
/// Pure function of (text, candidates): re-running on the same input yields
/// the same mapping. An empty result means extraction failed and the caller
/// should fall back to manual entry.
///
/// When two lines resolve to the same candidate the later line wins; when
/// two candidates share the minimum edit distance the first in catalog
/// order wins. Both rules are deliberate and deterministic.
pub fn extract(text: &str, candidates: &[String]) -> BTreeMap<String, u64> {
    let mut matched = BTreeMap::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let clean_line = collapse_whitespace(line);

        let Some(caps) = LINE_PATTERN.captures(&clean_line) else {
            warn!(line, "ignored line: no name/count shape");
            continue;
        };
        let raw_name = caps[1].trim().to_string();
        let raw_vote = caps.get(2).map_or("", |m| m.as_str());
        let vote_str = raw_vote.replace(',', "");

        if vote_str.is_empty() || !vote_str.chars().all(|c| c.is_ascii_digit()) {
            warn!(line, vote = raw_vote, "ignored line: invalid vote number");
            continue;
        }
        let Ok(count) = vote_str.parse::<u64>() else {
            warn!(line, vote = %vote_str, "ignored line: vote number out of range");
            continue;
        };

        match closest_candidate(&raw_name, candidates) {
            Some((name, distance)) if distance <= MAX_NAME_DISTANCE => {
                matched.insert(name.to_string(), count);
            }
            _ => {
                warn!(name = %raw_name, "ignored line: no close candidate match");
            }
        }
    }

    matched
}

/// Parses literal `name:count` lines with no fuzzy matching (bulk edit).
///
/// Lines without a colon or without an all-digit count are skipped; names
/// are taken verbatim after trimming.
pub fn parse_exact_lines(text: &str) -> Vec<(String, u64)> {
    let mut pairs = Vec::new();
    for line in text.lines() {
        let Some((name, val)) = line.split_once(':') else {
            continue;
        };
        let (name, val) = (name.trim(), val.trim());
        if name.is_empty() || val.is_empty() || !val.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let Ok(count) = val.parse::<u64>() else {
            continue;
        };
        pairs.push((name.to_string(), count));
    }
    pairs
}

/// Finds the candidate with the minimum case-insensitive edit distance.
///
/// Ties keep the first candidate encountered, so catalog order is the
/// tie-break.
fn closest_candidate<'a>(raw_name: &str, candidates: &'a [String]) -> Option<(&'a str, usize)> {
    let raw_lower = raw_name.to_lowercase();
    let mut best: Option<(&str, usize)> = None;
    for candidate in candidates {
        let distance = strsim::levenshtein(&raw_lower, &candidate.to_lowercase());
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }
    best
}

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}
