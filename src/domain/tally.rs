//! The tally value object: entity name -> non-negative count.
//!
//! Keys are not restricted to the catalog; the user may add arbitrary names
//! during editing. Counts are non-negative by construction (`u64`).

use std::collections::BTreeMap;

use super::foundation::ValidationError;

/// Mapping from entity name to vote count, the object being collaboratively
/// built and submitted.
///
/// Backed by a `BTreeMap` so iteration and rendering are deterministic
/// (sorted by entity name).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    counts: BTreeMap<String, u64>,
}

impl Tally {
    /// Creates an empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tally with every given name at count zero.
    pub fn seed<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            counts: names.into_iter().map(|n| (n.into(), 0)).collect(),
        }
    }

    /// Sets the count for an entity, inserting it if absent.
    pub fn set(&mut self, name: impl Into<String>, count: u64) {
        self.counts.insert(name.into(), count);
    }

    /// Returns the count for an entity, if present.
    pub fn count(&self, name: &str) -> Option<u64> {
        self.counts.get(name).copied()
    }

    /// Adds a new entity at count zero.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the name is empty or whitespace only
    /// - `InvalidFormat` if the name already exists (case-sensitive)
    pub fn add_entity(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("entity_name"));
        }
        if self.counts.contains_key(trimmed) {
            return Err(ValidationError::invalid_format(
                "entity_name",
                format!("'{}' is already in the tally", trimmed),
            ));
        }
        self.counts.insert(trimmed.to_string(), 0);
        Ok(())
    }

    /// Removes an entity; returns false if it was not present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.counts.remove(name).is_some()
    }

    /// Merges counts into this tally; existing keys are overwritten
    /// (last-write-wins).
    pub fn merge<I, S>(&mut self, counts: I)
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        for (name, count) in counts {
            self.counts.insert(name.into(), count);
        }
    }

    /// Replaces the entire tally with the given counts.
    pub fn replace(&mut self, counts: BTreeMap<String, u64>) {
        self.counts = counts;
    }

    pub fn contains(&self, name: &str) -> bool {
        self.counts.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Entity names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.counts.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(n, c)| (n.as_str(), *c))
    }

    /// Borrows the underlying counts (for building a submission record).
    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    /// Renders the tally as `Name: count` lines, sorted by entity name.
    pub fn render(&self) -> String {
        self.counts
            .iter()
            .map(|(name, count)| format!("{}: {}", name, count))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Renders the tally with thousands grouping, for the submission recap.
    pub fn render_grouped(&self) -> String {
        self.counts
            .iter()
            .map(|(name, count)| format!("{}: {}", name, group_thousands(*count)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Formats a count with comma thousands separators (e.g. 12345 -> "12,345").
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
