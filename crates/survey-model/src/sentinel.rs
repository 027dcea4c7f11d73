//! Missing-value sentinels.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::numeric::parse_f64;

/// Raw encoded values that mean "no answer / unknown" for one run.
///
/// Matching is done on the trimmed raw text of a cell. Numeric sentinels
/// also match other spellings of the same number, so `998` catches
/// `998.0` from a spreadsheet cell and a zero-padded `0998` from a
/// fixed-width field. Blank cells are always missing regardless of the set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentinelSet {
    values: BTreeSet<String>,
}

impl SentinelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        self.values.insert(value.into().trim().to_string())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    /// Returns true if `raw` equals a declared sentinel.
    pub fn contains(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        if self.values.contains(trimmed) {
            return true;
        }
        let Some(number) = parse_f64(trimmed) else {
            return false;
        };
        self.values
            .iter()
            .any(|sentinel| parse_f64(sentinel) == Some(number))
    }

    /// Returns true if `raw` is blank or a declared sentinel.
    pub fn is_missing(&self, raw: &str) -> bool {
        raw.trim().is_empty() || self.contains(raw)
    }
}

impl<S: Into<String>> FromIterator<S> for SentinelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}
