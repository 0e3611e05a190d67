//! Registry of URL shapes produced by the tracker itself.
//!
//! A known URL is a named regular expression whose capture groups split a
//! URL into searchable parts. Patterns are registered without protocol and
//! without trailing slashes, because both are stripped from search tokens
//! before matching.

use std::collections::HashMap;
use std::sync::{LazyLock, PoisonError, RwLock};

use regex::Regex;
use tracing::info;

/// Registration key of the work item detail page in list view.
pub const WORK_ITEM_LIST_DETAILS: &str = "work-item-list-details";
/// Registration key of the work item detail page in board view.
pub const WORK_ITEM_BOARD_DETAILS: &str = "work-item-board-details";

static BUILT_IN_PATTERNS: LazyLock<Vec<KnownUrl>> = LazyLock::new(|| {
    vec![
        KnownUrl::new(
            WORK_ITEM_LIST_DETAILS,
            r"(?P<domain>demo.almighty.io)(?P<path>/work-item/list/detail/)(?P<id>\d*)",
        )
        .unwrap(),
        KnownUrl::new(
            WORK_ITEM_BOARD_DETAILS,
            r"(?P<domain>demo.almighty.io)(?P<path>/work-item/board/detail/)(?P<id>\d*)",
        )
        .unwrap(),
    ]
});

#[derive(Debug, thiserror::Error)]
pub enum KnownUrlError {
    #[error("Invalid pattern for known URL '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled known URL pattern.
#[derive(Debug, Clone)]
pub struct KnownUrl {
    name: String,
    raw_pattern: String,
    regex: Regex,
    /// One entry per capture group; index 0 is the implicit whole match and
    /// unnamed groups are empty strings.
    group_names: Vec<String>,
}

impl KnownUrl {
    pub fn new(
        name: impl Into<String>,
        raw_pattern: impl Into<String>,
    ) -> Result<Self, KnownUrlError> {
        let name = name.into();
        let raw_pattern = raw_pattern.into();
        let regex = Regex::new(&raw_pattern).map_err(|source| KnownUrlError::InvalidPattern {
            name: name.clone(),
            source,
        })?;
        let group_names = regex
            .capture_names()
            .map(|group| group.unwrap_or_default().to_string())
            .collect();

        Ok(Self {
            name,
            raw_pattern,
            regex,
            group_names,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw_pattern(&self) -> &str {
        &self.raw_pattern
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn group_names(&self) -> &[String] {
        &self.group_names
    }

    /// Number of capture groups (excluding group 0) that matched something
    /// non-empty, or `None` if the pattern does not match at all.
    pub fn relevance(&self, url: &str) -> Option<usize> {
        let captures = self.regex.captures(url)?;
        Some(
            captures
                .iter()
                .skip(1)
                .flatten()
                .filter(|group| !group.as_str().is_empty())
                .count(),
        )
    }
}

/// The known URL that fits a search token best.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownUrlMatch {
    pub name: String,
    /// Values of the capture groups after group 0, in pattern order;
    /// groups that did not participate are empty.
    pub groups: Vec<String>,
}

/// Process-wide set of known URL patterns.
///
/// Filled once at startup and shared (usually behind an `Arc`) with every
/// search. Patterns keep their first registration position; re-registering
/// a name replaces the pattern in place.
#[derive(Debug, Default)]
pub struct KnownUrlRegistry {
    patterns: RwLock<Vec<KnownUrl>>,
}

impl KnownUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in work item detail patterns.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        for known in BUILT_IN_PATTERNS.iter() {
            registry.insert(known.clone());
        }
        registry
    }

    /// Compiles `raw_pattern` and stores it under `name`, replacing any
    /// pattern previously registered under the same name.
    pub fn register(&self, name: &str, raw_pattern: &str) -> Result<(), KnownUrlError> {
        let known = KnownUrl::new(name, raw_pattern)?;
        info!(name, pattern = raw_pattern, "Registered known URL");
        self.insert(known);
        Ok(())
    }

    fn insert(&self, known: KnownUrl) {
        let mut patterns = self.patterns.write().unwrap_or_else(PoisonError::into_inner);
        match patterns.iter_mut().find(|existing| existing.name == known.name) {
            Some(existing) => *existing = known,
            None => patterns.push(known),
        }
    }

    /// Snapshot of all registered patterns by name.
    pub fn all_patterns(&self) -> HashMap<String, KnownUrl> {
        self.read()
            .iter()
            .map(|known| (known.name.clone(), known.clone()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<KnownUrl> {
        self.read().iter().find(|known| known.name == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Finds the pattern whose match yields the most non-empty capture
    /// groups. Ties go to the pattern registered first.
    pub fn best_match(&self, url: &str) -> Option<KnownUrlMatch> {
        let patterns = self.read();
        let mut best: Option<(&KnownUrl, usize)> = None;
        for known in patterns.iter() {
            let Some(relevance) = known.relevance(url) else {
                continue;
            };
            if best.map_or(true, |(_, best_relevance)| relevance > best_relevance) {
                best = Some((known, relevance));
            }
        }

        let (known, _) = best?;
        let captures = known.regex.captures(url)?;
        Some(KnownUrlMatch {
            name: known.name.clone(),
            groups: captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect(),
        })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<KnownUrl>> {
        self.patterns.read().unwrap_or_else(PoisonError::into_inner)
    }
}
