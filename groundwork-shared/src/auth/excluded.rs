//! Paths that bypass the JWT guard (`EXCLUDED_PATHS`).

use crate::settings::split_csv;
use regex::Regex;
use tracing::warn;

/// Compiled list of excluded-path patterns
///
/// Each pattern is a regular expression searched anywhere in the request
/// path, so anchor with `^`/`$` for exact matches. A pattern that fails to
/// compile is matched as a literal substring instead.
#[derive(Debug, Clone, Default)]
pub struct ExcludedPaths {
    patterns: Vec<Regex>,
}

impl ExcludedPaths {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter_map(|p| compile(p.as_ref()))
            .collect();
        Self { patterns }
    }

    /// Builds the list from a comma-separated string
    pub fn from_csv(raw: &str) -> Self {
        Self::new(split_csv(raw))
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(path))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return None;
    }

    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern, error = %e, "Invalid excluded path pattern, matching it literally");
            Regex::new(&regex::escape(pattern)).ok()
        }
    }
}
