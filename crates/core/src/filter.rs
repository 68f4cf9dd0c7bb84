//! Notification exclusion rules
//!
//! Listeners that write to the wiki themselves (an IRC archiver logging the
//! channel to a page, say) would otherwise trigger a notification for every
//! notification they record. Documents matching an exclusion pattern are
//! never announced.

use std::sync::{Arc, RwLock};

use regex::Regex;

use crate::error::{Error, Result};

/// Compiled exclusion patterns; a pattern must match the whole identifier
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    patterns: Vec<Regex>,
}

impl ExclusionFilter {
    /// Compile all patterns, failing on the first malformed one
    pub fn compile<I, P>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let pattern = p.as_ref();
                Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| Error::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    pub fn should_suppress(&self, document_id: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(document_id))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Exclusion filter snapshot shared between the event path and reloads.
/// Reloads install a whole new snapshot; readers keep the one they took.
#[derive(Debug, Default)]
pub struct SharedExclusionFilter {
    current: RwLock<Arc<ExclusionFilter>>,
}

impl SharedExclusionFilter {
    pub fn new(filter: ExclusionFilter) -> Self {
        Self {
            current: RwLock::new(Arc::new(filter)),
        }
    }

    pub fn snapshot(&self) -> Arc<ExclusionFilter> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                tracing::error!("Exclusion filter lock poisoned, recovering");
                poisoned.into_inner().clone()
            }
        }
    }

    pub fn replace(&self, filter: ExclusionFilter) {
        let filter = Arc::new(filter);
        match self.current.write() {
            Ok(mut guard) => *guard = filter,
            Err(poisoned) => {
                tracing::error!("Exclusion filter lock poisoned, recovering");
                *poisoned.into_inner() = filter;
            }
        }
    }

    pub fn should_suppress(&self, document_id: &str) -> bool {
        self.snapshot().should_suppress(document_id)
    }
}
