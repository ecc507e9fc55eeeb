//! Append-only log of locations consulted while resolving one repository.

use std::sync::{Mutex, PoisonError};

use indexmap::IndexSet;

/// Collects attempted locations (cache entries, URLs) for error reporting.
///
/// Shared by every candidate probe of one repository state; merged into the
/// request-wide accumulator only when the request ends in not-found.
#[derive(Debug, Default)]
pub struct AttemptLog {
    attempts: Mutex<Vec<String>>,
}

impl AttemptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<I, S>(&self, locations: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
        attempts.extend(locations.into_iter().map(Into::into));
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Merges every recorded location into `target`, keeping first-seen order.
    pub fn apply_to(&self, target: &mut IndexSet<String>) {
        let attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
        target.extend(attempts.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_order() {
        let log = AttemptLog::new();
        log.record(["/cache/a", "/cache/b"]);
        log.record(vec!["https://repo/a".to_string()]);
        assert_eq!(
            log.snapshot(),
            vec!["/cache/a", "/cache/b", "https://repo/a"]
        );
    }

    #[test]
    fn test_apply_to_deduplicates() {
        let log = AttemptLog::new();
        log.record(["/cache/a", "/cache/b", "/cache/a"]);

        let mut target = IndexSet::new();
        target.insert("/cache/b".to_string());
        log.apply_to(&mut target);

        let merged: Vec<&str> = target.iter().map(String::as_str).collect();
        assert_eq!(merged, vec!["/cache/b", "/cache/a"]);
    }
}
