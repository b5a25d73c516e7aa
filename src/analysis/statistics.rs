//! Run statistics.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

/// Counters collected while an analysis runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub scanned_files: usize,
    /// Filtered out, unreadable or oversized.
    pub skipped_files: usize,
    pub file_results: usize,
    pub entity_results: usize,
    pub parse_failures: usize,
    /// Parsers that reported entity derivation as not applicable.
    pub entities_not_applicable: usize,
    pub unresolved_dependencies: usize,
    pub unresolved_inheritance: usize,
    /// Phase name -> milliseconds.
    pub runtimes_ms: BTreeMap<String, f64>,
}

impl Statistics {
    pub fn record_runtime(&mut self, phase: &str, elapsed: Duration) {
        let ms = (elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0;
        *self.runtimes_ms.entry(phase.to_string()).or_insert(0.0) += ms;
    }

    /// Total milliseconds over all recorded phases.
    pub fn total_runtime_ms(&self) -> f64 {
        self.runtimes_ms.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtimes_accumulate() {
        let mut stats = Statistics::default();
        stats.record_runtime("parse-files", Duration::from_millis(20));
        stats.record_runtime("parse-files", Duration::from_millis(5));
        stats.record_runtime("build-graph", Duration::from_millis(1));

        assert_eq!(stats.runtimes_ms["parse-files"], 25.0);
        assert_eq!(stats.total_runtime_ms(), 26.0);
    }
}
