//! Indentation-based complexity.
//!
//! Each non-blank line contributes its leading tabs plus a quarter of its
//! leading spaces. Deeply nested code scores high regardless of language.

use super::{mean, round2, scoped_key, MetricCalculator, MetricInput, MetricOutput};
use crate::analysis::CodeResult;

const SPACES_PER_LEVEL: f64 = 4.0;

pub struct WhitespaceComplexity;

fn line_complexity(line: &str) -> f64 {
    let mut tabs = 0usize;
    let mut spaces = 0usize;
    for c in line.chars() {
        match c {
            '\t' => tabs += 1,
            ' ' => spaces += 1,
            _ => break,
        }
    }
    tabs as f64 + spaces as f64 / SPACES_PER_LEVEL
}

/// Whitespace complexity of a source text.
pub fn ws_complexity(source: &str) -> f64 {
    source
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(line_complexity)
        .sum()
}

impl MetricCalculator for WhitespaceComplexity {
    fn metric_name(&self) -> &'static str {
        "ws-complexity"
    }

    fn calculate_from_results(&self, input: &MetricInput<'_>) -> MetricOutput {
        let key = scoped_key("ws-complexity", input.scope);
        let mut output = MetricOutput::default();
        let mut values = Vec::with_capacity(input.results.len());

        for result in &input.results {
            let complexity = round2(ws_complexity(result.source()));
            output.insert_local(result.unique_name(), key.as_str(), complexity);
            values.push(complexity);
        }

        if let Some(avg) = mean(&values) {
            output.insert_overall(format!("avg-{}", key), round2(avg));
        }
        output
    }
}
