//! Method declarations per result.

use super::{mean, round2, scoped_key, MetricCalculator, MetricInput, MetricOutput};
use crate::analysis::CodeResult;
use crate::language::LanguageRules;

pub struct NumberOfMethods;

/// A match right after one of these is a type header (`record P(int x) {`)
/// or an anonymous class body (`new Runnable() {`), not a method.
const NON_METHOD_PREFIXES: &[&str] = &["record", "class", "interface", "enum", "struct", "new"];

/// Count method declarations in a token stream.
///
/// Tokens are joined with single spaces so declarations split over several
/// lines still match.
pub fn count_methods(rules: &LanguageRules, tokens: &[String]) -> usize {
    let joined = tokens.join(" ");
    rules
        .method_pattern
        .captures_iter(&joined)
        .filter_map(|caps| caps.name("name"))
        .filter(|name| !rules.method_exclusions.contains(&name.as_str()))
        .filter(|name| {
            let previous = joined[..name.start()].split_whitespace().next_back();
            !previous.is_some_and(|token| NON_METHOD_PREFIXES.contains(&token))
        })
        .count()
}

impl MetricCalculator for NumberOfMethods {
    fn metric_name(&self) -> &'static str {
        "number-of-methods"
    }

    fn calculate_from_results(&self, input: &MetricInput<'_>) -> MetricOutput {
        let key = scoped_key("number-of-methods", input.scope);
        let mut output = MetricOutput::default();
        let mut counts = Vec::with_capacity(input.results.len());

        for result in &input.results {
            let count = count_methods(result.language().rules(), result.tokens());
            tracing::trace!(result = result.unique_name(), count, "methods counted");
            output.insert_local(result.unique_name(), key.as_str(), count);
            counts.push(count as f64);
        }

        if let Some(avg) = mean(&counts) {
            output.insert_overall(format!("avg-{}", key), round2(avg));
        }
        output
    }
}
