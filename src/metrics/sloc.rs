//! Source lines of code.

use super::{mean, round2, scoped_key, MetricCalculator, MetricInput, MetricOutput};
use crate::analysis::CodeResult;
use crate::scanner::NEWLINE;

pub struct SourceLinesOfCode;

fn is_fence(token: &str) -> bool {
    token.chars().all(|c| c == '"' || c == '\'')
}

/// Count lines of a token stream holding code.
///
/// Comments are already gone from the stream; lines left with nothing but
/// string fences (an emptied docstring) do not count.
pub fn count_sloc(tokens: &[String]) -> usize {
    tokens
        .split(|t| t == NEWLINE)
        .filter(|line| line.iter().any(|t| !is_fence(t)))
        .count()
}

impl MetricCalculator for SourceLinesOfCode {
    fn metric_name(&self) -> &'static str {
        "source-lines-of-code"
    }

    fn calculate_from_results(&self, input: &MetricInput<'_>) -> MetricOutput {
        let key = scoped_key("sloc", input.scope);
        let mut output = MetricOutput::default();
        let mut total = 0usize;
        let mut values = Vec::with_capacity(input.results.len());

        for result in &input.results {
            let sloc = count_sloc(result.tokens());
            output.insert_local(result.unique_name(), key.as_str(), sloc);
            total += sloc;
            values.push(sloc as f64);
        }

        if let Some(avg) = mean(&values) {
            output.insert_overall(format!("avg-{}", key), round2(avg));
            output.insert_overall(format!("total-sloc-in-{}", input.scope.plural()), total);
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::scanner;

    fn sloc(language: Language, source: &str) -> usize {
        count_sloc(&scanner::scan(source, language.rules()).tokens)
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let source = "// header\n\nint main() {\n  /* block\n     comment */\n  return 0;\n}\n";
        assert_eq!(sloc(Language::C, source), 3);
    }

    #[test]
    fn test_docstring_lines_skipped() {
        let source = "def f():\n    \"\"\"\n    Docs.\n    \"\"\"\n    return 1\n";
        assert_eq!(sloc(Language::Python, source), 2);
    }

    #[test]
    fn test_empty() {
        assert_eq!(count_sloc(&[]), 0);
    }
}
