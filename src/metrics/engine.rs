//! Runs registered metrics in two phases over an analysis.

use rayon::prelude::*;

use super::{Metric, MetricOutput};
use crate::analysis::{Analysis, ResultKind};

const SCOPES: [ResultKind; 2] = [ResultKind::File, ResultKind::Entity];

/// Run every registered code metric for both scopes and attach the values.
///
/// Returns the number of metric jobs run.
pub fn calculate_code_metrics(analysis: &mut Analysis) -> usize {
    run_phase(analysis, false)
}

/// Run every registered graph metric for both scopes and attach the values.
///
/// Must run after [`calculate_code_metrics`] and after graphs were built;
/// graph metrics may read code-metric values from the results.
pub fn calculate_graph_metrics(analysis: &mut Analysis) -> usize {
    run_phase(analysis, true)
}

fn run_phase(analysis: &mut Analysis, graph_phase: bool) -> usize {
    let jobs: Vec<(ResultKind, Metric)> = SCOPES
        .iter()
        .flat_map(|&scope| {
            analysis
                .metrics_for(scope)
                .filter(|m| m.is_graph_metric() == graph_phase)
                .map(move |m| (scope, m.clone()))
                .collect::<Vec<_>>()
        })
        .collect();

    if jobs.is_empty() {
        return 0;
    }

    let outputs: Vec<(&'static str, MetricOutput)> = {
        let shared: &Analysis = analysis;
        jobs.par_iter()
            .map(|(scope, metric)| {
                let input = shared.metric_input(*scope, graph_phase);
                let output = metric.calculator().calculate_from_results(&input);
                tracing::debug!(
                    metric = metric.name(),
                    scope = %scope,
                    local = output.local.len(),
                    overall = output.overall.len(),
                    "metric calculated"
                );
                (metric.name(), output)
            })
            .collect()
    };

    // par_iter().collect() keeps job order, so commits follow registry order.
    let count = outputs.len();
    for (name, output) in outputs {
        analysis.commit_metric_output(name, output);
    }
    count
}
