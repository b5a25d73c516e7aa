//! Fan-in and fan-out per graph node.

use super::{mean, round2, MetricCalculator, MetricInput, MetricOutput};
use crate::graph::CodeGraph;

pub struct FanInOut;

#[derive(Clone, Copy)]
enum Fan {
    In,
    Out,
}

impl Fan {
    fn label(self) -> &'static str {
        match self {
            Fan::In => "fan-in",
            Fan::Out => "fan-out",
        }
    }

    fn degree(self, graph: &CodeGraph, node: &str) -> usize {
        match self {
            Fan::In => graph.in_degree(node),
            Fan::Out => graph.out_degree(node),
        }
    }
}

fn calculate_for_graph(graph: &CodeGraph, fan: Fan, output: &mut MetricOutput) {
    let key = format!("{}-{}", fan.label(), graph.kind().as_str());
    let mut values = Vec::with_capacity(graph.node_count());
    let mut max: Option<(usize, &str)> = None;

    // nodes() is sorted, so the first node reaching the maximum keeps it.
    for node in graph.nodes() {
        let degree = fan.degree(graph, node);
        output.insert_local(node, key.as_str(), degree);
        values.push(degree as f64);
        if max.map_or(true, |(best, _)| degree > best) {
            max = Some((degree, node));
        }
    }

    if let (Some(avg), Some((degree, name))) = (mean(&values), max) {
        output.insert_overall(format!("avg-{}", key), round2(avg));
        output.insert_overall(format!("max-{}", key), degree);
        output.insert_overall(format!("max-{}-name", key), name.to_string());
    }
}

impl MetricCalculator for FanInOut {
    fn metric_name(&self) -> &'static str {
        "fan-in-out"
    }

    fn calculate_from_results(&self, input: &MetricInput<'_>) -> MetricOutput {
        let mut output = MetricOutput::default();
        for graph in &input.graphs {
            if graph.node_count() == 0 {
                tracing::debug!(graph = %graph.kind(), "empty graph, fan-in-out skipped");
                continue;
            }
            calculate_for_graph(graph, Fan::In, &mut output);
            calculate_for_graph(graph, Fan::Out, &mut output);
        }
        output
    }
}
