//! Metric calculators and the two-phase metric engine.
//!
//! Every metric implements [`MetricCalculator`] and is registered either as a
//! [`Metric::Code`] (reads individual results) or a [`Metric::Graph`] (reads
//! the built graphs). The engine runs all code metrics before any graph
//! metric, so graph metrics may rely on per-result values being attached.

mod engine;
mod fan_in_out;
mod modularity;
mod number_of_methods;
mod sloc;
mod whitespace;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::{ResultKind, ResultRef};
use crate::graph::CodeGraph;

pub use engine::{calculate_code_metrics, calculate_graph_metrics};
pub use fan_in_out::FanInOut;
pub use modularity::{louvain_partition, LouvainModularity, Partition};
pub use number_of_methods::NumberOfMethods;
pub use sloc::SourceLinesOfCode;
pub use whitespace::{ws_complexity, WhitespaceComplexity};

/// A metric value as stored in results and metric tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
    Text(String),
    Map(BTreeMap<String, f64>),
}

impl MetricValue {
    /// Numeric view of `Int` and `Float` values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Int(v) => Some(*v as f64),
            MetricValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{}", v),
            MetricValue::Float(v) => write!(f, "{:.2}", v),
            MetricValue::Text(s) => write!(f, "{}", s),
            MetricValue::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}: {:.2}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        MetricValue::Int(v as i64)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        MetricValue::Text(v)
    }
}

/// What a calculator sees.
#[derive(Debug)]
pub struct MetricInput<'a> {
    pub scope: ResultKind,
    /// Results of `scope`, in unique-name order.
    pub results: Vec<ResultRef<'a>>,
    /// Graphs of `scope`; empty for code metrics.
    pub graphs: Vec<&'a CodeGraph>,
}

/// What a calculator produces. Committed by the engine, never by the calculator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricOutput {
    /// unique name -> key -> value
    pub local: BTreeMap<String, BTreeMap<String, MetricValue>>,
    /// key -> value
    pub overall: BTreeMap<String, MetricValue>,
}

impl MetricOutput {
    pub fn insert_local(&mut self, unique_name: &str, key: impl Into<String>, value: impl Into<MetricValue>) {
        self.local
            .entry(unique_name.to_string())
            .or_default()
            .insert(key.into(), value.into());
    }

    pub fn insert_overall(&mut self, key: impl Into<String>, value: impl Into<MetricValue>) {
        self.overall.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.overall.is_empty()
    }
}

/// The contract every metric implements.
///
/// Calculators must be pure over their input and write only their own keys.
pub trait MetricCalculator: Send + Sync {
    /// Registry name, e.g. `number-of-methods`.
    fn metric_name(&self) -> &'static str;

    fn calculate_from_results(&self, input: &MetricInput<'_>) -> MetricOutput;
}

/// A registered metric, tagged by phase.
#[derive(Clone)]
pub enum Metric {
    Code(Arc<dyn MetricCalculator>),
    Graph(Arc<dyn MetricCalculator>),
}

impl Metric {
    pub fn code(calculator: impl MetricCalculator + 'static) -> Self {
        Metric::Code(Arc::new(calculator))
    }

    pub fn graph(calculator: impl MetricCalculator + 'static) -> Self {
        Metric::Graph(Arc::new(calculator))
    }

    pub fn name(&self) -> &'static str {
        self.calculator().metric_name()
    }

    pub fn is_graph_metric(&self) -> bool {
        matches!(self, Metric::Graph(_))
    }

    pub fn calculator(&self) -> &dyn MetricCalculator {
        match self {
            Metric::Code(c) | Metric::Graph(c) => c.as_ref(),
        }
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Code(c) => write!(f, "Metric::Code({})", c.metric_name()),
            Metric::Graph(c) => write!(f, "Metric::Graph({})", c.metric_name()),
        }
    }
}

/// Metrics that can be enabled from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinMetric {
    NumberOfMethods,
    SourceLinesOfCode,
    WsComplexity,
    FanInOut,
    LouvainModularity,
}

impl BuiltinMetric {
    pub const ALL: [BuiltinMetric; 5] = [
        BuiltinMetric::NumberOfMethods,
        BuiltinMetric::SourceLinesOfCode,
        BuiltinMetric::WsComplexity,
        BuiltinMetric::FanInOut,
        BuiltinMetric::LouvainModularity,
    ];

    pub fn create(self) -> Metric {
        match self {
            BuiltinMetric::NumberOfMethods => Metric::code(NumberOfMethods),
            BuiltinMetric::SourceLinesOfCode => Metric::code(SourceLinesOfCode),
            BuiltinMetric::WsComplexity => Metric::code(WhitespaceComplexity),
            BuiltinMetric::FanInOut => Metric::graph(FanInOut),
            BuiltinMetric::LouvainModularity => Metric::graph(LouvainModularity::default()),
        }
    }
}

/// `<base>-in-<file|entity>`
pub fn scoped_key(base: &str, scope: ResultKind) -> String {
    format!("{}-in-{}", base, scope.as_str())
}

/// Round to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mean of the values, `None` when there are none.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_key() {
        assert_eq!(scoped_key("sloc", ResultKind::Entity), "sloc-in-entity");
        assert_eq!(scoped_key("number-of-methods", ResultKind::File), "number-of-methods-in-file");
    }

    #[test]
    fn test_mean_of_nothing() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0]), Some(1.5));
    }

    #[test]
    fn test_metric_value_serializes_untagged() {
        assert_eq!(serde_json::to_string(&MetricValue::Int(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&MetricValue::Float(1.5)).unwrap(), "1.5");
        assert_eq!(
            serde_json::to_string(&MetricValue::Text("a".into())).unwrap(),
            "\"a\""
        );
    }

    #[test]
    fn test_builtin_phases() {
        assert!(!BuiltinMetric::NumberOfMethods.create().is_graph_metric());
        assert!(BuiltinMetric::FanInOut.create().is_graph_metric());
        assert_eq!(BuiltinMetric::WsComplexity.create().name(), "ws-complexity");
    }
}
