//! lexgraph - multi-language lexical code analyzer.
//!
//! lexgraph scans a source tree with per-language lexical rules (no full
//! parsing), produces a result for every file and every type declared in it,
//! links them into dependency and inheritance graphs, and runs pluggable
//! metrics over the results and graphs.
//!
//! # Architecture
//!
//! - `language`: per-language rule tables (comments, strings, imports, entities, methods)
//! - `scanner`: comment/string stripping, tokens, imports and entity spans
//! - `parser`: one lexical parser per language, producing file and entity results
//! - `analysis`: the per-run aggregate, results, settings and statistics
//! - `graph`: reference resolution and the four graphs
//! - `metrics`: the metric contract, built-in metrics and the two-phase engine
//! - `analyzer`: the discover → parse → graph → metrics state machine
//! - `config`: YAML project files
//! - `report`: JSON and terminal output
//!
//! # Adding a New Metric
//!
//! Implement [`metrics::MetricCalculator`] and register it on an
//! [`Analysis`] as a [`Metric::Code`] or [`Metric::Graph`] before running the
//! [`Analyzer`].

pub mod analysis;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod graph;
pub mod language;
pub mod metrics;
pub mod parser;
pub mod report;
pub mod scanner;

pub use analysis::{
    Analysis, AnalysisId, AnalysisSettings, CodeResult, EntityResult, FileResult, ResultKind,
    ResultRef, Statistics,
};
pub use analyzer::{analyze, Analyzer, AnalyzerError, AnalyzerState};
pub use config::{AnalysisConfig, ConfigError, ProjectConfig};
pub use graph::{build_graphs, CodeGraph, GraphKind, Graphs, ResolutionPolicy};
pub use language::{EntityKind, Language};
pub use metrics::{
    BuiltinMetric, Metric, MetricCalculator, MetricInput, MetricOutput, MetricValue,
};
pub use parser::{LexicalParser, ParseError, ParserRegistry};
