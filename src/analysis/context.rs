//! The per-run analysis aggregate.

use std::collections::BTreeMap;
use std::path::{Component, Path};
use std::sync::atomic::{AtomicU64, Ordering};

use super::results::{CodeResult, EntityResult, FileResult, ResultKind, ResultRef};
use super::settings::{AnalysisSettings, Filters};
use super::statistics::Statistics;
use super::AnalysisId;
use crate::config::ConfigError;
use crate::graph::{CodeGraph, Graphs};
use crate::metrics::{Metric, MetricInput, MetricOutput, MetricValue};
use crate::parser::LexicalParser;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// All results, metric registrations and metric outputs of one run.
///
/// Created empty, filled by parsers through [`Analysis::collect_results_from_parser`],
/// annotated by the metric engine, then handed read-only to reporting.
#[derive(Debug)]
pub struct Analysis {
    id: AnalysisId,
    settings: AnalysisSettings,
    filters: Filters,
    file_results: BTreeMap<String, FileResult>,
    entity_results: BTreeMap<String, EntityResult>,
    metrics_for_file_results: BTreeMap<String, Metric>,
    metrics_for_entity_results: BTreeMap<String, Metric>,
    local_metric_results: BTreeMap<String, BTreeMap<String, MetricValue>>,
    overall_metric_results: BTreeMap<String, MetricValue>,
    graphs: Graphs,
    statistics: Statistics,
}

impl Analysis {
    /// Create an empty analysis. Fails only on invalid filter patterns.
    pub fn new(settings: AnalysisSettings) -> Result<Self, ConfigError> {
        if settings.analysis_name.trim().is_empty() {
            return Err(ConfigError::MissingField("analysis_name"));
        }
        let filters = Filters::compile(&settings)?;

        Ok(Self {
            id: AnalysisId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            settings,
            filters,
            file_results: BTreeMap::new(),
            entity_results: BTreeMap::new(),
            metrics_for_file_results: BTreeMap::new(),
            metrics_for_entity_results: BTreeMap::new(),
            local_metric_results: BTreeMap::new(),
            overall_metric_results: BTreeMap::new(),
            graphs: Graphs::default(),
            statistics: Statistics::default(),
        })
    }

    pub fn id(&self) -> AnalysisId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.settings.analysis_name
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn source_directory(&self) -> &Path {
        &self.settings.source_directory
    }

    pub(crate) fn set_source_directory(&mut self, path: std::path::PathBuf) {
        self.settings.source_directory = path;
    }

    /// Unique name of a file: its path relative to the parent of the source
    /// root, `/`-separated, so it starts with the root directory's name.
    pub fn unique_file_name(&self, full_path: &Path) -> String {
        let root = self.source_directory();
        let base = root.parent().unwrap_or(root);
        let relative = full_path.strip_prefix(base).unwrap_or(full_path);

        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Register a metric for one result scope. Registering the same metric
    /// name twice for a scope replaces the earlier registration.
    pub fn register_metric(&mut self, scope: ResultKind, metric: Metric) {
        let registry = match scope {
            ResultKind::File => &mut self.metrics_for_file_results,
            ResultKind::Entity => &mut self.metrics_for_entity_results,
        };
        registry.insert(metric.name().to_string(), metric);
    }

    pub fn metrics_for_file_results(&self) -> &BTreeMap<String, Metric> {
        &self.metrics_for_file_results
    }

    pub fn metrics_for_entity_results(&self) -> &BTreeMap<String, Metric> {
        &self.metrics_for_entity_results
    }

    /// Registered metrics of one scope, in name order.
    pub fn metrics_for(&self, scope: ResultKind) -> impl Iterator<Item = &Metric> {
        match scope {
            ResultKind::File => self.metrics_for_file_results.values(),
            ResultKind::Entity => self.metrics_for_entity_results.values(),
        }
    }

    /// Move everything a parser produced into this analysis.
    ///
    /// Returns the number of (file, entity) results merged. A result whose
    /// unique name is already present replaces the earlier one.
    pub fn collect_results_from_parser(&mut self, parser: &mut LexicalParser) -> (usize, usize) {
        let (files, entities) = parser.take_results();
        let counts = (files.len(), entities.len());

        for (name, result) in files {
            if self.file_results.insert(name.clone(), result).is_some() {
                tracing::warn!(result = %name, "duplicate file result replaced");
            }
        }
        for (name, result) in entities {
            if self.entity_results.insert(name.clone(), result).is_some() {
                tracing::warn!(result = %name, "duplicate entity result replaced");
            }
        }

        self.statistics.file_results = self.file_results.len();
        self.statistics.entity_results = self.entity_results.len();
        counts
    }

    pub fn file_results(&self) -> &BTreeMap<String, FileResult> {
        &self.file_results
    }

    pub fn entity_results(&self) -> &BTreeMap<String, EntityResult> {
        &self.entity_results
    }

    /// Results of one scope in unique-name order.
    pub fn results(&self, scope: ResultKind) -> Vec<ResultRef<'_>> {
        match scope {
            ResultKind::File => self.file_results.values().map(ResultRef::File).collect(),
            ResultKind::Entity => self.entity_results.values().map(ResultRef::Entity).collect(),
        }
    }

    /// Look up a result of either kind.
    pub fn result(&self, unique_name: &str) -> Option<ResultRef<'_>> {
        self.file_results
            .get(unique_name)
            .map(ResultRef::File)
            .or_else(|| self.entity_results.get(unique_name).map(ResultRef::Entity))
    }

    pub fn contains_result(&self, unique_name: &str) -> bool {
        self.file_results.contains_key(unique_name) || self.entity_results.contains_key(unique_name)
    }

    pub fn graphs(&self) -> &Graphs {
        &self.graphs
    }

    pub(crate) fn set_graphs(&mut self, graphs: Graphs) {
        self.statistics.unresolved_dependencies = graphs.unresolved_dependencies();
        self.statistics.unresolved_inheritance = graphs.unresolved_inheritance();
        self.graphs = graphs;
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub(crate) fn statistics_mut(&mut self) -> &mut Statistics {
        &mut self.statistics
    }

    /// Per result: metric key -> value.
    pub fn local_metric_results(&self) -> &BTreeMap<String, BTreeMap<String, MetricValue>> {
        &self.local_metric_results
    }

    /// Corpus-wide metric key -> value.
    pub fn overall_metric_results(&self) -> &BTreeMap<String, MetricValue> {
        &self.overall_metric_results
    }

    /// Input handed to a metric: the scoped results and, for graph metrics,
    /// the graphs of that scope.
    pub(crate) fn metric_input(&self, scope: ResultKind, with_graphs: bool) -> MetricInput<'_> {
        let graphs: Vec<&CodeGraph> = if with_graphs {
            self.graphs.for_scope(scope)
        } else {
            Vec::new()
        };
        MetricInput {
            scope,
            results: self.results(scope),
            graphs,
        }
    }

    /// Write one metric's output into the results and the metric tables.
    pub(crate) fn commit_metric_output(&mut self, metric: &str, output: MetricOutput) {
        for (unique_name, values) in output.local {
            let target = if let Some(file) = self.file_results.get_mut(&unique_name) {
                Some(file.metrics_mut())
            } else {
                self.entity_results.get_mut(&unique_name).map(|e| e.metrics_mut())
            };

            let Some(target) = target else {
                tracing::warn!(metric, result = %unique_name, "metric value for unknown result dropped");
                continue;
            };
            for (key, value) in &values {
                target.insert(key.clone(), value.clone());
            }
            self.local_metric_results
                .entry(unique_name)
                .or_default()
                .extend(values);
        }

        for (key, value) in output.overall {
            if self.overall_metric_results.insert(key.clone(), value).is_some() {
                tracing::warn!(metric, key = %key, "overall metric key overwritten");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use std::path::PathBuf;

    fn analysis(root: &str) -> Analysis {
        Analysis::new(AnalysisSettings::new("test", root)).unwrap()
    }

    #[test]
    fn test_unique_file_name_includes_root_name() {
        let analysis = analysis("/work/project");
        assert_eq!(
            analysis.unique_file_name(Path::new("/work/project/src/Main.java")),
            "project/src/Main.java"
        );
    }

    #[test]
    fn test_ids_are_distinct() {
        assert_ne!(analysis("/a").id(), analysis("/b").id());
    }

    #[test]
    fn test_empty_name_rejected() {
        let settings = AnalysisSettings::new("  ", "/work");
        assert!(matches!(
            Analysis::new(settings),
            Err(ConfigError::MissingField("analysis_name"))
        ));
    }

    #[test]
    fn test_collect_results_from_parser_moves_results() {
        let mut analysis = analysis("/work/project");
        let mut parser = LexicalParser::new(Language::Java);
        let path = PathBuf::from("/work/project/Foo.java");
        parser.generate_file_result_from_analysis(&analysis, "Foo.java", &path, "class Foo {}\n");
        parser.generate_entity_results_from_analysis(&analysis).unwrap();

        let merged = analysis.collect_results_from_parser(&mut parser);

        assert_eq!(merged, (1, 1));
        assert!(analysis.contains_result("project/Foo.java"));
        assert!(analysis.contains_result("project/Foo.java:Foo"));
        assert_eq!(analysis.statistics().entity_results, 1);
        assert_eq!(parser.take_results().0.len(), 0, "parser keeps nothing after merge");
    }

    #[test]
    fn test_commit_writes_result_and_tables() {
        let mut analysis = analysis("/work/project");
        let mut parser = LexicalParser::new(Language::Python);
        let path = PathBuf::from("/work/project/run.py");
        parser.generate_file_result_from_analysis(&analysis, "run.py", &path, "print(1)\n");
        analysis.collect_results_from_parser(&mut parser);

        let mut output = MetricOutput::default();
        output.insert_local("project/run.py", "answer", MetricValue::Int(42));
        output.insert_local("project/missing.py", "answer", MetricValue::Int(0));
        output.insert_overall("total-answer", MetricValue::Int(42));
        analysis.commit_metric_output("answer", output);

        let result = analysis.result("project/run.py").unwrap();
        assert_eq!(result.metric("answer"), Some(&MetricValue::Int(42)));
        assert_eq!(analysis.local_metric_results().len(), 1);
        assert_eq!(
            analysis.overall_metric_results().get("total-answer"),
            Some(&MetricValue::Int(42))
        );
    }
}
