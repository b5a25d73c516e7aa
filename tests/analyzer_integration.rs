//! End-to-end runs of the analyzer over small generated corpora.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use lexgraph::metrics::{MetricInput, MetricOutput};
use lexgraph::{
    analyze, Analysis, AnalysisSettings, BuiltinMetric, CodeResult, GraphKind, Language,
    LexicalParser, Metric, MetricCalculator, MetricValue, ResultKind,
};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A corpus rooted at `<tmp>/proj`.
fn corpus(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("proj")).unwrap();
    for (rel, content) in files {
        write(&dir.path().join("proj"), rel, content);
    }
    dir
}

fn run(dir: &TempDir, metrics: &[BuiltinMetric]) -> Analysis {
    let mut analysis = Analysis::new(AnalysisSettings::new("test", dir.path().join("proj"))).unwrap();
    for metric in metrics {
        analysis.register_metric(ResultKind::File, metric.create());
        analysis.register_metric(ResultKind::Entity, metric.create());
    }
    analyze(analysis).unwrap()
}

#[test]
fn test_scenario_a_java_inheritance_and_method_counts() {
    let dir = corpus(&[
        ("Foo.java", "class Foo { void bar(){} void baz(){} }\n"),
        ("Qux.java", "class Qux extends Foo {}\n"),
    ]);
    let analysis = run(&dir, &[BuiltinMetric::NumberOfMethods]);

    assert_eq!(analysis.file_results().len(), 2);
    assert_eq!(analysis.entity_results().len(), 2);

    let foo = analysis.result("proj/Foo.java:Foo").unwrap();
    let qux = analysis.result("proj/Qux.java:Qux").unwrap();
    assert_eq!(foo.metric("number-of-methods-in-entity"), Some(&MetricValue::Int(2)));
    assert_eq!(qux.metric("number-of-methods-in-entity"), Some(&MetricValue::Int(0)));

    let inheritance = analysis.graphs().get(GraphKind::EntityInheritance).unwrap();
    assert!(inheritance.contains_edge("proj/Qux.java:Qux", "proj/Foo.java:Foo"));
    assert_eq!(inheritance.edge_count(), 1);
}

#[test]
fn test_scenario_b_script_without_entities() {
    let dir = corpus(&[("run.js", "const x = 1;\nconsole.log(x);\n")]);
    let analysis = run(&dir, &[BuiltinMetric::NumberOfMethods]);

    assert_eq!(analysis.file_results().len(), 1);
    assert!(analysis.entity_results().is_empty());
    assert_eq!(analysis.statistics().parse_failures, 0);
}

#[test]
fn test_scenario_c_unresolved_import_adds_no_edge() {
    let dir = corpus(&[
        ("app.py", "import numpy\nimport util\n"),
        ("util.py", "def f():\n    return 1\n"),
    ]);
    let analysis = run(&dir, &[]);

    let files = analysis.graphs().get(GraphKind::FileDependency).unwrap();
    assert_eq!(files.edges(), vec![("proj/app.py", "proj/util.py")]);
    assert_eq!(analysis.statistics().unresolved_dependencies, 1);
}

#[test]
fn test_scenario_d_whitespace_complexity() {
    let dir = corpus(&[("ws.c", "\tfoo\n  bar\n\n")]);
    let analysis = run(&dir, &[BuiltinMetric::WsComplexity]);

    let file = analysis.result("proj/ws.c").unwrap();
    assert_eq!(file.metric("ws-complexity-in-file"), Some(&MetricValue::Float(1.5)));
}

#[test]
fn test_idempotent_parsing() {
    let analysis = Analysis::new(AnalysisSettings::new("idem", "/src/proj")).unwrap();
    let parser = LexicalParser::new(Language::TypeScript);
    let path = Path::new("/src/proj/app.ts");
    let content = "import { a } from './a';\n/* note */\nexport class App { run(): void {} }\n";

    let first = parser.generate_file_result(&analysis, "app.ts", path, content);
    let second = parser.generate_file_result(&analysis, "app.ts", path, content);

    assert_eq!(first.tokens(), second.tokens());
    assert_eq!(first.imports(), second.imports());
    assert_eq!(first.imports().to_vec(), vec!["./a".to_string()]);
}

/// Records the method count each entity carries when the graph phase runs.
struct MethodCountProbe;

impl MetricCalculator for MethodCountProbe {
    fn metric_name(&self) -> &'static str {
        "method-count-probe"
    }

    fn calculate_from_results(&self, input: &MetricInput<'_>) -> MetricOutput {
        let mut output = MetricOutput::default();
        for result in &input.results {
            let seen = result
                .metric("number-of-methods-in-entity")
                .cloned()
                .unwrap_or(MetricValue::Text("missing".to_string()));
            output.insert_local(result.unique_name(), "probe-methods", seen);
        }
        output
    }
}

#[test]
fn test_graph_metrics_see_code_metric_values() {
    let dir = corpus(&[
        ("A.java", "class A { void one(){} }\n"),
        ("B.java", "class B extends A { void two(){} void three(){} }\n"),
    ]);
    let mut analysis = Analysis::new(AnalysisSettings::new("phases", dir.path().join("proj"))).unwrap();
    // registered first on purpose: phase order, not registration order, decides
    analysis.register_metric(ResultKind::Entity, Metric::graph(MethodCountProbe));
    analysis.register_metric(ResultKind::Entity, BuiltinMetric::NumberOfMethods.create());

    let analysis = analyze(analysis).unwrap();

    let b = analysis.result("proj/B.java:B").unwrap();
    assert_eq!(b.metric("probe-methods"), Some(&MetricValue::Int(2)));
    let a = analysis.result("proj/A.java:A").unwrap();
    assert_eq!(a.metric("probe-methods"), Some(&MetricValue::Int(1)));
}

#[test]
fn test_empty_corpus_has_no_aggregates() {
    let dir = corpus(&[]);
    let analysis = run(&dir, &BuiltinMetric::ALL);

    assert!(analysis.file_results().is_empty());
    assert!(analysis.overall_metric_results().is_empty());
    assert_eq!(analysis.graphs().iter().count(), 4);
}

#[test]
fn test_corpus_without_entities_skips_entity_aggregates() {
    let dir = corpus(&[("a.py", "def f():\n    pass\n"), ("b.py", "import a\n")]);
    let analysis = run(&dir, &BuiltinMetric::ALL);
    let overall = analysis.overall_metric_results();

    assert!(overall.contains_key("avg-number-of-methods-in-file"));
    assert!(!overall.contains_key("avg-number-of-methods-in-entity"));
    assert!(!overall.contains_key("total-sloc-in-entities"));
    assert_eq!(overall.get("total-sloc-in-files"), Some(&MetricValue::Int(3)));
    assert_eq!(analysis.statistics().entities_not_applicable, 1);
}

#[test]
fn test_unreadable_file_is_skipped() {
    let dir = corpus(&[("good.c", "int main() { return 0; }\n")]);
    // not valid UTF-8
    fs::write(dir.path().join("proj/bad.c"), [0xff, 0xfe, 0x00, 0x41]).unwrap();

    let analysis = run(&dir, &[BuiltinMetric::NumberOfMethods]);
    assert!(analysis.contains_result("proj/good.c"));
    assert!(!analysis.contains_result("proj/bad.c"));
    assert_eq!(analysis.statistics().parse_failures, 1);
}
