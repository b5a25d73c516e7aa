//! Output formatting for finished analyses.
//!
//! - JSON: statistics, metric tables and every graph as node/edge lists
//! - Pretty: colored terminal summary

use std::collections::BTreeMap;
use std::io::Write;

use colored::*;
use serde::Serialize;

use crate::analysis::{Analysis, CodeResult, Statistics};
use crate::graph::CodeGraph;
use crate::metrics::MetricValue;

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub version: String,
    pub project: String,
    pub analyses: Vec<AnalysisReport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub name: &'a str,
    pub source_directory: String,
    pub statistics: &'a Statistics,
    pub overall_metrics: &'a BTreeMap<String, MetricValue>,
    pub local_metrics: &'a BTreeMap<String, BTreeMap<String, MetricValue>>,
    pub entities: Vec<EntityReport<'a>>,
    pub graphs: Vec<GraphReport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct EntityReport<'a> {
    pub unique_name: &'a str,
    pub kind: &'static str,
    pub file: &'a str,
    pub lines: (usize, usize),
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub parents: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct GraphReport<'a> {
    pub kind: &'static str,
    pub nodes: Vec<&'a str>,
    pub edges: Vec<(&'a str, &'a str)>,
}

impl<'a> GraphReport<'a> {
    fn from_graph(graph: &'a CodeGraph) -> Self {
        Self {
            kind: graph.kind().as_str(),
            nodes: graph.nodes().collect(),
            edges: graph.edges(),
        }
    }
}

impl<'a> AnalysisReport<'a> {
    pub fn from_analysis(analysis: &'a Analysis) -> Self {
        let entities = analysis
            .entity_results()
            .values()
            .map(|entity| EntityReport {
                unique_name: entity.unique_name(),
                kind: entity.entity_kind().as_str(),
                file: entity.file_unique_name(),
                lines: entity.lines(),
                parents: entity.parents(),
            })
            .collect();

        Self {
            name: analysis.name(),
            source_directory: analysis.source_directory().display().to_string(),
            statistics: analysis.statistics(),
            overall_metrics: analysis.overall_metric_results(),
            local_metrics: analysis.local_metric_results(),
            entities,
            graphs: analysis.graphs().iter().map(GraphReport::from_graph).collect(),
        }
    }
}

pub fn build_json_report<'a>(project: &str, analyses: &'a [Analysis]) -> JsonReport<'a> {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        project: project.to_string(),
        analyses: analyses.iter().map(AnalysisReport::from_analysis).collect(),
    }
}

/// Write the JSON report.
pub fn write_json<W: Write>(out: &mut W, project: &str, analyses: &[Analysis]) -> anyhow::Result<()> {
    let report = build_json_report(project, analyses);
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

/// Write a human-readable summary.
pub fn write_pretty<W: Write>(out: &mut W, project: &str, analyses: &[Analysis]) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}  {}",
        "lexgraph".cyan().bold(),
        env!("CARGO_PKG_VERSION"),
        project.dimmed()
    )?;
    writeln!(out)?;

    for analysis in analyses {
        write_analysis(out, analysis)?;
        writeln!(out)?;
    }
    Ok(())
}

fn write_analysis<W: Write>(out: &mut W, analysis: &Analysis) -> std::io::Result<()> {
    let stats = analysis.statistics();

    writeln!(out, "  {} {}", "Analysis:".dimmed(), analysis.name().bold())?;
    writeln!(out, "  {} {}", "Source:  ".dimmed(), analysis.source_directory().display())?;
    writeln!(
        out,
        "  {} {} files, {} entities, {} skipped, {} failed",
        "Results: ".dimmed(),
        stats.file_results.to_string().green(),
        stats.entity_results.to_string().green(),
        stats.skipped_files,
        colored_count(stats.parse_failures),
    )?;
    writeln!(
        out,
        "  {} {} dependencies, {} parents",
        "Unresolved:".dimmed(),
        stats.unresolved_dependencies,
        stats.unresolved_inheritance
    )?;
    writeln!(out)?;

    writeln!(out, "  {}", "Graphs".bold().underline())?;
    for graph in analysis.graphs().iter() {
        writeln!(
            out,
            "    {:<28} {:>6} nodes {:>6} edges",
            graph.kind().as_str(),
            graph.node_count(),
            graph.edge_count()
        )?;
    }

    let overall = analysis.overall_metric_results();
    if !overall.is_empty() {
        writeln!(out)?;
        writeln!(out, "  {}", "Metrics".bold().underline())?;
        for (key, value) in overall {
            writeln!(out, "    {:<52} {}", key, value.to_string().yellow())?;
        }
    }

    writeln!(out)?;
    writeln!(
        out,
        "  {}",
        format!("done in {:.2} ms", stats.total_runtime_ms()).dimmed()
    )?;
    Ok(())
}

fn colored_count(n: usize) -> ColoredString {
    if n == 0 {
        n.to_string().green()
    } else {
        n.to_string().red()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisSettings;

    fn empty_analysis() -> Analysis {
        Analysis::new(AnalysisSettings::new("empty", "/nowhere/empty")).unwrap()
    }

    #[test]
    fn test_json_report_shape() {
        let analyses = vec![empty_analysis()];
        let mut buf = Vec::new();
        write_json(&mut buf, "demo", &analyses).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["project"], "demo");
        assert_eq!(value["analyses"][0]["name"], "empty");
        assert_eq!(value["analyses"][0]["statistics"]["file_results"], 0);
        assert!(value["analyses"][0]["graphs"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_pretty_mentions_analysis() {
        colored::control::set_override(false);
        let analyses = vec![empty_analysis()];
        let mut buf = Vec::new();
        write_pretty(&mut buf, "demo", &analyses).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Analysis: empty"));
        assert!(text.contains("0 files, 0 entities"));
    }
}
