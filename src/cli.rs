//! Command-line interface for lexgraph.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use crate::analyzer::Analyzer;
use crate::config::{discover_config, ProjectConfig};
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

/// Multi-language lexical code analyzer.
///
/// Scans a source tree, extracts files and the types declared in them,
/// builds dependency and inheritance graphs and computes structural metrics.
#[derive(Parser)]
#[command(name = "lexgraph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a source tree
    Analyze(AnalyzeArgs),
    /// Create a project file from a template
    Init(InitArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Source directory (ignored when the project file lists analyses)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Project YAML file (default: auto-discover in PATH, else analyze PATH with every metric)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show a progress bar while parsing
    #[arg(long)]
    pub progress: bool,

    /// Log level (overrides the project file; RUST_LOG overrides both)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Where to write the project file
    #[arg(short, long, default_value = "lexgraph.yaml")]
    pub output: PathBuf,

    /// Template name (see --list)
    #[arg(short, long, default_value = "default")]
    pub template: String,

    /// Print the bundled templates and exit
    #[arg(short, long)]
    pub list: bool,

    /// Replace an existing project file
    #[arg(long)]
    pub force: bool,
}

/// A bundled project file.
struct ProjectTemplate {
    name: &'static str,
    summary: &'static str,
    yaml: &'static str,
}

static PROJECT_TEMPLATES: &[ProjectTemplate] = &[
    ProjectTemplate {
        name: "default",
        summary: "One analysis over ./src with every built-in metric",
        yaml: include_str!("templates/default.yaml"),
    },
    ProjectTemplate {
        name: "minimal",
        summary: "Dependency graphs and method counts only",
        yaml: include_str!("templates/minimal.yaml"),
    },
];

fn find_template(name: &str) -> Option<&'static ProjectTemplate> {
    PROJECT_TEMPLATES.iter().find(|t| t.name.eq_ignore_ascii_case(name))
}

/// Install the stderr subscriber. `RUST_LOG` wins over `level`.
pub fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Load the project: explicit file, discovered file, or a default analysis.
fn load_project(args: &AnalyzeArgs) -> anyhow::Result<ProjectConfig> {
    let path = match &args.config {
        Some(path) => Some(path.clone()),
        None => discover_config(&args.path),
    };

    let config = match path {
        Some(path) => ProjectConfig::parse_file(&path)
            .with_context(|| format!("loading project file {}", path.display()))?,
        None => ProjectConfig::default_for(&absolute(&args.path)),
    };
    Ok(config)
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let mut project = match load_project(args) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };
    if let Some(level) = &args.log_level {
        project.loglevel = level.clone();
    }
    if let Err(e) = project.validate() {
        eprintln!("Error: invalid project: {}", e);
        return Ok(EXIT_ERROR);
    }

    init_tracing(&project.loglevel.to_lowercase());

    let mut analyses = Vec::with_capacity(project.analyses.len());
    for config in project.analyses.clone() {
        let name = config.settings.analysis_name.clone();
        let mut analyzer = Analyzer::from_config(config)
            .with_context(|| format!("preparing analysis {:?}", name))?
            .with_progress(args.progress);
        analyzer
            .start_analyzing()
            .with_context(|| format!("running analysis {:?}", name))?;
        analyses.push(analyzer.into_analysis());
    }

    let project_name = if project.project_name.is_empty() {
        "lexgraph".to_string()
    } else {
        project.project_name.clone()
    };

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating report file {}", path.display()))?;
            let mut out = BufWriter::new(file);
            colored::control::set_override(false);
            write_report(&mut out, args.format, &project_name, &analyses)?;
            out.flush()?;
            eprintln!("Report written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_report(&mut out, args.format, &project_name, &analyses)?;
        }
    }

    Ok(EXIT_SUCCESS)
}

fn write_report<W: Write>(
    out: &mut W,
    format: OutputFormat,
    project: &str,
    analyses: &[crate::analysis::Analysis],
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => report::write_json(out, project, analyses),
        OutputFormat::Pretty => Ok(report::write_pretty(out, project, analyses)?),
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.list {
        print_templates();
        return Ok(EXIT_SUCCESS);
    }

    let Some(template) = find_template(&args.template) else {
        eprintln!("Error: no template named {:?} (try `lexgraph init --list`)", args.template);
        return Ok(EXIT_ERROR);
    };

    let target = &args.output;
    if target.exists() && !args.force {
        eprintln!(
            "Error: {} already exists, pass --force to replace it",
            target.display()
        );
        return Ok(EXIT_ERROR);
    }

    match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?,
        _ => {}
    }
    std::fs::write(target, template.yaml)
        .with_context(|| format!("writing {}", target.display()))?;

    println!("Wrote {} ({} template)", target.display(), template.name);
    println!("Point source_directory at your code, then run:");
    println!("  lexgraph analyze --config {}", target.display());

    Ok(EXIT_SUCCESS)
}

fn print_templates() {
    println!("Bundled project templates:");
    for template in PROJECT_TEMPLATES {
        let metrics = serde_yaml::from_str::<ProjectConfig>(template.yaml)
            .map(|config| {
                config
                    .analyses
                    .iter()
                    .map(|a| a.file_scan.len() + a.entity_scan.len())
                    .sum::<usize>()
            })
            .unwrap_or(0);
        println!("  {:<10} {} [{} metric slots]", template.name, template.summary, metrics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse() {
        for template in PROJECT_TEMPLATES {
            let config: ProjectConfig = serde_yaml::from_str(template.yaml)
                .unwrap_or_else(|e| panic!("template {} does not parse: {}", template.name, e));
            assert!(!config.analyses.is_empty(), "template {}", template.name);
            for analysis in &config.analyses {
                assert!(analysis.unknown.is_empty(), "template {}: {:?}", template.name, analysis.unknown);
            }
        }
    }

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::try_parse_from(["lexgraph", "analyze", "src", "-f", "json", "--progress"]).unwrap();
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.path, PathBuf::from("src"));
                assert_eq!(args.format, OutputFormat::Json);
                assert!(args.progress);
                assert!(args.config.is_none());
            }
            Commands::Init(_) => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_find_template() {
        assert_eq!(find_template("Minimal").map(|t| t.name), Some("minimal"));
        assert!(find_template("nope").is_none());
    }

    #[test]
    fn test_init_writes_and_refuses_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("conf/lexgraph.yaml");
        let mut args = InitArgs {
            output: output.clone(),
            template: "minimal".to_string(),
            list: false,
            force: false,
        };

        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        assert!(output.is_file());
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);

        args.force = true;
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
    }
}
