//! Orchestration of one analysis run.
//!
//! The analyzer walks a fixed sequence of phases:
//!
//! ```text
//! Discover -> ParseFiles -> ParseEntities -> BuildGraph -> CodeMetrics -> GraphMetrics -> Done
//! ```
//!
//! Any phase may end in `Error` on a configuration failure. Per-file failures
//! (unreadable, oversized) are logged, counted and skipped.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::analysis::{Analysis, AnalysisSettings, FileResult};
use crate::config::{AnalysisConfig, ConfigError};
use crate::graph::build_graphs;
use crate::language::Language;
use crate::metrics::{calculate_code_metrics, calculate_graph_metrics};
use crate::parser::{ParseError, ParserRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerState {
    Discover,
    ParseFiles,
    ParseEntities,
    BuildGraph,
    CodeMetrics,
    GraphMetrics,
    Done,
    Error,
}

impl AnalyzerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerState::Discover => "discover",
            AnalyzerState::ParseFiles => "parse-files",
            AnalyzerState::ParseEntities => "parse-entities",
            AnalyzerState::BuildGraph => "build-graph",
            AnalyzerState::CodeMetrics => "code-metrics",
            AnalyzerState::GraphMetrics => "graph-metrics",
            AnalyzerState::Done => "done",
            AnalyzerState::Error => "error",
        }
    }
}

impl fmt::Display for AnalyzerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("cannot read source directory {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source path {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("analyzer cannot start from state {0}")]
    AlreadyStarted(AnalyzerState),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A file selected for parsing.
#[derive(Debug, Clone)]
struct SourceFile {
    path: PathBuf,
    language: Language,
}

/// Runs one [`Analysis`] through every phase.
pub struct Analyzer {
    analysis: Analysis,
    parsers: ParserRegistry,
    state: AnalyzerState,
    progress: bool,
}

impl Analyzer {
    pub fn new(analysis: Analysis) -> Self {
        let parsers = ParserRegistry::new(&analysis.settings().only_permit_languages);
        Self {
            analysis,
            parsers,
            state: AnalyzerState::Discover,
            progress: false,
        }
    }

    /// Build the analysis described by a config entry, metrics included.
    pub fn from_config(config: AnalysisConfig) -> Result<Self, AnalyzerError> {
        Ok(Self::new(config.into_analysis()?))
    }

    /// Show a progress bar on stderr while parsing.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> AnalyzerState {
        self.state
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    /// Hand the analysis to reporting.
    pub fn into_analysis(self) -> Analysis {
        self.analysis
    }

    /// Run every phase. Only valid once, from the initial state.
    pub fn start_analyzing(&mut self) -> Result<&Analysis, AnalyzerError> {
        if self.state != AnalyzerState::Discover {
            return Err(AnalyzerError::AlreadyStarted(self.state));
        }

        let span = tracing::info_span!("analysis", name = %self.analysis.name());
        let _guard = span.enter();

        match self.run_phases() {
            Ok(()) => {
                self.state = AnalyzerState::Done;
                let stats = self.analysis.statistics();
                tracing::info!(
                    files = stats.file_results,
                    entities = stats.entity_results,
                    skipped = stats.skipped_files,
                    runtime_ms = stats.total_runtime_ms(),
                    "analysis done"
                );
                Ok(&self.analysis)
            }
            Err(e) => {
                tracing::error!(state = %self.state, error = %e, "analysis failed");
                self.state = AnalyzerState::Error;
                Err(e)
            }
        }
    }

    fn run_phases(&mut self) -> Result<(), AnalyzerError> {
        let started = Instant::now();
        let files = self.discover()?;
        self.finish_phase(started);

        self.enter(AnalyzerState::ParseFiles);
        let started = Instant::now();
        self.parse_files(&files);
        self.finish_phase(started);

        self.enter(AnalyzerState::ParseEntities);
        let started = Instant::now();
        self.parse_entities();
        self.finish_phase(started);

        self.enter(AnalyzerState::BuildGraph);
        let started = Instant::now();
        let graphs = build_graphs(&self.analysis);
        self.analysis.set_graphs(graphs);
        self.finish_phase(started);

        self.enter(AnalyzerState::CodeMetrics);
        let started = Instant::now();
        let count = calculate_code_metrics(&mut self.analysis);
        tracing::debug!(count, "code metrics calculated");
        self.finish_phase(started);

        self.enter(AnalyzerState::GraphMetrics);
        let started = Instant::now();
        let count = calculate_graph_metrics(&mut self.analysis);
        tracing::debug!(count, "graph metrics calculated");
        self.finish_phase(started);

        Ok(())
    }

    fn enter(&mut self, state: AnalyzerState) {
        tracing::debug!(from = %self.state, to = %state, "phase");
        self.state = state;
    }

    fn finish_phase(&mut self, started: Instant) {
        let phase = self.state.as_str();
        self.analysis
            .statistics_mut()
            .record_runtime(phase, started.elapsed());
    }

    fn discover(&mut self) -> Result<Vec<SourceFile>, AnalyzerError> {
        let configured = self.analysis.source_directory().to_path_buf();
        let root = configured
            .canonicalize()
            .map_err(|source| AnalyzerError::SourceUnreadable {
                path: configured.clone(),
                source,
            })?;
        if !root.is_dir() {
            return Err(AnalyzerError::NotADirectory(root));
        }
        self.analysis.set_source_directory(root.clone());

        let settings = self.analysis.settings();
        let mut files = Vec::new();
        let mut skipped = 0usize;

        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored_dir(e, settings));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    skipped += 1;
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            match self.select(&root, path, &entry) {
                Some(language) => files.push(SourceFile {
                    path: path.to_path_buf(),
                    language,
                }),
                None => skipped += 1,
            }
        }

        tracing::info!(files = files.len(), skipped, root = %root.display(), "discovery done");
        self.analysis.statistics_mut().skipped_files += skipped;
        Ok(files)
    }

    /// Decide whether a file is parsed and by which language.
    fn select(&self, root: &Path, path: &Path, entry: &DirEntry) -> Option<Language> {
        let settings = self.analysis.settings();
        let name = entry.file_name().to_string_lossy();

        if settings
            .ignore_files_containing
            .iter()
            .any(|needle| name.contains(needle.as_str()))
        {
            tracing::trace!(path = %path.display(), "ignored by name");
            return None;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        if self.analysis.filters().is_path_excluded(relative) {
            tracing::trace!(path = %path.display(), "excluded by glob");
            return None;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !settings.only_permit_file_extensions.is_empty()
            && !settings
                .only_permit_file_extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.') == ext)
        {
            return None;
        }

        let language = self.parsers.choose_parser(path)?;

        if let Some(limit) = settings.max_file_bytes {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > limit {
                let err = ParseError::TooLarge {
                    path: path.to_path_buf(),
                    size,
                    limit,
                };
                tracing::warn!("{}", err);
                return None;
            }
        }

        Some(language)
    }

    fn parse_files(&mut self, files: &[SourceFile]) {
        let bar = self.progress_bar(files.len());
        let analysis = &self.analysis;
        let parsers = &self.parsers;

        let results: Vec<Result<(Language, FileResult), ParseError>> = files
            .par_iter()
            .map(|file| -> Result<(Language, FileResult), ParseError> {
                let content = fs::read_to_string(&file.path).map_err(|source| ParseError::Unreadable {
                    path: file.path.clone(),
                    source,
                })?;
                let parser = parsers
                    .get(file.language)
                    .ok_or_else(|| ParseError::Unsupported(file.path.clone()))?;
                let file_name = file
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let result = parser.generate_file_result(analysis, &file_name, &file.path, &content);
                bar.inc(1);
                Ok((file.language, result))
            })
            .collect();
        bar.finish_and_clear();

        let mut scanned = 0usize;
        let mut failures = 0usize;
        for result in results {
            match result {
                Ok((language, file_result)) => {
                    if let Some(parser) = self.parsers.get_mut(language) {
                        parser.register_file_result(file_result);
                        scanned += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "file skipped");
                    failures += 1;
                }
            }
        }

        let stats = self.analysis.statistics_mut();
        stats.scanned_files += scanned;
        stats.parse_failures += failures;
    }

    fn parse_entities(&mut self) {
        let mut not_applicable = 0usize;
        let mut failures = 0usize;

        for parser in self.parsers.parsers_mut() {
            if parser.file_results().is_empty() {
                continue;
            }
            match parser.generate_entity_results_from_analysis(&self.analysis) {
                Ok(count) => {
                    tracing::debug!(language = %parser.language(), count, "entities derived");
                }
                Err(e) if e.is_not_applicable() => {
                    tracing::debug!(language = %parser.language(), "entity derivation not applicable");
                    not_applicable += 1;
                }
                Err(e) => {
                    tracing::warn!(language = %parser.language(), error = %e, "entity derivation failed");
                    failures += 1;
                }
            }
        }

        for parser in self.parsers.parsers_mut() {
            self.analysis.collect_results_from_parser(parser);
        }

        let stats = self.analysis.statistics_mut();
        stats.entities_not_applicable += not_applicable;
        stats.parse_failures += failures;
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(format!("parsing {}", self.analysis.name()));
        bar
    }
}

fn is_ignored_dir(entry: &DirEntry, settings: &AnalysisSettings) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.')
        || settings
            .ignore_directories_containing
            .iter()
            .any(|needle| name.contains(needle.as_str()))
}

/// Run a complete analysis and return it.
pub fn analyze(analysis: Analysis) -> Result<Analysis, AnalyzerError> {
    let mut analyzer = Analyzer::new(analysis);
    analyzer.start_analyzing()?;
    Ok(analyzer.into_analysis())
}
