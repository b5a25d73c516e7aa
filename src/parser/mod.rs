//! Per-language parsers and extension-based dispatch.
//!
//! This module provides:
//! - `LexicalParser`: drives the scanner for one [`Language`] and keeps its
//!   own result set until the orchestrator merges it into the analysis
//! - `ParserRegistry`: one parser per permitted language, selected by file
//!   extension (shared `.h` headers resolved by the permitted-language hint)
//! - `ParseError`: per-file failures and "not applicable" signals

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::analysis::{Analysis, CodeResult, EntityResult, FileResult, ResultCore};
use crate::language::{Language, LanguageRules};
use crate::scanner::{self, EntitySpan, StripMode};

/// Errors scoped to a single file or parser. None of these stop a run.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The language has no entity concept; callers skip and continue.
    #[error("entity results are not applicable to {0}")]
    NotApplicable(Language),

    /// Entity derivation ran on a parser holding no file results, e.g.
    /// after its results were already merged into the analysis.
    #[error("{0} parser holds no file results to derive entities from")]
    NoFileResults(Language),

    #[error("no parser for {}", .0.display())]
    Unsupported(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is {size} bytes, over the {limit} byte limit", .path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
}

impl ParseError {
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, ParseError::NotApplicable(_))
    }
}

/// Parser for one language.
///
/// Results accumulate in the parser until [`LexicalParser::take_results`]
/// (via `Analysis::collect_results_from_parser`) moves them out.
#[derive(Debug)]
pub struct LexicalParser {
    language: Language,
    rules: &'static LanguageRules,
    file_results: BTreeMap<String, FileResult>,
    entity_results: BTreeMap<String, EntityResult>,
}

impl LexicalParser {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            rules: language.rules(),
            file_results: BTreeMap::new(),
            entity_results: BTreeMap::new(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn supports_entities(&self) -> bool {
        self.rules.entities.is_some()
    }

    /// Scan one file into a result without registering it.
    ///
    /// Pure: the same content under the same path always gives an identical result.
    pub fn generate_file_result(
        &self,
        analysis: &Analysis,
        file_name: &str,
        full_path: &Path,
        content: &str,
    ) -> FileResult {
        let scanned = scanner::scan(content, self.rules);
        let imports = analysis
            .filters()
            .prepare_imports(analysis.settings(), scanned.imports);

        let display_name = full_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());

        let core = ResultCore::new(
            analysis.unique_file_name(full_path),
            display_name,
            full_path.to_path_buf(),
            analysis.id(),
            self.language,
            content.to_string(),
            scanned.tokens,
            imports,
        );
        FileResult::new(core, scanned.entity_spans)
    }

    /// Scan one file and register the result in this parser's set.
    pub fn generate_file_result_from_analysis(
        &mut self,
        analysis: &Analysis,
        file_name: &str,
        full_path: &Path,
        content: &str,
    ) {
        let result = self.generate_file_result(analysis, file_name, full_path, content);
        self.register_file_result(result);
    }

    pub fn register_file_result(&mut self, result: FileResult) {
        tracing::trace!(result = result.unique_name(), tokens = result.tokens().len(), "file result");
        self.file_results
            .insert(result.unique_name().to_string(), result);
    }

    /// Derive entity results from this parser's file results.
    ///
    /// Must run before [`LexicalParser::take_results`] empties the parser.
    pub fn generate_entity_results(&self, analysis: &Analysis) -> Result<Vec<EntityResult>, ParseError> {
        if !self.supports_entities() {
            return Err(ParseError::NotApplicable(self.language));
        }
        if self.file_results.is_empty() {
            return Err(ParseError::NoFileResults(self.language));
        }

        let mut entities = Vec::new();
        for file in self.file_results.values() {
            entities.extend(self.entities_of(analysis, file));
        }
        Ok(entities)
    }

    /// Derive entity results and register them in this parser's set.
    /// Returns how many were registered.
    pub fn generate_entity_results_from_analysis(&mut self, analysis: &Analysis) -> Result<usize, ParseError> {
        let entities = self.generate_entity_results(analysis)?;
        let count = entities.len();
        for entity in entities {
            self.entity_results
                .insert(entity.unique_name().to_string(), entity);
        }
        Ok(count)
    }

    /// Spans sharing a qualified name (Objective-C `@interface` +
    /// `@implementation`) become one entity. Nested declarations are
    /// qualified by the spans enclosing them, so `A.Node` and `B.Node` stay apart.
    fn entities_of(&self, analysis: &Analysis, file: &FileResult) -> Vec<EntityResult> {
        let spans = file.entity_spans();
        let mut grouped: Vec<(String, &str, Vec<&EntitySpan>)> = Vec::new();
        for span in spans {
            let qualified = qualified_name(spans, span);
            match grouped.iter_mut().find(|(name, _, _)| *name == qualified) {
                Some((_, _, members)) => members.push(span),
                None => grouped.push((qualified, span.name.as_str(), vec![span])),
            }
        }

        let source = file.source();
        let code = scanner::strip(source, self.rules, StripMode::CommentsAndStrings);
        let settings = analysis.settings();

        grouped
            .into_iter()
            .filter(|(qualified, name, _)| {
                let ignored = analysis.filters().ignores_entity(settings, name);
                if ignored {
                    tracing::debug!(entity = %qualified, file = file.unique_name(), "entity ignored");
                }
                !ignored
            })
            .map(|(qualified, name, spans)| {
                let mut text = Vec::with_capacity(spans.len());
                let mut tokens = Vec::new();
                let mut parents: Vec<String> = Vec::new();
                for span in &spans {
                    text.push(&source[span.start..span.end]);
                    tokens.extend(scanner::tokenize(&code[span.start..span.end], self.rules));
                    for parent in &span.parents {
                        if !parents.contains(parent) {
                            parents.push(parent.clone());
                        }
                    }
                }

                let first = spans[0];
                let last_line = spans.iter().map(|s| s.end_line).max().unwrap_or(first.end_line);

                let core = ResultCore::new(
                    format!("{}:{}", file.unique_name(), qualified),
                    name.to_string(),
                    file.file_path().to_path_buf(),
                    analysis.id(),
                    self.language,
                    text.join("\n"),
                    tokens,
                    file.imports().to_vec(),
                );
                EntityResult::new(
                    core,
                    first.kind,
                    parents,
                    file.unique_name().to_string(),
                    (first.start_line, last_line),
                )
            })
            .collect()
    }

    pub fn file_results(&self) -> &BTreeMap<String, FileResult> {
        &self.file_results
    }

    pub fn entity_results(&self) -> &BTreeMap<String, EntityResult> {
        &self.entity_results
    }

    /// Move the accumulated results out, leaving the parser empty.
    pub fn take_results(&mut self) -> (BTreeMap<String, FileResult>, BTreeMap<String, EntityResult>) {
        (
            std::mem::take(&mut self.file_results),
            std::mem::take(&mut self.entity_results),
        )
    }
}

/// `Outer.Inner` for a span nested in others, the bare name otherwise.
fn qualified_name(spans: &[EntitySpan], span: &EntitySpan) -> String {
    let mut enclosing: Vec<&EntitySpan> = spans
        .iter()
        .filter(|outer| outer.start < span.start && span.end <= outer.end)
        .collect();
    if enclosing.is_empty() {
        return span.name.clone();
    }
    enclosing.sort_by_key(|outer| outer.start);

    let mut parts: Vec<&str> = enclosing.iter().map(|outer| outer.name.as_str()).collect();
    parts.push(&span.name);
    parts.join(".")
}

/// One parser per permitted language.
#[derive(Debug)]
pub struct ParserRegistry {
    permitted: Vec<Language>,
    parsers: BTreeMap<Language, LexicalParser>,
}

impl ParserRegistry {
    /// `permitted` empty means every supported language.
    pub fn new(permitted: &[Language]) -> Self {
        let languages: Vec<Language> = if permitted.is_empty() {
            Language::ALL.to_vec()
        } else {
            permitted.to_vec()
        };
        let parsers = languages
            .iter()
            .map(|&lang| (lang, LexicalParser::new(lang)))
            .collect();

        Self {
            permitted: permitted.to_vec(),
            parsers,
        }
    }

    /// Pick the parser language for a path by its extension.
    pub fn choose_parser(&self, path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?;
        Language::for_extension(ext, &self.permitted).filter(|lang| self.parsers.contains_key(lang))
    }

    pub fn get(&self, language: Language) -> Option<&LexicalParser> {
        self.parsers.get(&language)
    }

    pub fn get_mut(&mut self, language: Language) -> Option<&mut LexicalParser> {
        self.parsers.get_mut(&language)
    }

    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.parsers.keys().copied()
    }

    pub fn parsers_mut(&mut self) -> impl Iterator<Item = &mut LexicalParser> {
        self.parsers.values_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}
