//! File and entity results.
//!
//! Both kinds share a [`ResultCore`] and the [`CodeResult`] capability set.
//! Scanned content (tokens, imports, source) is fixed at construction; only
//! the metrics map changes afterwards, and only through the metric engine.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::AnalysisId;
use crate::language::{EntityKind, Language};
use crate::metrics::MetricValue;
use crate::scanner::EntitySpan;

/// Which kind of result; also the scope a metric runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    File,
    Entity,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::File => "file",
            ResultKind::Entity => "entity",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            ResultKind::File => "files",
            ResultKind::Entity => "entities",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Data common to every result.
#[derive(Debug, Clone, Serialize)]
pub struct ResultCore {
    unique_name: String,
    display_name: String,
    file_path: PathBuf,
    #[serde(skip)]
    analysis: AnalysisId,
    language: Language,
    #[serde(skip)]
    source: String,
    #[serde(skip)]
    tokens: Vec<String>,
    imports: Vec<String>,
    metrics: BTreeMap<String, MetricValue>,
}

impl ResultCore {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        unique_name: String,
        display_name: String,
        file_path: PathBuf,
        analysis: AnalysisId,
        language: Language,
        source: String,
        tokens: Vec<String>,
        imports: Vec<String>,
    ) -> Self {
        Self {
            unique_name,
            display_name,
            file_path,
            analysis,
            language,
            source,
            tokens,
            imports,
            metrics: BTreeMap::new(),
        }
    }
}

/// Shared read access to file and entity results.
pub trait CodeResult {
    fn core(&self) -> &ResultCore;

    fn kind(&self) -> ResultKind;

    /// Corpus-wide identity; the graph node and metrics key.
    fn unique_name(&self) -> &str {
        &self.core().unique_name
    }

    /// Name as declared (file name or entity name).
    fn display_name(&self) -> &str {
        &self.core().display_name
    }

    fn file_path(&self) -> &Path {
        &self.core().file_path
    }

    /// The analysis this result belongs to.
    fn analysis(&self) -> AnalysisId {
        self.core().analysis
    }

    fn language(&self) -> Language {
        self.core().language
    }

    fn source(&self) -> &str {
        &self.core().source
    }

    fn tokens(&self) -> &[String] {
        &self.core().tokens
    }

    /// Raw import references, unresolved.
    fn imports(&self) -> &[String] {
        &self.core().imports
    }

    fn metrics(&self) -> &BTreeMap<String, MetricValue> {
        &self.core().metrics
    }

    fn metric(&self, key: &str) -> Option<&MetricValue> {
        self.core().metrics.get(key)
    }

    /// Superclass / interface references. Empty for files.
    fn parents(&self) -> &[String] {
        &[]
    }
}

/// A scanned source file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    #[serde(flatten)]
    core: ResultCore,
    entity_spans: Vec<EntitySpan>,
}

impl FileResult {
    pub(crate) fn new(core: ResultCore, entity_spans: Vec<EntitySpan>) -> Self {
        Self { core, entity_spans }
    }

    /// Entity declarations found while scanning.
    pub fn entity_spans(&self) -> &[EntitySpan] {
        &self.entity_spans
    }

    pub(crate) fn metrics_mut(&mut self) -> &mut BTreeMap<String, MetricValue> {
        &mut self.core.metrics
    }
}

impl CodeResult for FileResult {
    fn core(&self) -> &ResultCore {
        &self.core
    }

    fn kind(&self) -> ResultKind {
        ResultKind::File
    }
}

/// A named type declared inside a file.
#[derive(Debug, Clone, Serialize)]
pub struct EntityResult {
    #[serde(flatten)]
    core: ResultCore,
    entity_kind: EntityKind,
    parents: Vec<String>,
    file_unique_name: String,
    start_line: usize,
    end_line: usize,
}

impl EntityResult {
    pub(crate) fn new(
        core: ResultCore,
        entity_kind: EntityKind,
        parents: Vec<String>,
        file_unique_name: String,
        lines: (usize, usize),
    ) -> Self {
        Self {
            core,
            entity_kind,
            parents,
            file_unique_name,
            start_line: lines.0,
            end_line: lines.1,
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        self.entity_kind
    }

    /// Unique name of the file declaring this entity.
    pub fn file_unique_name(&self) -> &str {
        &self.file_unique_name
    }

    pub fn lines(&self) -> (usize, usize) {
        (self.start_line, self.end_line)
    }

    pub(crate) fn metrics_mut(&mut self) -> &mut BTreeMap<String, MetricValue> {
        &mut self.core.metrics
    }
}

impl CodeResult for EntityResult {
    fn core(&self) -> &ResultCore {
        &self.core
    }

    fn kind(&self) -> ResultKind {
        ResultKind::Entity
    }

    fn parents(&self) -> &[String] {
        &self.parents
    }
}

/// Borrowed view over either result kind.
#[derive(Debug, Clone, Copy)]
pub enum ResultRef<'a> {
    File(&'a FileResult),
    Entity(&'a EntityResult),
}

impl<'a> ResultRef<'a> {
    pub fn as_entity(&self) -> Option<&'a EntityResult> {
        match self {
            ResultRef::Entity(entity) => Some(entity),
            ResultRef::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&'a FileResult> {
        match self {
            ResultRef::File(file) => Some(file),
            ResultRef::Entity(_) => None,
        }
    }
}

impl CodeResult for ResultRef<'_> {
    fn core(&self) -> &ResultCore {
        match self {
            ResultRef::File(file) => file.core(),
            ResultRef::Entity(entity) => entity.core(),
        }
    }

    fn kind(&self) -> ResultKind {
        match self {
            ResultRef::File(_) => ResultKind::File,
            ResultRef::Entity(_) => ResultKind::Entity,
        }
    }

    fn parents(&self) -> &[String] {
        match self {
            ResultRef::File(_) => &[],
            ResultRef::Entity(entity) => entity.parents(),
        }
    }
}
