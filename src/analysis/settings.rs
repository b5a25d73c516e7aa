//! Per-analysis settings and the filters compiled from them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::graph::ResolutionPolicy;
use crate::language::Language;

/// Everything that scopes one analysis run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub analysis_name: String,
    pub source_directory: PathBuf,
    /// Empty permits every language.
    pub only_permit_languages: Vec<Language>,
    /// Extensions without the dot. Empty permits every known extension.
    pub only_permit_file_extensions: Vec<String>,
    pub ignore_directories_containing: Vec<String>,
    pub ignore_files_containing: Vec<String>,
    /// Glob patterns (e.g. `**/generated/**`) matched against paths relative to the source root.
    pub excluded_paths: Vec<String>,
    pub ignore_dependencies_containing: Vec<String>,
    /// Regular expressions.
    pub ignore_dependencies_matching: Vec<String>,
    pub ignore_entities_containing: Vec<String>,
    /// Regular expressions.
    pub ignore_entities_matching: Vec<String>,
    /// Prefix rewrites applied to raw import references (`@/` -> `src/`).
    pub import_aliases: BTreeMap<String, String>,
    pub resolution: ResolutionPolicy,
    /// Files larger than this are abandoned and counted as skipped.
    pub max_file_bytes: Option<u64>,
}

impl AnalysisSettings {
    pub fn new(analysis_name: impl Into<String>, source_directory: impl Into<PathBuf>) -> Self {
        Self {
            analysis_name: analysis_name.into(),
            source_directory: source_directory.into(),
            ..Self::default()
        }
    }
}

/// Compiled form of the pattern-based settings.
#[derive(Debug, Clone)]
pub struct Filters {
    dependency_patterns: Vec<Regex>,
    entity_patterns: Vec<Regex>,
    excluded_paths: GlobSet,
}

impl Filters {
    pub fn compile(settings: &AnalysisSettings) -> Result<Self, ConfigError> {
        let mut globs = GlobSetBuilder::new();
        for pattern in &settings.excluded_paths {
            let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            globs.add(glob);
        }
        let excluded_paths = globs.build().map_err(|e| ConfigError::InvalidGlob {
            pattern: settings.excluded_paths.join(", "),
            message: e.to_string(),
        })?;

        Ok(Self {
            dependency_patterns: compile_all(&settings.ignore_dependencies_matching)?,
            entity_patterns: compile_all(&settings.ignore_entities_matching)?,
            excluded_paths,
        })
    }

    /// Apply aliases and drop ignored references.
    pub fn prepare_imports(&self, settings: &AnalysisSettings, imports: Vec<String>) -> Vec<String> {
        imports
            .into_iter()
            .map(|reference| apply_alias(&settings.import_aliases, reference))
            .filter(|reference| !self.ignores_dependency(settings, reference))
            .collect()
    }

    pub fn ignores_dependency(&self, settings: &AnalysisSettings, reference: &str) -> bool {
        settings
            .ignore_dependencies_containing
            .iter()
            .any(|needle| reference.contains(needle.as_str()))
            || self.dependency_patterns.iter().any(|re| re.is_match(reference))
    }

    pub fn ignores_entity(&self, settings: &AnalysisSettings, name: &str) -> bool {
        settings
            .ignore_entities_containing
            .iter()
            .any(|needle| name.contains(needle.as_str()))
            || self.entity_patterns.iter().any(|re| re.is_match(name))
    }

    pub fn is_path_excluded(&self, relative: &Path) -> bool {
        self.excluded_paths.is_match(relative)
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| ConfigError::InvalidPattern {
                pattern: p.clone(),
                message: e.to_string(),
            })
        })
        .collect()
}

/// Longest matching alias prefix wins.
fn apply_alias(aliases: &BTreeMap<String, String>, reference: String) -> String {
    let best = aliases
        .iter()
        .filter(|(alias, _)| reference.starts_with(alias.as_str()))
        .max_by_key(|(alias, _)| alias.len());

    match best {
        Some((alias, target)) => format!("{}{}", target, &reference[alias.len()..]),
        None => reference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_aliases_and_ignores() {
        let mut settings = AnalysisSettings::new("demo", "/tmp/demo");
        settings.import_aliases.insert("@/".into(), "src/".into());
        settings.import_aliases.insert("@/lib/".into(), "vendor/lib/".into());
        settings.ignore_dependencies_containing.push("node_modules".into());
        settings.ignore_dependencies_matching.push(r"^java\.".into());

        let filters = Filters::compile(&settings).unwrap();
        let imports = vec![
            "@/components/Button".to_string(),
            "@/lib/format".to_string(),
            "java.util.List".to_string(),
            "pkg/node_modules/x".to_string(),
            "com.acme.Thing".to_string(),
        ];

        assert_eq!(
            filters.prepare_imports(&settings, imports),
            vec!["src/components/Button", "vendor/lib/format", "com.acme.Thing"]
        );
    }

    #[test]
    fn test_entity_ignores() {
        let mut settings = AnalysisSettings::new("demo", "/tmp/demo");
        settings.ignore_entities_containing.push("Test".into());
        settings.ignore_entities_matching.push(r"^Mock[A-Z]".into());
        let filters = Filters::compile(&settings).unwrap();

        assert!(filters.ignores_entity(&settings, "FooTest"));
        assert!(filters.ignores_entity(&settings, "MockServer"));
        assert!(!filters.ignores_entity(&settings, "Mockingbird"));
    }

    #[test]
    fn test_invalid_regex_is_config_error() {
        let mut settings = AnalysisSettings::new("demo", "/tmp/demo");
        settings.ignore_entities_matching.push("(unclosed".into());
        assert!(matches!(
            Filters::compile(&settings),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_excluded_paths() {
        let mut settings = AnalysisSettings::new("demo", "/tmp/demo");
        settings.excluded_paths.push("**/generated/**".into());
        let filters = Filters::compile(&settings).unwrap();

        assert!(filters.is_path_excluded(Path::new("src/generated/Api.java")));
        assert!(!filters.is_path_excluded(Path::new("src/main/Api.java")));
    }
}
