//! Project configuration.
//!
//! A project file lists one or more analyses, each with its settings and the
//! metrics to run on file and entity results:
//!
//! ```yaml
//! project_name: shop
//! loglevel: info
//! analyses:
//!   - analysis_name: backend
//!     source_directory: ./backend
//!     only_permit_languages: [java]
//!     file_scan: [number_of_methods, source_lines_of_code, fan_in_out]
//!     entity_scan: [number_of_methods, fan_in_out, louvain_modularity]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::{Analysis, AnalysisSettings, ResultKind};
use crate::metrics::BuiltinMetric;

/// File names searched for when no config is given.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["lexgraph.yaml", ".lexgraph.yaml"];

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unknown key `{key}` in analysis {analysis:?}")]
    UnknownField { analysis: String, key: String },

    #[error("analysis name {0:?} is used more than once")]
    DuplicateAnalysis(String),

    #[error("source directory {0} does not exist")]
    SourceNotFound(PathBuf),

    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid glob {pattern:?}: {message}")]
    InvalidGlob { pattern: String, message: String },

    #[error("invalid log level {0:?}, expected one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

fn default_loglevel() -> String {
    "info".to_string()
}

/// Top-level project file. Unknown keys are a parse error.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub project_name: String,
    #[serde(default = "default_loglevel")]
    pub loglevel: String,
    #[serde(default)]
    pub analyses: Vec<AnalysisConfig>,
}

/// One analysis: its settings plus the metrics to register.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    #[serde(flatten)]
    pub settings: AnalysisSettings,
    #[serde(default)]
    pub file_scan: Vec<BuiltinMetric>,
    #[serde(default)]
    pub entity_scan: Vec<BuiltinMetric>,
    /// Keys no other field claims; `validate` rejects them.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl AnalysisConfig {
    /// An analysis over `source_directory` running every built-in metric.
    pub fn with_all_metrics(name: impl Into<String>, source_directory: impl Into<PathBuf>) -> Self {
        Self {
            settings: AnalysisSettings::new(name, source_directory),
            file_scan: BuiltinMetric::ALL.to_vec(),
            entity_scan: BuiltinMetric::ALL.to_vec(),
            unknown: BTreeMap::new(),
        }
    }

    /// Create the analysis and register its metrics.
    pub fn into_analysis(self) -> Result<Analysis, ConfigError> {
        let mut analysis = Analysis::new(self.settings)?;
        for metric in self.file_scan {
            analysis.register_metric(ResultKind::File, metric.create());
        }
        for metric in self.entity_scan {
            analysis.register_metric(ResultKind::Entity, metric.create());
        }
        Ok(analysis)
    }
}

impl ProjectConfig {
    /// Parse a project file. Relative source directories are resolved
    /// against the file's directory.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: ProjectConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for analysis in &mut config.analyses {
            let dir = &analysis.settings.source_directory;
            if dir.is_relative() {
                analysis.settings.source_directory = base.join(dir);
            }
        }
        Ok(config)
    }

    /// A single analysis over `path` with every built-in metric.
    pub fn default_for(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "default".to_string());

        Self {
            project_name: name.clone(),
            loglevel: default_loglevel(),
            analyses: vec![AnalysisConfig::with_all_metrics(name, path)],
        }
    }

    /// Check the configuration before any analysis runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.loglevel.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.loglevel.clone()));
        }
        if self.analyses.is_empty() {
            return Err(ConfigError::MissingField("analyses"));
        }

        let mut names = BTreeSet::new();
        for analysis in &self.analyses {
            let settings = &analysis.settings;
            if settings.analysis_name.trim().is_empty() {
                return Err(ConfigError::MissingField("analysis_name"));
            }
            if let Some(key) = analysis.unknown.keys().next() {
                return Err(ConfigError::UnknownField {
                    analysis: settings.analysis_name.clone(),
                    key: key.clone(),
                });
            }
            if !names.insert(settings.analysis_name.as_str()) {
                return Err(ConfigError::DuplicateAnalysis(settings.analysis_name.clone()));
            }
            if settings.source_directory.as_os_str().is_empty() {
                return Err(ConfigError::MissingField("source_directory"));
            }
            if !settings.source_directory.is_dir() {
                return Err(ConfigError::SourceNotFound(settings.source_directory.clone()));
            }
            // compiles every regex and glob
            crate::analysis::Filters::compile(settings)?;
        }
        Ok(())
    }
}

/// Find a project file in `dir`.
pub fn discover_config(dir: &Path) -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_project() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        let path = write(
            &dir,
            "lexgraph.yaml",
            r#"
project_name: demo
analyses:
  - analysis_name: core
    source_directory: src
    only_permit_languages: [java, cpp]
    ignore_dependencies_matching: ["^java\\."]
    resolution: strict
    file_scan: [number_of_methods, fan_in_out]
    entity_scan: [louvain_modularity]
"#,
        );

        let config = ProjectConfig::parse_file(&path).unwrap();
        assert_eq!(config.project_name, "demo");
        assert_eq!(config.loglevel, "info");

        let analysis = &config.analyses[0];
        assert_eq!(analysis.settings.source_directory, dir.path().join("src"));
        assert_eq!(
            analysis.settings.only_permit_languages,
            vec![Language::Java, Language::Cpp]
        );
        assert_eq!(analysis.settings.resolution, crate::graph::ResolutionPolicy::Strict);
        assert_eq!(
            analysis.file_scan,
            vec![BuiltinMetric::NumberOfMethods, BuiltinMetric::FanInOut]
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_language_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "lexgraph.yaml",
            "analyses:\n  - analysis_name: a\n    source_directory: .\n    only_permit_languages: [cobol]\n",
        );
        assert!(matches!(
            ProjectConfig::parse_file(&path),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "lexgraph.yaml",
            "projectname: typo\nanalyses:\n  - analysis_name: a\n    source_directory: .\n",
        );
        let err = ProjectConfig::parse_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().contains("projectname"));
    }

    #[test]
    fn test_unknown_analysis_key_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "lexgraph.yaml",
            "analyses:\n  - analysis_name: a\n    source_directory: .\n    file_scna: [fan_in_out]\n",
        );
        let config = ProjectConfig::parse_file(&path).unwrap();
        assert!(config.analyses[0].file_scan.is_empty());

        match config.validate() {
            Err(ConfigError::UnknownField { analysis, key }) => {
                assert_eq!(analysis, "a");
                assert_eq!(key, "file_scna");
            }
            other => panic!("expected UnknownField, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = ProjectConfig::default_for(dir.path());
        config.analyses.push(config.analyses[0].clone());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateAnalysis(_))
        ));
    }

    #[test]
    fn test_missing_source_rejected() {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig::default_for(&dir.path().join("nope"));
        assert!(matches!(config.validate(), Err(ConfigError::SourceNotFound(_))));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = ProjectConfig::default_for(dir.path());
        config.analyses[0]
            .settings
            .ignore_entities_matching
            .push("(unclosed".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_loglevel_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = ProjectConfig::default_for(dir.path());
        config.loglevel = "loud".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLogLevel(_))));
    }

    #[test]
    fn test_into_analysis_registers_metrics() {
        let dir = TempDir::new().unwrap();
        let config = ProjectConfig::default_for(dir.path());
        let analysis = config.analyses[0].clone().into_analysis().unwrap();
        assert_eq!(analysis.metrics_for_file_results().len(), BuiltinMetric::ALL.len());
        assert_eq!(analysis.metrics_for_entity_results().len(), BuiltinMetric::ALL.len());
    }

    #[test]
    fn test_discover_config() {
        let dir = TempDir::new().unwrap();
        assert_eq!(discover_config(dir.path()), None);
        let path = write(&dir, ".lexgraph.yaml", "analyses: []\n");
        assert_eq!(discover_config(dir.path()), Some(path));
    }
}
