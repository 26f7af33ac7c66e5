//! Application configuration.
//!
//! Values are resolved in this order, highest first: command-line flag,
//! environment variable, TOML file, built-in default. Every section of the
//! file is optional and every field inside a section has a default, so an
//! empty file (or no file at all) yields a working configuration.

use std::path::{Path, PathBuf};

use classifier::ClassifierConfig;
use fetcher::FetchConfig;
use llm::LlmConfig;
use nodes::PreprocessRules;
use pipeline::ScoringLimits;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "earnings-pulse.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Shape of the console log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable, for local use.
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root of all persisted artifacts and the status file.
    pub data_dir: PathBuf,
    /// Address the HTTP API listens on.
    pub bind: String,
    pub log_format: LogFormat,
    /// Company name used in LLM prompts.
    pub company: String,
    pub scoring: ScoringConfig,
    pub classifier: ClassifierConfig,
    pub llm: LlmConfig,
    pub fetch: FetchConfig,
    pub preprocess: PreprocessRules,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            bind: "127.0.0.1:8000".to_string(),
            log_format: LogFormat::default(),
            company: "NVIDIA".to_string(),
            scoring: ScoringConfig::default(),
            classifier: ClassifierConfig::default(),
            llm: LlmConfig::default(),
            fetch: FetchConfig::default(),
            preprocess: PreprocessRules::default(),
        }
    }
}

/// `[scoring]`: chunking limits plus score-stage parallelism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    #[serde(flatten)]
    pub limits: ScoringLimits,
    /// Transcripts scored at the same time.
    pub concurrency: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            limits: ScoringLimits::default(),
            concurrency: 2,
        }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub bind: Option<String>,
    pub log_format: Option<LogFormat>,
}

impl AppConfig {
    /// Loads the configuration file and applies `overrides` on top.
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// read if present and defaults are used otherwise.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(config.with_overrides(overrides))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(data_dir) = overrides.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(bind) = overrides.bind {
            self.bind = bind;
        }
        if let Some(log_format) = overrides.log_format {
            self.log_format = log_format;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = write_config("");
        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn sections_override_only_the_fields_they_name() {
        let file = write_config(
            r#"
            data_dir = "/var/lib/pulse"
            log_format = "pretty"
            company = "Acme"

            [scoring]
            max_chunks = 10
            concurrency = 4

            [llm]
            model = "mistral"

            [preprocess]
            strip_terms = ["ACME"]
            "#,
        );
        let config = AppConfig::from_file(file.path()).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/pulse"));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.company, "Acme");
        assert_eq!(config.scoring.limits.max_chunks, 10);
        assert_eq!(
            config.scoring.limits.chunk_sentences,
            ScoringLimits::default().chunk_sentences
        );
        assert_eq!(config.scoring.concurrency, 4);
        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.llm.host, LlmConfig::default().host);
        assert_eq!(config.preprocess.strip_terms, vec!["ACME".to_string()]);
        assert_eq!(config.bind, AppConfig::default().bind);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("absent.toml")), Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let file = write_config("data_dir = [");
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn overrides_win_over_file_values() {
        let file = write_config("bind = \"0.0.0.0:9000\"\ndata_dir = \"from-file\"");
        let config = AppConfig::load(
            Some(file.path()),
            Overrides {
                data_dir: Some(PathBuf::from("from-flag")),
                bind: None,
                log_format: Some(LogFormat::Pretty),
            },
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("from-flag"));
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }
}
