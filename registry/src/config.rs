//! Validator configuration file.
//!
//! Controls which definition files are loaded, the input size limit, how
//! reports are written, and how many documents are validated in parallel.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! schemas:
//!   - schemas/
//!   - extra/invoice.yaml
//! limits:
//!   max_document_bytes: 1048576
//! output:
//!   include_value: true
//!   format: json
//! jobs: 4
//! ```
//!
//! Relative schema paths are resolved against the directory holding the
//! configuration file.

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::loader::{RegistryBuilder, RegistrySource};

/// Input limits applied before a document is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Documents larger than this are rejected unread.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
}

fn default_max_document_bytes() -> usize {
    16 * 1024 * 1024
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: default_max_document_bytes(),
        }
    }
}

/// Encoding of validation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Yaml,
}

/// How validation reports are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Include the parsed value tree in each report.
    #[serde(default = "default_true")]
    pub include_value: bool,
    #[serde(default)]
    pub format: ReportFormat,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            include_value: true,
            format: ReportFormat::Json,
        }
    }
}

/// Top-level validator configuration.
///
/// # Examples
///
/// ```no_run
/// use docshape_registry::ValidatorConfig;
///
/// let config = ValidatorConfig::load("docshape.yml").unwrap();
/// let registry = config.registry().build().unwrap();
/// println!("{} schemas, {} jobs", registry.len(), config.jobs);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default = "default_version")]
    pub version: String,
    /// Definition files or directories.
    #[serde(default)]
    pub schemas: Vec<PathBuf>,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Parallel validation jobs; 0 lets the thread pool decide.
    #[serde(default)]
    pub jobs: usize,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            schemas: Vec::new(),
            limits: LimitsConfig::default(),
            output: OutputConfig::default(),
            jobs: 0,
        }
    }
}

impl ValidatorConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::RegistryError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::RegistryError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let mut config: Self = serde_yaml::from_reader(reader)?;

        if let Some(base) = path.parent() {
            for schema in &mut config.schemas {
                if schema.is_relative() {
                    *schema = base.join(&*schema);
                }
            }
        }
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// A registry builder seeded with every configured schema path.
    pub fn registry(&self) -> RegistryBuilder {
        self.schemas
            .iter()
            .fold(RegistryBuilder::new(), |builder, path| {
                builder.with_source(RegistrySource::detect(path))
            })
    }

    /// Returns `true` if a document of `len` bytes may be parsed.
    pub fn accepts(&self, len: usize) -> bool {
        len <= self.limits.max_document_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config: ValidatorConfig = serde_yaml::from_str("schemas: [defs/]").unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.schemas, vec![PathBuf::from("defs/")]);
        assert_eq!(config.limits.max_document_bytes, 16 * 1024 * 1024);
        assert!(config.output.include_value);
        assert_eq!(config.output.format, ReportFormat::Json);
        assert_eq!(config.jobs, 0);
    }

    #[test]
    fn test_size_limit() {
        let config = ValidatorConfig {
            limits: LimitsConfig {
                max_document_bytes: 10,
            },
            ..ValidatorConfig::default()
        };
        assert!(config.accepts(10));
        assert!(!config.accepts(11));
    }

    #[test]
    fn test_load_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docshape.yml");

        let config = ValidatorConfig {
            version: "1.0".into(),
            schemas: vec![dir.path().join("defs")],
            limits: LimitsConfig {
                max_document_bytes: 2048,
            },
            output: OutputConfig {
                include_value: false,
                format: ReportFormat::Yaml,
            },
            jobs: 3,
        };
        config.save(&path).unwrap();

        let loaded = ValidatorConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_relative_schema_paths_follow_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docshape.yml");
        std::fs::write(&path, "schemas:\n  - defs\n  - /abs/other.yaml\n").unwrap();

        let loaded = ValidatorConfig::load(&path).unwrap();
        assert_eq!(
            loaded.schemas,
            vec![dir.path().join("defs"), PathBuf::from("/abs/other.yaml")]
        );
    }

    #[test]
    fn test_empty_config_builds_no_registry() {
        let err = ValidatorConfig::default().registry().build().unwrap_err();
        assert!(matches!(err, crate::RegistryError::NoSources));
    }
}
