use crate::constants;
use crate::error::{MergeError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Run configuration. Every field has a default, so an empty (or absent)
/// config file reproduces the fixed behaviour of the tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    pub data_dir: PathBuf,
    pub output_file: String,
    pub key_column: String,
    pub inputs: InputFiles,
    pub privacy: PrivacyPolicy,
    /// Directory for JSON log files; console-only logging when unset.
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputFiles {
    pub primary: String,
    pub anxiety: String,
    pub legacy: String,
}

/// Which fields are removed, which are blanked out, and how ids are derived.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrivacyPolicy {
    pub drop_columns: Vec<String>,
    pub redact_columns: Vec<String>,
    pub redaction_marker: String,
    pub id_column: String,
    pub id_prefix: String,
    pub hash_length: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            output_file: constants::OUTPUT_FILE.to_string(),
            key_column: constants::KEY_COLUMN.to_string(),
            inputs: InputFiles::default(),
            privacy: PrivacyPolicy::default(),
            log_dir: None,
        }
    }
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            primary: constants::PRIMARY_FILE.to_string(),
            anxiety: constants::ANXIETY_FILE.to_string(),
            legacy: constants::LEGACY_FILE.to_string(),
        }
    }
}

impl Default for PrivacyPolicy {
    fn default() -> Self {
        Self {
            drop_columns: constants::DROP_COLUMNS.iter().map(|c| c.to_string()).collect(),
            redact_columns: constants::REDACT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            redaction_marker: constants::REDACTION_MARKER.to_string(),
            id_column: constants::PARTICIPANT_ID_COLUMN.to_string(),
            id_prefix: constants::ID_PREFIX.to_string(),
            hash_length: constants::HASH_LENGTH,
        }
    }
}

impl PrivacyPolicy {
    pub fn is_dropped(&self, field: &str) -> bool {
        self.drop_columns.iter().any(|c| c == field)
    }

    pub fn is_redacted(&self, field: &str) -> bool {
        self.redact_columns.iter().any(|c| c == field)
    }
}

impl MergeConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MergeError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: MergeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_column.trim().is_empty() {
            return Err(MergeError::Config("key_column must not be empty".to_string()));
        }
        if self.privacy.id_column.trim().is_empty() {
            return Err(MergeError::Config("privacy.id_column must not be empty".to_string()));
        }
        // SHA-256 hex digest is 64 characters
        if self.privacy.hash_length == 0 || self.privacy.hash_length > 64 {
            return Err(MergeError::Config(format!(
                "privacy.hash_length must be between 1 and 64, got {}",
                self.privacy.hash_length
            )));
        }
        if self.privacy.is_dropped(&self.key_column) {
            return Err(MergeError::Config(format!(
                "key column '{}' cannot be in privacy.drop_columns",
                self.key_column
            )));
        }
        let id_column = self.privacy.id_column.as_str();
        if id_column == self.key_column {
            return Err(MergeError::Config(format!(
                "privacy.id_column '{}' must differ from key_column",
                id_column
            )));
        }
        if self.privacy.is_dropped(id_column) {
            return Err(MergeError::Config(format!(
                "participant id column '{}' cannot be in privacy.drop_columns",
                id_column
            )));
        }
        if self.privacy.is_redacted(id_column) {
            return Err(MergeError::Config(format!(
                "participant id column '{}' cannot be in privacy.redact_columns",
                id_column
            )));
        }
        if self.inputs.primary.trim().is_empty() || self.output_file.trim().is_empty() {
            return Err(MergeError::Config(
                "inputs.primary and output_file must be set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn primary_path(&self) -> PathBuf {
        self.data_dir.join(&self.inputs.primary)
    }

    pub fn anxiety_path(&self) -> PathBuf {
        self.data_dir.join(&self.inputs.anxiety)
    }

    pub fn legacy_path(&self) -> PathBuf {
        self.data_dir.join(&self.inputs.legacy)
    }

    pub fn output_path(&self) -> PathBuf {
        self.data_dir.join(&self.output_file)
    }
}
