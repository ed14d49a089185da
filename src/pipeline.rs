use crate::anonymize::Anonymizer;
use crate::config::MergeConfig;
use crate::error::Result;
use crate::loader::{self, HeaderLayout};
use crate::merge::{self, MergeStats};
use crate::writer;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// The survey inputs a run knows about, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Wave 5 survey plus math scores; defines the output row set.
    Primary,
    /// Wave 3 math-anxiety survey.
    Anxiety,
    /// Legacy export with a description row under the header.
    Legacy,
}

impl SourceKind {
    pub const SECONDARIES: [SourceKind; 2] = [SourceKind::Anxiety, SourceKind::Legacy];

    pub fn layout(self) -> HeaderLayout {
        match self {
            SourceKind::Primary | SourceKind::Anxiety => HeaderLayout::Single,
            SourceKind::Legacy => HeaderLayout::Described,
        }
    }

    pub fn path(self, config: &MergeConfig) -> PathBuf {
        match self {
            SourceKind::Primary => config.primary_path(),
            SourceKind::Anxiety => config.anxiety_path(),
            SourceKind::Legacy => config.legacy_path(),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Primary => "primary",
            SourceKind::Anxiety => "anxiety",
            SourceKind::Legacy => "legacy",
        };
        f.write_str(name)
    }
}

/// What happened to one input during a run.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub kind: SourceKind,
    pub path: PathBuf,
    /// `None` when an optional input was not found.
    pub rows_loaded: Option<usize>,
    pub merge: Option<MergeStats>,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub sources: Vec<SourceReport>,
    pub rows_written: usize,
    pub columns: Vec<String>,
    pub output_file: PathBuf,
}

pub struct Pipeline {
    config: MergeConfig,
    anonymizer: Anonymizer,
}

impl Pipeline {
    pub fn new(config: MergeConfig) -> Self {
        let anonymizer = Anonymizer::new(config.privacy.clone());
        Self { config, anonymizer }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Load, merge, anonymize and write. Nothing is written unless every
    /// earlier stage succeeded.
    #[instrument(skip(self), fields(data_dir = %self.config.data_dir.display()))]
    pub fn run(&self) -> Result<PipelineResult> {
        let key = self.config.key_column.as_str();

        // Step 1: primary input defines the output rows
        let primary_path = SourceKind::Primary.path(&self.config);
        let mut combined = loader::load_required(&primary_path, SourceKind::Primary.layout())?;
        info!(source = %SourceKind::Primary, rows = combined.len(), "Loaded primary input");
        let mut sources = vec![SourceReport {
            kind: SourceKind::Primary,
            path: primary_path,
            rows_loaded: Some(combined.len()),
            merge: None,
        }];

        // Step 2: fill gaps from each secondary, anxiety before legacy
        for kind in SourceKind::SECONDARIES {
            let path = kind.path(&self.config);
            let report = match loader::load_optional(&path, kind.layout())? {
                Some(secondary) => {
                    info!(source = %kind, rows = secondary.len(), "Loaded secondary input");
                    let stats = merge::merge_on_key(&mut combined, key, &secondary, key);
                    SourceReport {
                        kind,
                        path,
                        rows_loaded: Some(secondary.len()),
                        merge: Some(stats),
                    }
                }
                None => {
                    warn!(source = %kind, "Secondary input missing, continuing without it");
                    SourceReport {
                        kind,
                        path,
                        rows_loaded: None,
                        merge: None,
                    }
                }
            };
            sources.push(report);
        }

        // Step 3: de-identify
        let anonymized = self.anonymizer.anonymize_all(&combined.rows, key);

        // Step 4: write
        let columns = writer::output_headers(&anonymized, self.anonymizer.policy(), key);
        let output_file = self.config.output_path();
        let rows_written = writer::write_rows(&output_file, &columns, &anonymized)?;

        Ok(PipelineResult {
            sources,
            rows_written,
            columns,
            output_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MergeError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_source_layouts() {
        assert_eq!(SourceKind::Primary.layout(), HeaderLayout::Single);
        assert_eq!(SourceKind::Anxiety.layout(), HeaderLayout::Single);
        assert_eq!(SourceKind::Legacy.layout(), HeaderLayout::Described);
        assert_eq!(SourceKind::SECONDARIES, [SourceKind::Anxiety, SourceKind::Legacy]);
    }

    #[test]
    fn test_primary_only_run() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("sp25w5survey-and-mathscores.csv"),
            "rid,w1ip,age\nabc,1.2.3.4,20\n",
        )
        .unwrap();
        let config = MergeConfig {
            data_dir: dir.path().to_path_buf(),
            ..MergeConfig::default()
        };

        let result = Pipeline::new(config).run().unwrap();
        assert_eq!(result.rows_written, 1);
        assert_eq!(result.columns, vec!["participant_id", "rid", "age"]);
        assert_eq!(result.sources.len(), 3);
        assert!(result.sources[1].rows_loaded.is_none());
        assert!(result.sources[2].merge.is_none());
        assert!(result.output_file.exists());
    }

    #[test]
    fn test_missing_primary_writes_nothing() {
        let dir = tempdir().unwrap();
        let config = MergeConfig {
            data_dir: dir.path().to_path_buf(),
            ..MergeConfig::default()
        };

        let err = Pipeline::new(config).run().unwrap_err();
        assert!(matches!(err, MergeError::MissingInput { .. }));
        assert!(!dir.path().join("combined_anonymized.csv").exists());
    }
}
