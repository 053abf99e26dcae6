use crate::config::Config;
use crate::discovery::DiscoveredFile;
use crate::error::{DrtPrepError, Result, UserFriendlyError};
use crate::parser::{ColumnProjector, TableExtractor};
use crate::registry::{Claim, ContentHasher, DedupRegistry};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Per-candidate result of one unit of pipeline work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Converted {
        source: String,
        output: String,
        missing_columns: Vec<String>,
    },
    SkippedDuplicate {
        source: String,
    },
    Failed {
        source: String,
        reason: String,
    },
}

impl ConversionOutcome {
    pub fn source(&self) -> &str {
        match self {
            ConversionOutcome::Converted { source, .. } => source,
            ConversionOutcome::SkippedDuplicate { source } => source,
            ConversionOutcome::Failed { source, .. } => source,
        }
    }

    /// One-line rendering for the run log.
    pub fn log_line(&self) -> String {
        match self {
            ConversionOutcome::Converted {
                source,
                output,
                missing_columns,
            } => {
                if missing_columns.is_empty() {
                    format!("converted: {} -> {}", source, output)
                } else {
                    format!(
                        "converted: {} -> {} (missing columns: {})",
                        source,
                        output,
                        missing_columns.join(", ")
                    )
                }
            }
            ConversionOutcome::SkippedDuplicate { source } => {
                format!("skipped duplicate: {}", source)
            }
            ConversionOutcome::Failed { source, reason } => {
                format!("failed: {}: {}", source, reason)
            }
        }
    }
}

/// Drives discovered candidates through hash → dedup-check → extract →
/// project → export on a bounded worker pool.
///
/// Units of work are independent: a failed file is reported and released, it
/// never aborts or blocks the rest of the run.
pub struct ConversionPipeline {
    extractor: TableExtractor,
    projector: ColumnProjector,
    hasher: ContentHasher,
    registry: Arc<DedupRegistry>,
    output_dir: PathBuf,
    prefix: String,
    worker_count: usize,
}

impl ConversionPipeline {
    pub fn new(config: &Config, output_dir: PathBuf, registry: Arc<DedupRegistry>) -> Self {
        Self {
            extractor: TableExtractor::new(&config.parser),
            projector: ColumnProjector::new(&config.columns),
            hasher: ContentHasher::new(),
            registry,
            output_dir,
            prefix: config.discovery.prefix.clone(),
            worker_count: config.worker_count(),
        }
    }

    /// Convert the full candidate list, blocking until every unit finishes.
    /// Outcomes are collected for the run report; ordering carries no
    /// guarantee beyond completeness.
    pub fn run(
        &self,
        records: &[DiscoveredFile],
        progress: &ProgressBar,
    ) -> Result<Vec<ConversionOutcome>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_count)
            .build()
            .map_err(|e| DrtPrepError::Config {
                message: format!("Failed to build worker pool: {}", e),
            })?;

        let outcomes = pool.install(|| {
            records
                .par_iter()
                .map(|record| {
                    let outcome = self.process(record);
                    progress.inc(1);
                    outcome
                })
                .collect()
        });

        Ok(outcomes)
    }

    /// One unit of work. The claim/commit/release protocol keeps the
    /// check-then-record sequence atomic across workers and leaves the
    /// registry untouched when conversion fails.
    fn process(&self, record: &DiscoveredFile) -> ConversionOutcome {
        let source = record.staged_name();

        let digest = match self.hasher.hash_file(&record.staged_path) {
            Ok(digest) => digest,
            Err(error) => {
                return ConversionOutcome::Failed {
                    source,
                    reason: error.user_message(),
                }
            }
        };

        match self.registry.claim(&digest) {
            Claim::Duplicate(_) => ConversionOutcome::SkippedDuplicate { source },
            Claim::Fresh => match self.convert(record) {
                Ok((output, missing_columns)) => {
                    self.registry.commit(&digest, &output);
                    ConversionOutcome::Converted {
                        source,
                        output,
                        missing_columns,
                    }
                }
                Err(error) => {
                    self.registry.release(&digest);
                    ConversionOutcome::Failed {
                        source,
                        reason: error.user_message(),
                    }
                }
            },
        }
    }

    /// Extract, project and serialize one staged file. Returns the output
    /// CSV filename and any required columns the source was missing.
    fn convert(&self, record: &DiscoveredFile) -> Result<(String, Vec<String>)> {
        let content = fs::read(&record.staged_path)?;
        let table = self.extractor.extract(&record.staged_path, &content)?;
        let projected = self.projector.project(&table);

        let output_name = format!("{}_{}.csv", self.prefix, record.label);
        let output_path = self.output_dir.join(&output_name);

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&output_path)?;

        for row in &projected.rows {
            writer.write_record(row.iter().map(|value| value.to_string()))?;
        }
        writer.flush()?;

        Ok((output_name, projected.missing))
    }
}
