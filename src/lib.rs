pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{
    CliOverrides, ColumnConfig, Config, DiscoveryConfig, OutputConfig, ParserConfig,
    PipelineConfig,
};
pub use error::{DrtPrepError, Result, UserFriendlyError};

// Core functionality re-exports
pub use discovery::{DiscoveredFile, Discovery, EntryClass, EntryClassifier, FileDiscoverer};
pub use parser::{ColumnProjector, CurveTable, ProjectedTable, TableExtractor};
pub use pipeline::{ConversionOutcome, ConversionPipeline, RunReport, RunSummary};
pub use registry::{Claim, ContentDigest, ContentHasher, DedupRegistry};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use std::path::Path;
use std::sync::Arc;

/// Main library interface: one instance drives a full discover → convert →
/// report run over an input tree.
pub struct DrtPrep {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

impl DrtPrep {
    /// Create a new DrtPrep instance with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet);

        Self {
            config,
            output_formatter,
            progress_manager,
        }
    }

    /// Create DrtPrep instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(Self::new(config, output_mode, cli_args.verbose, cli_args.quiet))
    }

    /// Run the full pipeline over `input_root`.
    ///
    /// Registry load failure is fatal before any work is dispatched. Per-file
    /// failures are contained in their outcomes; a log and registry snapshot
    /// are produced for whatever work did finish.
    pub fn convert_tree(&self, input_root: &Path) -> Result<RunSummary> {
        let output_dir = self.config.output_directory(input_root);
        let registry_path = output_dir.join(&self.config.output.registry_filename);
        let log_path = output_dir.join(&self.config.output.log_filename);

        self.output_formatter.start_operation("Loading hash registry");
        let registry = Arc::new(DedupRegistry::load(&registry_path)?);
        self.output_formatter.info(&format!(
            "Registry holds {} entries from previous runs",
            registry.len()
        ));

        self.output_formatter
            .start_operation("Searching and staging instrument files");
        let discoverer = FileDiscoverer::new(&self.config.discovery, &output_dir);
        let discovery = discoverer.discover(input_root)?;

        self.output_formatter.info(&format!(
            "Found {} candidate files",
            discovery.records.len()
        ));
        self.output_formatter
            .debug(&discovery.stats.display_summary());

        self.output_formatter.start_operation("Converting staged files");
        let progress = self
            .progress_manager
            .create_file_progress(discovery.records.len() as u64);

        let pipeline = ConversionPipeline::new(
            &self.config,
            output_dir.clone(),
            Arc::clone(&registry),
        );
        let outcomes = pipeline.run(&discovery.records, &progress)?;
        ui::progress::finish_progress_with_summary(&progress, "Conversion finished");

        self.report_notable_outcomes(&outcomes);

        let mut report = RunReport::new();
        report.record_events(discovery.events);
        report.record_outcomes(outcomes);
        let summary = report.summary();

        if let Err(error) = report.persist(&log_path, &registry, &registry_path) {
            // CSVs already on disk stay valid; only this run's bookkeeping
            // may be lost, forcing a hash recompute next run.
            self.output_formatter.error(&format!(
                "Failed to persist run artifacts: {}",
                error.user_message()
            ));
        } else {
            self.output_formatter.success(&format!(
                "Log written to {} and registry to {}",
                log_path.display(),
                registry_path.display()
            ));
        }

        self.output_formatter.print_run_summary(&summary);

        Ok(summary)
    }

    /// Classify-only preview of a run, for `--dry-run`.
    pub fn preview_tree(&self, input_root: &Path) -> Result<Discovery> {
        let output_dir = self.config.output_directory(input_root);
        let discoverer = FileDiscoverer::new(&self.config.discovery, &output_dir);
        discoverer.preview(input_root)
    }

    fn report_notable_outcomes(&self, outcomes: &[ConversionOutcome]) {
        for outcome in outcomes {
            match outcome {
                ConversionOutcome::Failed { .. } => {
                    self.progress_manager
                        .suspend(|| self.output_formatter.warning(&outcome.log_line()));
                }
                ConversionOutcome::Converted {
                    missing_columns, ..
                } if !missing_columns.is_empty() => {
                    self.progress_manager
                        .suspend(|| self.output_formatter.warning(&outcome.log_line()));
                }
                _ => {}
            }
        }
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config).map_err(DrtPrepError::Io)?;
        Ok(())
    }

    /// Get configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get output formatter reference
    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &DrtPrepError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const GOOD_DTA: &str =
        "EXPLAIN\nZCURVE\tTABLE\nFreq\tZreal\tZimag\n1000\t50\t-10\n2000\t48\t-9\n";

    fn quiet_instance() -> DrtPrep {
        DrtPrep::new(Config::default(), OutputMode::Plain, 0, true)
    }

    fn write_file(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_full_run_produces_csv_log_and_registry() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_file(&root.join("cellA/PWRGEIS_500mA_A.dta"), GOOD_DTA);

        let drtprep = quiet_instance();
        let summary = drtprep.convert_tree(root).unwrap();

        assert_eq!(summary.converted, 1);
        assert_eq!(summary.failed, 0);

        let output = root.join("DRT_PWRGEIS_500mA");
        assert!(output.join("PWRGEIS_500mA_cellA.csv").exists());
        assert!(output.join("conversion_log.txt").exists());
        assert!(output.join("hash_registry.json").exists());
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_file(&root.join("cellA/PWRGEIS_500mA_A.dta"), GOOD_DTA);

        let first = quiet_instance().convert_tree(root).unwrap();
        assert_eq!(first.converted, 1);

        // Fresh instance reloads the persisted registry; nothing re-converts.
        let second = quiet_instance().convert_tree(root).unwrap();
        assert_eq!(second.converted, 0);
        assert_eq!(second.skipped_duplicates, 1);

        let log =
            fs::read_to_string(root.join("DRT_PWRGEIS_500mA/conversion_log.txt")).unwrap();
        assert!(log.contains("skipped duplicate"));
    }

    #[test]
    fn test_corrupt_registry_aborts_before_dispatch() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_file(&root.join("cellA/PWRGEIS_500mA_A.dta"), GOOD_DTA);

        let output = root.join("DRT_PWRGEIS_500mA");
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("hash_registry.json"), "not json").unwrap();

        let err = quiet_instance().convert_tree(root).unwrap_err();
        assert!(matches!(err, DrtPrepError::RegistryCorruption { .. }));
        assert!(!output.join("PWRGEIS_500mA_cellA.csv").exists());
    }

    #[test]
    fn test_preview_reports_without_side_effects() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_file(&root.join("cellA/PWRGEIS_500mA_A.dta"), GOOD_DTA);

        let discovery = quiet_instance().preview_tree(root).unwrap();
        assert_eq!(discovery.records.len(), 1);
        assert!(!root.join("DRT_PWRGEIS_500mA").exists());
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        DrtPrep::generate_sample_config(&config_path).unwrap();
        assert!(config_path.exists());

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[discovery]"));
        assert!(content.contains("[columns]"));
    }

    #[test]
    fn test_version_info() {
        assert!(!version_info().is_empty());
    }
}
