use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "drtprep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert electrochemical impedance DTA files into DRT-ready CSVs")]
#[command(
    long_about = "DrtPrep walks a directory tree of instrument-generated DTA files, \
                       extracts the tagged impedance table from each, deduplicates files \
                       by content hash and writes one header-less CSV per unique input."
)]
#[command(after_help = "EXAMPLES:\n  \
    drtprep ./experiments\n  \
    drtprep ./experiments --output ./drt_input --prefix PWRGEIS_200mA\n  \
    drtprep ./experiments --columns Freq,Zreal,Zimag --max-workers 8\n  \
    drtprep ./experiments --config my-config.toml --dry-run")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input root directory to search for instrument files
    pub input_root: PathBuf,

    /// Output directory (defaults to DRT_<prefix> under the input root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Filename prefix candidates must carry; also the output-naming stem
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Required columns in output order (comma-separated)
    #[arg(long, help = "Columns to keep, in output order (e.g. Freq,Zreal,Zimag)")]
    pub columns: Option<String>,

    /// Stem suffix marking raw instrument dumps to exclude
    #[arg(long, help = "Stem suffix excluding unprocessed dumps (e.g. _raw)")]
    pub raw_suffix: Option<String>,

    /// Worker pool size ceiling
    #[arg(long, help = "Maximum number of conversion workers")]
    pub max_workers: Option<usize>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (classify candidates without copying or converting)
    #[arg(long, help = "Show what would be converted without doing it")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_prefix(self.prefix.clone())
            .with_columns(self.columns.clone())
            .with_raw_suffix(self.raw_suffix.clone())
            .with_output_dir(self.output.clone())
            .with_max_workers(self.max_workers)
    }
}
