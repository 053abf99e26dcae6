use crate::error::{DrtPrepError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub discovery: DiscoveryConfig,
    pub parser: ParserConfig,
    pub columns: ColumnConfig,
    pub output: OutputConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    /// Filename prefix a candidate must carry; also the output-naming stem.
    pub prefix: String,
    /// Instrument file extension, matched case-insensitively.
    pub extension: String,
    /// Stem suffix marking unprocessed instrument dumps, matched case-insensitively.
    pub raw_suffix: String,
    /// Regex patterns excluding otherwise-matching filenames.
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParserConfig {
    /// Token whose containing line marks the start of the data block.
    pub marker: String,
    /// Lines between the marker line and the header row.
    pub header_offset: usize,
    /// Lines and fields starting with this prefix are comments.
    pub comment_prefix: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColumnConfig {
    /// Columns kept in the output CSV, in this order.
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Output directory; defaults to DRT_<prefix> under the input root.
    pub directory: Option<PathBuf>,
    pub log_filename: String,
    pub registry_filename: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Hard ceiling on the worker pool size.
    pub max_workers: usize,
    /// Workers per hardware thread, below the ceiling.
    pub threads_per_core: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            parser: ParserConfig::default(),
            columns: ColumnConfig::default(),
            output: OutputConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            prefix: "PWRGEIS_500mA".to_string(),
            extension: "dta".to_string(),
            raw_suffix: "_raw".to_string(),
            exclude_patterns: vec![],
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            marker: "ZCURVE".to_string(),
            header_offset: 1,
            comment_prefix: "#".to_string(),
        }
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            required: vec![
                "Freq".to_string(),
                "Zreal".to_string(),
                "Zimag".to_string(),
            ],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            log_filename: "conversion_log.txt".to_string(),
            registry_filename: "hash_registry.json".to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_workers: 32,
            threads_per_core: 2,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DrtPrepError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| DrtPrepError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| DrtPrepError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["drtprep.toml", "drtprep.config.toml", ".drtprep.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref prefix) = cli_args.prefix {
            self.discovery.prefix = prefix.clone();
        }

        if let Some(ref columns) = cli_args.columns {
            self.columns.required = columns
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(ref raw_suffix) = cli_args.raw_suffix {
            self.discovery.raw_suffix = raw_suffix.clone();
        }

        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.directory = Some(output_dir.clone());
        }

        if let Some(max_workers) = cli_args.max_workers {
            self.pipeline.max_workers = max_workers;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| DrtPrepError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| DrtPrepError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.discovery.prefix.is_empty() {
            return Err(DrtPrepError::Config {
                message: "Filename prefix must not be empty".to_string(),
            });
        }

        if self.discovery.extension.is_empty() {
            return Err(DrtPrepError::Config {
                message: "Instrument file extension must not be empty".to_string(),
            });
        }

        if self.columns.required.is_empty() {
            return Err(DrtPrepError::Config {
                message: "At least one required column must be specified".to_string(),
            });
        }

        if self.parser.marker.is_empty() {
            return Err(DrtPrepError::Config {
                message: "Table marker token must not be empty".to_string(),
            });
        }

        if self.parser.header_offset == 0 {
            return Err(DrtPrepError::Config {
                message: "Header offset must be at least 1".to_string(),
            });
        }

        if self.pipeline.max_workers == 0 || self.pipeline.threads_per_core == 0 {
            return Err(DrtPrepError::Config {
                message: "Worker pool sizing must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Resolve the output directory for a given input root.
    pub fn output_directory(&self, input_root: &Path) -> PathBuf {
        match &self.output.directory {
            Some(dir) => dir.clone(),
            None => input_root.join(format!("DRT_{}", self.discovery.prefix)),
        }
    }

    /// Bounded worker count: min(ceiling, hardware parallelism * factor).
    pub fn worker_count(&self) -> usize {
        let hardware = num_cpus::get() * self.pipeline.threads_per_core;
        self.pipeline.max_workers.min(hardware).max(1)
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub prefix: Option<String>,
    pub columns: Option<String>,
    pub raw_suffix: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub max_workers: Option<usize>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn with_columns(mut self, columns: Option<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_raw_suffix(mut self, raw_suffix: Option<String>) -> Self {
        self.raw_suffix = raw_suffix;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_max_workers(mut self, max_workers: Option<usize>) -> Self {
        self.max_workers = max_workers;
        self
    }
}
