use clap::Parser;
use drtprep::{Cli, DrtPrep, DrtPrepError, OutputFormatter, OutputMode, UserFriendlyError};
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let drtprep = match DrtPrep::from_cli(&cli) {
        Ok(drtprep) => drtprep,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    if cli.dry_run {
        return handle_dry_run(&cli, &drtprep);
    }

    match drtprep.convert_tree(&cli.input_root) {
        Ok(summary) => {
            if summary.failed == 0 {
                0 // Success
            } else {
                2 // Success with per-file failures
            }
        }
        Err(e) => {
            drtprep.handle_error(&e);

            match e {
                DrtPrepError::RegistryCorruption { .. } => 3,
                _ => 1, // General error
            }
        }
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "drtprep.toml".to_string());

    match DrtPrep::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  drtprep <input-root> --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(cli: &Cli, drtprep: &DrtPrep) -> i32 {
    let formatter = drtprep.output_formatter();

    formatter.info("DRY RUN MODE - No files will be copied or converted");
    formatter.print_separator();

    let config = drtprep.config();
    formatter.info("Configuration that would be used:");
    println!("  Prefix: {}", config.discovery.prefix);
    println!("  Extension: {}", config.discovery.extension);
    println!("  Raw suffix: {}", config.discovery.raw_suffix);
    println!("  Columns: {}", config.columns.required.join(", "));
    println!(
        "  Output directory: {}",
        config.output_directory(&cli.input_root).display()
    );
    println!("  Worker pool size: {}", config.worker_count());

    formatter.print_separator();

    let discovery = match drtprep.preview_tree(&cli.input_root) {
        Ok(discovery) => discovery,
        Err(e) => {
            formatter.error(&format!("Discovery failed: {}", e.user_message()));
            return 1;
        }
    };

    formatter.info("Conversion plan:");
    for event in &discovery.events {
        println!("  {}", event);
    }
    println!();
    print!("{}", discovery.stats.display_summary());

    formatter.print_separator();
    formatter.success("Dry run completed successfully");
    formatter.info("Run without --dry-run to perform the conversion");

    0
}

fn print_startup_error(error: &DrtPrepError) {
    // Create a basic formatter for startup errors
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use drtprep::OutputFormat;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn cli_for(input_root: PathBuf) -> Cli {
        Cli {
            input_root,
            output: None,
            prefix: None,
            columns: None,
            raw_suffix: None,
            max_workers: None,
            config: None,
            output_format: OutputFormat::Plain,
            verbose: 0,
            quiet: true,
            dry_run: false,
            generate_config: false,
        }
    }

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = Cli {
            config: Some(config_path.clone()),
            generate_config: true,
            ..cli_for(PathBuf::from("."))
        };

        let exit_code = handle_generate_config(&cli);
        assert_eq!(exit_code, 0);
        assert!(config_path.exists());

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[discovery]"));
    }

    #[test]
    fn test_dry_run_mode() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("PWRGEIS_500mA_A.dta"),
            "ZCURVE\nFreq\tZreal\n1\t2\n",
        )
        .unwrap();

        let cli = Cli {
            dry_run: true,
            ..cli_for(temp_dir.path().to_path_buf())
        };
        let drtprep = DrtPrep::from_cli(&cli).unwrap();

        let exit_code = handle_dry_run(&cli, &drtprep);
        assert_eq!(exit_code, 0);
        // Dry run leaves no output directory behind.
        assert!(!drtprep
            .config()
            .output_directory(&cli.input_root)
            .exists());
    }

    #[test]
    fn test_dry_run_with_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let cli = Cli {
            dry_run: true,
            ..cli_for(temp_dir.path().join("absent"))
        };
        let drtprep = DrtPrep::from_cli(&cli).unwrap();

        let exit_code = handle_dry_run(&cli, &drtprep);
        assert_eq!(exit_code, 1);
    }
}
