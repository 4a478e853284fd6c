use clap::Parser;
use logrestore::{
    config, Cli, Decompressor, GracefulShutdown, HomeResolver, OutputFormatter, Toolset,
    UserFriendlyError,
};
use std::process;

fn main() {
    setup_logging();
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();
    let formatter = OutputFormatter::new(cli.output_mode(), cli.verbose, cli.quiet);

    if cli.generate_config {
        return handle_generate_config(&cli, &formatter);
    }

    if let Err(e) = cli.check_path_selection() {
        let _ = e.print();
        return -1;
    }

    let toolset = match Toolset::resolve(&HomeResolver::default()) {
        Ok(toolset) => toolset,
        Err(e) => {
            formatter.print_user_friendly_error(&e);
            return -1;
        }
    };
    if let Err(e) = toolset.verify() {
        formatter.print_user_friendly_error(&e);
        return -1;
    }

    let shutdown = match GracefulShutdown::new() {
        Ok(shutdown) => shutdown,
        Err(e) => {
            formatter.print_user_friendly_error(&e);
            return -1;
        }
    };

    let config = match config::resolve(
        cli.config.as_deref(),
        &toolset.default_config_path(),
        toolset.home(),
    ) {
        Ok(config) => config,
        Err(e) => {
            formatter.print_user_friendly_error(&e);
            return -1;
        }
    };

    Decompressor::new(toolset.engine_binary(), &formatter)
        .with_shutdown(&shutdown)
        .decompress(
            &cli.paths,
            cli.files_from.as_deref(),
            &config,
            config.archives_dir(),
            config.logs_dir(),
            &cli.extraction_dir,
        )
}

fn handle_generate_config(cli: &Cli, formatter: &OutputFormatter) -> i32 {
    let config_path = cli.sample_config_path();

    match logrestore::generate_sample_config(&config_path) {
        Ok(()) => {
            formatter.success(&format!(
                "Generated sample configuration file: {}",
                config_path.display()
            ));
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            -1
        }
    }
}

fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("logrestore=warn"))
        .format_timestamp_millis()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use logrestore::OutputMode;
    use tempfile::TempDir;

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.yml");
        let cli = Cli::try_parse_from([
            "logrestore",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();
        let formatter = OutputFormatter::new(OutputMode::Plain, 0, true);

        assert_eq!(handle_generate_config(&cli, &formatter), 0);
        assert!(config_path.exists());

        // Second run must not clobber the file.
        assert_eq!(handle_generate_config(&cli, &formatter), -1);
    }
}
