use crate::ui::OutputMode;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "logrestore")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Restore compressed log archives to their original form")]
#[command(
    long_about = "logrestore hands the requested paths and the database connection settings \
                  to the decompression engine, waits for it to finish and removes every \
                  temporary file it created, whether or not the engine succeeds."
)]
#[command(after_help = "EXAMPLES:\n  \
    logrestore /var/log/app/a.log /var/log/app/b.log -d ./restored\n  \
    logrestore --files-from paths.txt --extraction-dir /tmp/out\n  \
    logrestore --config /etc/logrestore/clp-config.yml\n  \
    logrestore --generate-config --config clp-config.yml")]
pub struct Cli {
    /// Configuration file (defaults to <home>/etc/clp-config.yml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Paths to restore
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,

    /// File containing the paths to restore, one per line
    #[arg(short = 'f', long, value_name = "FILE")]
    pub files_from: Option<PathBuf>,

    /// Directory the restored files are written to; must already exist
    #[arg(short = 'd', long, value_name = "DIR", default_value = ".")]
    pub extraction_dir: PathBuf,

    /// Output format for messages
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only errors are printed)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write a sample configuration file to --config (or ./logrestore.yml)
    #[arg(long)]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Timestamped plain text output
    Plain,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        match self.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }

    /// Explicit paths and `--files-from` are mutually exclusive.
    ///
    /// Checked here rather than with `conflicts_with` so the tool can report
    /// it with the same `-1` status as every other usage failure.
    pub fn check_path_selection(&self) -> std::result::Result<(), clap::Error> {
        if !self.paths.is_empty() && self.files_from.is_some() {
            return Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                "Paths cannot be specified on the command line AND through a file.",
            ));
        }
        Ok(())
    }

    pub fn sample_config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from("logrestore.yml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["logrestore"]).unwrap();
        assert!(cli.paths.is_empty());
        assert!(cli.files_from.is_none());
        assert!(cli.config.is_none());
        assert_eq!(cli.extraction_dir, PathBuf::from("."));
        assert_eq!(cli.output_mode(), OutputMode::Human);
        assert!(cli.check_path_selection().is_ok());
    }

    #[test]
    fn test_positional_paths_keep_order() {
        let cli = Cli::try_parse_from([
            "logrestore",
            "/var/log/b.log",
            "/var/log/a.log",
            "-d",
            "/tmp/out",
        ])
        .unwrap();
        assert_eq!(cli.paths, vec!["/var/log/b.log", "/var/log/a.log"]);
        assert_eq!(cli.extraction_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_files_from_and_config() {
        let cli = Cli::try_parse_from([
            "logrestore",
            "-c",
            "cfg.yml",
            "--files-from",
            "/tmp/mylist.txt",
            "--output-format",
            "plain",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("cfg.yml")));
        assert_eq!(cli.files_from, Some(PathBuf::from("/tmp/mylist.txt")));
        assert_eq!(cli.output_mode(), OutputMode::Plain);
    }

    #[test]
    fn test_paths_and_files_from_conflict() {
        let cli = Cli::try_parse_from(["logrestore", "a", "-f", "/tmp/mylist.txt"]).unwrap();
        let err = cli.check_path_selection().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["logrestore", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_sample_config_path() {
        let cli = Cli::try_parse_from(["logrestore", "--generate-config"]).unwrap();
        assert_eq!(cli.sample_config_path(), PathBuf::from("logrestore.yml"));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
