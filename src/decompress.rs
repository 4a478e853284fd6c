use crate::artifact::EphemeralArtifact;
use crate::config::Config;
use crate::error::{RestoreError, Result};
use crate::ui::{GracefulShutdown, OutputFormatter};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Which logical paths the caller wants restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecompressionRequest {
    /// No restriction: the engine restores everything in the archive set.
    Everything,
    /// Explicit paths, in caller order.
    Paths(Vec<String>),
    /// A caller-owned file with one path per line.
    ListFile(PathBuf),
}

impl DecompressionRequest {
    /// Reconcile the two ways of naming paths. Supplying both is a usage error.
    pub fn from_args(paths: &[String], list_path: Option<&Path>) -> Result<Self> {
        match (paths.is_empty(), list_path) {
            (false, Some(_)) => Err(RestoreError::Usage {
                message: "Paths cannot be specified on the command line AND through a file."
                    .to_string(),
            }),
            (false, None) => Ok(Self::Paths(paths.to_vec())),
            (true, Some(list)) => Ok(Self::ListFile(list.to_path_buf())),
            (true, None) => Ok(Self::Everything),
        }
    }

    fn materialize(&self, logs_dir: &Path) -> Result<PathSelection> {
        Ok(match self {
            Self::Everything => PathSelection::Unrestricted,
            Self::Paths(paths) => {
                PathSelection::Owned(EphemeralArtifact::path_list(logs_dir, paths)?)
            }
            Self::ListFile(path) => PathSelection::CallerOwned(path.clone()),
        })
    }
}

/// Path-selection input for one engine run. Only `Owned` is deleted afterwards.
enum PathSelection {
    Unrestricted,
    Owned(EphemeralArtifact),
    CallerOwned(PathBuf),
}

impl PathSelection {
    fn path(&self) -> Option<&Path> {
        match self {
            PathSelection::Unrestricted => None,
            PathSelection::Owned(artifact) => Some(artifact.path()),
            PathSelection::CallerOwned(path) => Some(path),
        }
    }
}

/// The complete engine command line for one run:
/// `<engine> x <archives_dir> <extraction_dir> --db-config-file <db> [-f <list>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    binary: PathBuf,
    archives_dir: PathBuf,
    extraction_dir: PathBuf,
    db_config_file: PathBuf,
    path_list: Option<PathBuf>,
}

impl EngineInvocation {
    pub const EXTRACT_SUBCOMMAND: &'static str = "x";
    pub const DB_CONFIG_FLAG: &'static str = "--db-config-file";
    pub const PATH_LIST_FLAG: &'static str = "-f";

    pub fn new(
        binary: &Path,
        archives_dir: &Path,
        extraction_dir: &Path,
        db_config_file: &Path,
        path_list: Option<&Path>,
    ) -> Self {
        Self {
            binary: binary.to_path_buf(),
            archives_dir: archives_dir.to_path_buf(),
            extraction_dir: extraction_dir.to_path_buf(),
            db_config_file: db_config_file.to_path_buf(),
            path_list: path_list.map(Path::to_path_buf),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn db_config_file(&self) -> &Path {
        &self.db_config_file
    }

    pub fn path_list(&self) -> Option<&Path> {
        self.path_list.as_deref()
    }

    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            Self::EXTRACT_SUBCOMMAND.into(),
            self.archives_dir.clone().into(),
            self.extraction_dir.clone().into(),
            Self::DB_CONFIG_FLAG.into(),
            self.db_config_file.clone().into(),
        ];

        if let Some(ref list) = self.path_list {
            args.push(Self::PATH_LIST_FLAG.into());
            args.push(list.clone().into());
        }

        args
    }

    /// Stdio is inherited so the engine writes straight to our streams.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command.args(self.args());
        command
    }
}

impl fmt::Display for EngineInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.binary.display())?;
        for arg in self.args() {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs an engine invocation to completion and reports its exit code.
pub trait EngineRunner {
    fn run(&self, invocation: &EngineInvocation) -> Result<i32>;
}

/// Spawns the engine as a child process and blocks until it exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl EngineRunner for ProcessRunner {
    fn run(&self, invocation: &EngineInvocation) -> Result<i32> {
        log::debug!("Running {}", invocation);

        let status = invocation
            .to_command()
            .status()
            .map_err(|source| RestoreError::EngineLaunch {
                binary: invocation.binary().to_path_buf(),
                source,
            })?;

        Ok(exit_code(status))
    }
}

/// Exit code of a finished child. A child killed by a signal reports
/// `128 + signal`, the same convention shells use.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}

pub struct Decompressor<'a, R = ProcessRunner> {
    engine_binary: PathBuf,
    runner: R,
    output: &'a OutputFormatter,
    shutdown: Option<&'a GracefulShutdown>,
}

impl<'a> Decompressor<'a, ProcessRunner> {
    pub fn new<P: Into<PathBuf>>(engine_binary: P, output: &'a OutputFormatter) -> Self {
        Self {
            engine_binary: engine_binary.into(),
            runner: ProcessRunner,
            output,
            shutdown: None,
        }
    }
}

impl<'a, R: EngineRunner> Decompressor<'a, R> {
    pub fn with_runner<T: EngineRunner>(self, runner: T) -> Decompressor<'a, T> {
        Decompressor {
            engine_binary: self.engine_binary,
            runner,
            output: self.output,
            shutdown: self.shutdown,
        }
    }

    pub fn with_shutdown(mut self, shutdown: &'a GracefulShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Restore `paths` (or the paths listed in `list_path`) from the archives
    /// into `extraction_dir`.
    ///
    /// Returns 0 on success, the engine's exit code if the engine fails, and
    /// -1 for usage or precondition failures. Every failure is logged before
    /// returning.
    pub fn decompress(
        &self,
        paths: &[String],
        list_path: Option<&Path>,
        config: &Config,
        archives_dir: &Path,
        logs_dir: &Path,
        extraction_dir: &Path,
    ) -> i32 {
        let outcome = DecompressionRequest::from_args(paths, list_path).and_then(|request| {
            self.run(&request, config, archives_dir, logs_dir, extraction_dir)
        });

        match outcome {
            Ok(()) => 0,
            Err(error) => {
                self.output.print_user_friendly_error(&error);
                error.status_code()
            }
        }
    }

    pub fn run(
        &self,
        request: &DecompressionRequest,
        config: &Config,
        archives_dir: &Path,
        logs_dir: &Path,
        extraction_dir: &Path,
    ) -> Result<()> {
        if !extraction_dir.is_dir() {
            return Err(RestoreError::ExtractionDirMissing {
                path: extraction_dir.to_path_buf(),
            });
        }

        let descriptor = config.connection_descriptor()?;

        // Both artifacts live until the end of this scope, whatever happens below.
        let db_config = EphemeralArtifact::db_config(logs_dir, &descriptor)?;
        let selection = request.materialize(logs_dir)?;

        if matches!(selection, PathSelection::Unrestricted) {
            self.output.info("No paths specified; restoring all archived files");
        }

        let invocation = EngineInvocation::new(
            &self.engine_binary,
            archives_dir,
            extraction_dir,
            db_config.path(),
            selection.path(),
        );

        self.output.start_operation("Starting decompression");
        self.output.debug(&invocation.to_string());

        let code = self.runner.run(&invocation)?;

        if self.shutdown.is_some_and(GracefulShutdown::was_interrupted) {
            self.output.warning("Decompression was interrupted; removing temporary files");
        }

        if code != 0 {
            return Err(RestoreError::EngineFailed { code });
        }

        self.output.success("Decompression complete");
        Ok(())
    }
}
