use crate::error::{RestoreError, Result};
use std::path::{Path, PathBuf};

pub const HOME_ENV_VAR: &str = "LOGRESTORE_HOME";
pub const EXECUTABLE_MARKER_DIR: &str = "bin";
pub const ENGINE_BINARY_NAME: &str = "clp";
pub const DEFAULT_CONFIG_RELATIVE_PATH: &str = "etc/clp-config.yml";

/// One way of locating the toolset home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeStrategy {
    /// Read the directory from an environment variable.
    EnvVar(String),
    /// Walk up from the running executable until a directory named `marker`
    /// is found; its parent is the home directory.
    ExecutableAncestor { marker: String },
}

impl HomeStrategy {
    fn describe(&self) -> String {
        match self {
            HomeStrategy::EnvVar(name) => format!("environment variable {}", name),
            HomeStrategy::ExecutableAncestor { marker } => {
                format!("'{}' ancestor of the running executable", marker)
            }
        }
    }
}

/// Tries each strategy in order; the first one that yields an existing
/// directory wins.
pub struct HomeResolver {
    strategies: Vec<HomeStrategy>,
    executable: Option<PathBuf>,
}

impl HomeResolver {
    pub fn new(strategies: Vec<HomeStrategy>) -> Self {
        Self {
            strategies,
            executable: None,
        }
    }

    /// Override the executable path used by `ExecutableAncestor`.
    pub fn with_executable<P: Into<PathBuf>>(mut self, executable: P) -> Self {
        self.executable = Some(executable.into());
        self
    }

    /// An unset variable or a missing marker falls through to the next
    /// strategy. A variable that is set but does not name a directory is an
    /// error.
    pub fn resolve(&self) -> Result<PathBuf> {
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            match self.try_strategy(strategy) {
                Attempt::Found(home) => {
                    log::debug!(
                        "Resolved toolset home {} via {}",
                        home.display(),
                        strategy.describe()
                    );
                    return Ok(home);
                }
                Attempt::Skipped(reason) => {
                    attempts.push(format!("{}: {}", strategy.describe(), reason))
                }
                Attempt::Rejected(reason) => {
                    log::warn!("Rejected toolset home from {}: {}", strategy.describe(), reason);
                    return Err(RestoreError::EnvironmentResolution {
                        message: format!("{}: {}", strategy.describe(), reason),
                    });
                }
            }
        }

        Err(RestoreError::EnvironmentResolution {
            message: if attempts.is_empty() {
                "no home directory strategies configured".to_string()
            } else {
                attempts.join("; ")
            },
        })
    }

    fn try_strategy(&self, strategy: &HomeStrategy) -> Attempt {
        match strategy {
            HomeStrategy::EnvVar(name) => {
                let Some(value) = std::env::var_os(name) else {
                    return Attempt::Skipped("not set".to_string());
                };
                let path = PathBuf::from(value);
                if path.is_dir() {
                    Attempt::Found(path)
                } else {
                    Attempt::Rejected(format!("{} is not a directory", path.display()))
                }
            }
            HomeStrategy::ExecutableAncestor { marker } => {
                let executable = match &self.executable {
                    Some(path) => path.clone(),
                    None => match std::env::current_exe() {
                        Ok(path) => path,
                        Err(e) => return Attempt::Skipped(e.to_string()),
                    },
                };
                let executable = executable.canonicalize().unwrap_or(executable);
                match find_marker_parent(&executable, marker) {
                    Some(home) => Attempt::Found(home),
                    None => Attempt::Skipped(format!(
                        "no '{}' directory above {}",
                        marker,
                        executable.display()
                    )),
                }
            }
        }
    }
}

/// Outcome of a single strategy.
enum Attempt {
    Found(PathBuf),
    Skipped(String),
    Rejected(String),
}

impl Default for HomeResolver {
    fn default() -> Self {
        Self::new(vec![
            HomeStrategy::EnvVar(HOME_ENV_VAR.to_string()),
            HomeStrategy::ExecutableAncestor {
                marker: EXECUTABLE_MARKER_DIR.to_string(),
            },
        ])
    }
}

fn find_marker_parent(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .skip(1)
        .find(|dir| dir.file_name().is_some_and(|name| name == marker))
        .and_then(Path::parent)
        .filter(|home| home.is_dir())
        .map(Path::to_path_buf)
}

/// Locations derived from the toolset home directory.
#[derive(Debug, Clone)]
pub struct Toolset {
    home: PathBuf,
}

impl Toolset {
    pub fn new<P: Into<PathBuf>>(home: P) -> Self {
        Self { home: home.into() }
    }

    pub fn resolve(resolver: &HomeResolver) -> Result<Self> {
        resolver.resolve().map(Self::new)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn engine_binary(&self) -> PathBuf {
        self.home.join("bin").join(ENGINE_BINARY_NAME)
    }

    pub fn default_config_path(&self) -> PathBuf {
        self.home.join(DEFAULT_CONFIG_RELATIVE_PATH)
    }

    /// Fails if the bundled engine binary is missing.
    pub fn verify(&self) -> Result<()> {
        let engine = self.engine_binary();
        if !engine.is_file() {
            return Err(RestoreError::EnvironmentResolution {
                message: format!("decompression engine not found at {}", engine.display()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_executable_ancestor_strategy() {
        let temp_dir = TempDir::new().unwrap();
        let bin_dir = temp_dir.path().join("bin");
        fs::create_dir_all(&bin_dir).unwrap();
        let exe = bin_dir.join("logrestore");
        fs::write(&exe, "").unwrap();

        let resolver = HomeResolver::new(vec![HomeStrategy::ExecutableAncestor {
            marker: "bin".to_string(),
        }])
        .with_executable(&exe);

        let home = resolver.resolve().unwrap();
        assert_eq!(home, temp_dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_missing_env_var_falls_through() {
        let temp_dir = TempDir::new().unwrap();
        let bin_dir = temp_dir.path().join("pkg").join("bin");
        fs::create_dir_all(&bin_dir).unwrap();

        let resolver = HomeResolver::new(vec![
            HomeStrategy::EnvVar("LOGRESTORE_TEST_HOME_NEVER_SET".to_string()),
            HomeStrategy::ExecutableAncestor {
                marker: "bin".to_string(),
            },
        ])
        .with_executable(bin_dir.join("logrestore"));

        let home = resolver.resolve().unwrap();
        assert!(home.ends_with("pkg"));
    }

    #[test]
    fn test_env_var_naming_missing_dir_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let bin_dir = temp_dir.path().join("other").join("bin");
        fs::create_dir_all(&bin_dir).unwrap();
        std::env::set_var("LOGRESTORE_TEST_HOME_BOGUS", "/definitely/not/here");

        let resolver = HomeResolver::new(vec![
            HomeStrategy::EnvVar("LOGRESTORE_TEST_HOME_BOGUS".to_string()),
            HomeStrategy::ExecutableAncestor {
                marker: "bin".to_string(),
            },
        ])
        .with_executable(bin_dir.join("logrestore"));

        match resolver.resolve().unwrap_err() {
            RestoreError::EnvironmentResolution { message } => {
                assert!(message.contains("LOGRESTORE_TEST_HOME_BOGUS"));
                assert!(message.contains("/definitely/not/here"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_no_strategy_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = HomeResolver::new(vec![
            HomeStrategy::EnvVar("LOGRESTORE_TEST_HOME_NEVER_SET".to_string()),
            HomeStrategy::ExecutableAncestor {
                marker: "no-such-marker".to_string(),
            },
        ])
        .with_executable(temp_dir.path().join("logrestore"));

        let err = resolver.resolve().unwrap_err();
        match err {
            RestoreError::EnvironmentResolution { message } => {
                assert!(message.contains("LOGRESTORE_TEST_HOME_NEVER_SET"));
                assert!(message.contains("no-such-marker"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_default_strategy_order() {
        let resolver = HomeResolver::default();
        assert_eq!(
            resolver.strategies[0],
            HomeStrategy::EnvVar(HOME_ENV_VAR.to_string())
        );
        assert!(matches!(
            resolver.strategies[1],
            HomeStrategy::ExecutableAncestor { .. }
        ));
    }

    #[test]
    fn test_toolset_paths() {
        let toolset = Toolset::new("/opt/logrestore");
        assert_eq!(toolset.engine_binary(), PathBuf::from("/opt/logrestore/bin/clp"));
        assert_eq!(
            toolset.default_config_path(),
            PathBuf::from("/opt/logrestore/etc/clp-config.yml")
        );
    }

    #[test]
    fn test_toolset_verify_requires_engine() {
        let temp_dir = TempDir::new().unwrap();
        let toolset = Toolset::new(temp_dir.path());
        assert!(toolset.verify().is_err());

        fs::create_dir_all(temp_dir.path().join("bin")).unwrap();
        fs::write(toolset.engine_binary(), "").unwrap();
        assert!(toolset.verify().is_ok());
    }
}
