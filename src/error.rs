use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("Invalid usage: {message}")]
    Usage { message: String },

    #[error("Extraction directory does not exist or is not a directory: {path}")]
    ExtractionDirMissing { path: PathBuf },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unable to resolve toolset environment: {message}")]
    EnvironmentResolution { message: String },

    #[error("Failed to launch decompression engine {binary}")]
    EngineLaunch {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Decompression engine exited with code {code}")]
    EngineFailed { code: i32 },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl RestoreError {
    /// Status returned to the caller. Engine failures keep the engine's own
    /// code; everything else is reported as -1.
    pub fn status_code(&self) -> i32 {
        match self {
            RestoreError::EngineFailed { code } => *code,
            _ => -1,
        }
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for RestoreError {
    fn user_message(&self) -> String {
        match self {
            RestoreError::Usage { message } => message.clone(),
            RestoreError::ExtractionDirMissing { path } => {
                format!("Extraction directory does not exist: {}", path.display())
            }
            RestoreError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            RestoreError::EnvironmentResolution { message } => {
                format!("Unable to resolve toolset environment: {}", message)
            }
            RestoreError::EngineLaunch { binary, source } => {
                format!(
                    "Failed to launch decompression engine {}: {}",
                    binary.display(),
                    source
                )
            }
            RestoreError::EngineFailed { code } => {
                format!("Decompression failed with exit code {}", code)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            RestoreError::Usage { .. } => Some(
                "Specify paths either as arguments or with --files-from, not both."
                    .to_string(),
            ),
            RestoreError::ExtractionDirMissing { .. } => Some(
                "Create the directory first or point --extraction-dir at an existing one."
                    .to_string(),
            ),
            RestoreError::Config { .. } => Some(
                "Check your configuration file syntax and that the referenced \
                 directories exist."
                    .to_string(),
            ),
            RestoreError::EnvironmentResolution { .. } => {
                Some("Set LOGRESTORE_HOME to the toolset installation directory.".to_string())
            }
            RestoreError::EngineLaunch { .. } => Some(
                "Ensure the decompression engine is installed under <home>/bin and is \
                 executable."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RestoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_friendly_messages() {
        let error = RestoreError::ExtractionDirMissing {
            path: PathBuf::from("/nowhere"),
        };
        assert!(error.user_message().contains("/nowhere"));
        assert!(error.suggestion().is_some());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RestoreError::EngineFailed { code: 2 }.status_code(), 2);
        assert_eq!(
            RestoreError::Usage {
                message: "both".to_string()
            }
            .status_code(),
            -1
        );
        assert_eq!(
            RestoreError::Config {
                message: "bad".to_string()
            }
            .status_code(),
            -1
        );
    }

    #[test]
    fn test_engine_failure_message_carries_code() {
        let error = RestoreError::EngineFailed { code: 137 };
        assert_eq!(error.user_message(), "Decompression failed with exit code 137");
        assert!(error.suggestion().is_none());
    }
}
