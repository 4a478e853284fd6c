pub mod artifact;
pub mod cli;
pub mod config;
pub mod decompress;
pub mod error;
pub mod home;
pub mod ui;

// Public API re-exports
pub use artifact::{ArtifactKind, EphemeralArtifact};
pub use cli::{Cli, OutputFormat};
pub use config::{
    resolve as resolve_config, Config, ConnectionDescriptor, DatabaseConfig, DatabaseType,
};
pub use decompress::{
    DecompressionRequest, Decompressor, EngineInvocation, EngineRunner, ProcessRunner,
};
pub use error::{RestoreError, Result, UserFriendlyError};
pub use home::{HomeResolver, HomeStrategy, Toolset, HOME_ENV_VAR};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode};

use std::path::Path;

/// Write the sample configuration to `path`, refusing to overwrite an existing file.
pub fn generate_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Err(RestoreError::Config {
            message: format!("Refusing to overwrite existing file: {}", path.display()),
        });
    }

    std::fs::write(path, Config::create_sample_config())?;
    Ok(())
}
