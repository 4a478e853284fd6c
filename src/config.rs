use crate::error::{RestoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_file: Option<PathBuf>,
    pub archive_output: ArchiveOutputConfig,
    pub logs_directory: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    Mariadb,
    Mysql,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(rename = "type")]
    pub db_type: DatabaseType,
    pub host: String,
    pub port: u16,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveOutputConfig {
    pub directory: PathBuf,
}

/// Connection parameters handed to the engine through `--db-config-file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    #[serde(rename = "type")]
    pub db_type: DatabaseType,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    database: Credentials,
}

#[derive(Debug, Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            credentials_file: None,
            archive_output: ArchiveOutputConfig::default(),
            logs_directory: PathBuf::from("var/log"),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::Mariadb,
            host: "localhost".to_string(),
            port: 3306,
            name: "clp-db".to_string(),
            username: None,
            password: None,
        }
    }
}

impl Default for ArchiveOutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("var/data/archives"),
        }
    }
}

/// Load, resolve and validate the configuration for one run.
///
/// `config_path` wins over `default_config_path`; relative paths inside the
/// file are resolved against `home_dir`.
pub fn resolve(
    config_path: Option<&Path>,
    default_config_path: &Path,
    home_dir: &Path,
) -> Result<Config> {
    let path = config_path.unwrap_or(default_config_path);
    let mut config = Config::load_from_file(path)?;
    config.make_paths_absolute(home_dir);
    config.load_credentials()?;
    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(RestoreError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| RestoreError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        // An empty document deserializes to `null`, which still means "all defaults".
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| RestoreError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    pub fn make_paths_absolute(&mut self, home_dir: &Path) {
        self.archive_output.directory = absolutize(home_dir, &self.archive_output.directory);
        self.logs_directory = absolutize(home_dir, &self.logs_directory);
        self.credentials_file = self
            .credentials_file
            .as_deref()
            .map(|path| absolutize(home_dir, path));
    }

    /// Fill database credentials from `credentials_file` when one is set.
    pub fn load_credentials(&mut self) -> Result<()> {
        let Some(ref path) = self.credentials_file else {
            return Ok(());
        };

        let content = fs::read_to_string(path).map_err(|e| RestoreError::Config {
            message: format!("Failed to read credentials file {}: {}", path.display(), e),
        })?;
        let credentials: CredentialsFile =
            serde_yaml::from_str(&content).map_err(|e| RestoreError::Config {
                message: format!("Failed to parse credentials file {}: {}", path.display(), e),
            })?;

        self.database.username = Some(credentials.database.username);
        self.database.password = Some(credentials.database.password);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_database()?;
        self.validate_archive_output_dir()?;
        self.validate_logs_dir()?;
        Ok(())
    }

    fn validate_database(&self) -> Result<()> {
        let db = &self.database;

        if db.host.trim().is_empty() {
            return Err(RestoreError::Config {
                message: "database.host must not be empty".to_string(),
            });
        }

        if db.name.trim().is_empty() {
            return Err(RestoreError::Config {
                message: "database.name must not be empty".to_string(),
            });
        }

        if db.port == 0 {
            return Err(RestoreError::Config {
                message: "database.port must be greater than 0".to_string(),
            });
        }

        if db.username.is_none() || db.password.is_none() {
            return Err(RestoreError::Config {
                message: "database credentials are missing; set database.username and \
                          database.password or credentials_file"
                    .to_string(),
            });
        }

        Ok(())
    }

    fn validate_archive_output_dir(&self) -> Result<()> {
        let dir = &self.archive_output.directory;
        if !dir.is_dir() {
            return Err(RestoreError::Config {
                message: format!(
                    "archive_output.directory does not exist or is not a directory: {}",
                    dir.display()
                ),
            });
        }
        Ok(())
    }

    fn validate_logs_dir(&self) -> Result<()> {
        let dir = &self.logs_directory;

        if dir.exists() && !dir.is_dir() {
            return Err(RestoreError::Config {
                message: format!("logs_directory is not a directory: {}", dir.display()),
            });
        }

        fs::create_dir_all(dir).map_err(|e| RestoreError::Config {
            message: format!("Failed to create logs_directory {}: {}", dir.display(), e),
        })
    }

    pub fn archives_dir(&self) -> &Path {
        &self.archive_output.directory
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_directory
    }

    /// Snapshot of the connection parameters, credentials included.
    pub fn connection_descriptor(&self) -> Result<ConnectionDescriptor> {
        let db = &self.database;
        match (&db.username, &db.password) {
            (Some(username), Some(password)) => Ok(ConnectionDescriptor {
                db_type: db.db_type,
                host: db.host.clone(),
                port: db.port,
                name: db.name.clone(),
                username: username.clone(),
                password: password.clone(),
            }),
            _ => Err(RestoreError::Config {
                message: "database credentials are missing".to_string(),
            }),
        }
    }

    pub fn create_sample_config() -> String {
        let mut sample = Self::default();
        sample.database.username = Some("clp-user".to_string());
        sample.database.password = Some("change-me".to_string());

        let body = serde_yaml::to_string(&sample).unwrap_or_default();
        format!(
            "# logrestore configuration\n\
             # Relative paths are resolved against the toolset home directory.\n\
             # Credentials may instead be read from a separate file via `credentials_file`.\n\
             {}",
            body
        )
    }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
