use crate::config::ConnectionDescriptor;
use crate::error::Result;
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    DbConfig,
    PathList,
}

impl ArtifactKind {
    fn prefix(self) -> &'static str {
        match self {
            ArtifactKind::DbConfig => "decompress-db-config-",
            ArtifactKind::PathList => "decompress-paths-",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::DbConfig => ".yml",
            ArtifactKind::PathList => ".txt",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::DbConfig => write!(f, "database config"),
            ArtifactKind::PathList => write!(f, "path list"),
        }
    }
}

/// A file that exists only to hand data to the engine.
///
/// The name is random and the file is opened with exclusive-create, so two
/// runs sharing a logs directory never collide. The file is removed when the
/// value is dropped, which covers every early return and engine launch failure.
pub struct EphemeralArtifact {
    kind: ArtifactKind,
    file: NamedTempFile,
}

impl EphemeralArtifact {
    pub fn create(dir: &Path, kind: ArtifactKind, contents: &[u8]) -> Result<Self> {
        let mut file = Self::open(dir, kind)?;
        file.write_all(contents)?;
        file.flush()?;
        Ok(Self::finish(kind, file))
    }

    /// Serialize the connection parameters (credentials included) to YAML.
    pub fn db_config(dir: &Path, descriptor: &ConnectionDescriptor) -> Result<Self> {
        let yaml = serde_yaml::to_string(descriptor)?;
        Self::create(dir, ArtifactKind::DbConfig, yaml.as_bytes())
    }

    /// One path per line, in the order given, each terminated by `\n`.
    pub fn path_list(dir: &Path, paths: &[String]) -> Result<Self> {
        let mut file = Self::open(dir, ArtifactKind::PathList)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            for path in paths {
                writer.write_all(path.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        Ok(Self::finish(ArtifactKind::PathList, file))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn open(dir: &Path, kind: ArtifactKind) -> Result<NamedTempFile> {
        Ok(tempfile::Builder::new()
            .prefix(kind.prefix())
            .suffix(kind.suffix())
            .rand_bytes(16)
            .tempfile_in(dir)?)
    }

    fn finish(kind: ArtifactKind, file: NamedTempFile) -> Self {
        log::debug!("Created {} artifact {}", kind, file.path().display());
        Self { kind, file }
    }
}

impl Drop for EphemeralArtifact {
    fn drop(&mut self) {
        // NamedTempFile unlinks the file once this returns.
        log::debug!("Removing {} artifact {}", self.kind, self.file.path().display());
    }
}

impl fmt::Debug for EphemeralArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralArtifact")
            .field("kind", &self.kind)
            .field("path", &self.path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseType;
    use std::fs;
    use tempfile::TempDir;

    fn descriptor() -> ConnectionDescriptor {
        ConnectionDescriptor {
            db_type: DatabaseType::Mariadb,
            host: "localhost".to_string(),
            port: 3306,
            name: "clp-db".to_string(),
            username: "reader".to_string(),
            password: "s3cret".to_string(),
        }
    }

    #[test]
    fn test_db_config_is_yaml_and_removed_on_drop() {
        let logs = TempDir::new().unwrap();
        let artifact = EphemeralArtifact::db_config(logs.path(), &descriptor()).unwrap();
        let path = artifact.path().to_path_buf();

        assert_eq!(path.parent().unwrap(), logs.path());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("decompress-db-config-"));
        assert!(name.ends_with(".yml"));

        let parsed: ConnectionDescriptor =
            serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, descriptor());

        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn test_path_list_preserves_order() {
        let logs = TempDir::new().unwrap();
        let paths = vec![
            "/var/log/b.log".to_string(),
            "/var/log/a.log".to_string(),
            "/var/log/c.log".to_string(),
        ];
        let artifact = EphemeralArtifact::path_list(logs.path(), &paths).unwrap();

        let content = fs::read_to_string(artifact.path()).unwrap();
        assert_eq!(content, "/var/log/b.log\n/var/log/a.log\n/var/log/c.log\n");
        assert_eq!(artifact.kind, ArtifactKind::PathList);
    }

    #[test]
    fn test_names_are_unique() {
        let logs = TempDir::new().unwrap();
        let artifacts: Vec<_> = (0..32)
            .map(|_| EphemeralArtifact::db_config(logs.path(), &descriptor()).unwrap())
            .collect();

        let mut names: Vec<_> = artifacts.iter().map(|a| a.path().to_path_buf()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), artifacts.len());

        drop(artifacts);
        assert_eq!(fs::read_dir(logs.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_create_in_missing_dir_fails() {
        let logs = TempDir::new().unwrap();
        let missing = logs.path().join("nope");
        assert!(EphemeralArtifact::create(&missing, ArtifactKind::PathList, b"x").is_err());
    }
}
