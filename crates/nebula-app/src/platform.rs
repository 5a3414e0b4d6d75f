//! Per-user directories for configuration and logs.

use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur during platform operations.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The OS did not provide a configuration directory.
    #[error("could not determine OS configuration directory")]
    NoConfigDir,
    /// Directory creation failed.
    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// OS-specific directory paths.
///
/// Follows OS conventions (XDG on Linux, Known Folders on Windows, Library on macOS).
#[derive(Debug, Clone)]
pub struct PlatformDirs {
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    /// Holds `nebula.log` in debug builds.
    pub log_dir: PathBuf,
}

const APP_NAME: &str = "nebula";

impl PlatformDirs {
    /// Resolves the directories without creating them.
    pub fn resolve() -> Result<Self, PlatformError> {
        let config_base = dirs::config_dir().ok_or(PlatformError::NoConfigDir)?;
        let app_config = config_base.join(APP_NAME);
        let log_dir = dirs::cache_dir()
            .map(|d| d.join(APP_NAME))
            .unwrap_or_else(|| app_config.clone())
            .join("logs");
        Ok(Self {
            config_dir: app_config,
            log_dir,
        })
    }

    /// Uses `config_dir` as given and keeps logs next to it.
    pub fn with_config_dir(config_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            log_dir: config_dir.join("logs"),
        }
    }

    /// Creates both directories on disk.
    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        for dir in [&self.config_dir, &self.log_dir] {
            std::fs::create_dir_all(dir).map_err(|source| PlatformError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_dirs_resolve() {
        let Ok(dirs) = PlatformDirs::resolve() else {
            return; // no home directory in this environment
        };
        assert!(dirs.config_dir.is_absolute());
        assert!(dirs.log_dir.is_absolute());
        assert!(dirs.config_dir.ends_with(APP_NAME));
        assert!(dirs.log_dir.ends_with("logs"));
    }

    #[test]
    fn test_custom_config_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = PlatformDirs::with_config_dir(&tmp.path().join("cfg"));
        dirs.create_dirs().unwrap();
        assert!(dirs.config_dir.is_dir());
        assert!(dirs.log_dir.is_dir());
        assert_eq!(dirs.log_dir, tmp.path().join("cfg").join("logs"));
    }

    #[test]
    fn test_create_dirs_reports_path() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();
        let dirs = PlatformDirs::with_config_dir(&file);
        let err = dirs.create_dirs().unwrap_err();
        assert!(matches!(err, PlatformError::Io { ref path, .. } if path == &file));
    }
}
