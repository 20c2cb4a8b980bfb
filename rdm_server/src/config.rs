//! Config loader — C10. Strict YAML, `#[serde(deny_unknown_fields)]`, same
//! shape as the original's `config.go`. Missing/invalid values are a fatal
//! startup error, never a default-and-continue.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub port: u16,

    #[serde(rename = "ffmpegLocation")]
    pub ffmpeg_location: PathBuf,

    #[serde(rename = "changesetsLocation")]
    pub changesets_location: PathBuf,

    #[serde(rename = "allowClientReconnect", default)]
    pub allow_client_reconnect: bool,

    /// Path to the external downloader tool. Named `script_path` in every
    /// snapshot of the original's `downloader.go`; dropped from spec.md's
    /// condensed config table but required to actually spawn C2.
    #[serde(rename = "downloaderPath")]
    pub downloader_path: PathBuf,

    /// Parent of `storage/`, `tmp/`, `app.db`. Defaults to the working
    /// directory, matching the original's bare `"storage"`/`"tmp"` paths.
    #[serde(rename = "storageRoot", default = "default_storage_root")]
    pub storage_root: PathBuf,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("ffmpegLocation {0} does not exist or is not a directory")]
    FfmpegLocation(PathBuf),
    #[error("changesetsLocation {0} does not exist or is not a directory")]
    ChangesetsLocation(PathBuf),
    #[error("downloaderPath {0} does not exist")]
    DownloaderPath(PathBuf),
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read { path: path.to_path_buf(), source: e })?;
        let config: Config = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.ffmpeg_location.is_dir() {
            return Err(ConfigError::FfmpegLocation(self.ffmpeg_location.clone()));
        }
        if !self.changesets_location.is_dir() {
            return Err(ConfigError::ChangesetsLocation(self.changesets_location.clone()));
        }
        if !self.downloader_path.exists() {
            return Err(ConfigError::DownloaderPath(self.downloader_path.clone()));
        }
        Ok(())
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.storage_root.join("storage")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.storage_root.join("tmp")
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage_root.join("app.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn rejects_unknown_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let yaml = format!(
            "port: 8080\nffmpegLocation: {:?}\nchangesetsLocation: {:?}\ndownloaderPath: {:?}\nbogusField: true\n",
            tmp.path(),
            tmp.path(),
            tmp.path().join("does-not-matter-for-this-test"),
        );
        let path = write(tmp.path(), "config.yaml", &yaml);
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_missing_ffmpeg_location() {
        let tmp = tempfile::tempdir().unwrap();
        let downloader = write(tmp.path(), "downloader", "");
        let yaml = format!(
            "port: 8080\nffmpegLocation: {:?}\nchangesetsLocation: {:?}\ndownloaderPath: {:?}\n",
            tmp.path().join("nonexistent"),
            tmp.path(),
            downloader,
        );
        let path = write(tmp.path(), "config.yaml", &yaml);
        assert!(matches!(Config::load(&path), Err(ConfigError::FfmpegLocation(_))));
    }

    #[test]
    fn accepts_minimal_valid_config() {
        let tmp = tempfile::tempdir().unwrap();
        let downloader = write(tmp.path(), "downloader", "");
        let yaml = format!(
            "port: 8080\nffmpegLocation: {:?}\nchangesetsLocation: {:?}\ndownloaderPath: {:?}\n",
            tmp.path(),
            tmp.path(),
            downloader,
        );
        let path = write(tmp.path(), "config.yaml", &yaml);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.allow_client_reconnect);
        assert_eq!(config.storage_root, PathBuf::from("."));
    }
}
