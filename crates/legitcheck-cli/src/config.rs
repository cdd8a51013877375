//! Process configuration: where the registry and blobs live, and the service
//! settings layered over an optional JSON file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use legitcheck::store::{FsBlobStore, SqliteStore};
use legitcheck::ServiceConfig;

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// SQLite registry file
    #[arg(long, env = "LEGITCHECK_DB", default_value = "legitcheck.db", global = true)]
    pub db: PathBuf,

    /// Serving origin used in verification URLs
    #[arg(long, env = "LEGITCHECK_ORIGIN", global = true)]
    pub origin: Option<String>,

    /// Directory holding stamped PDFs
    #[arg(long, env = "LEGITCHECK_BLOB_DIR", default_value = "issued", global = true)]
    pub blob_dir: PathBuf,

    /// Public base URL of the blob directory [default: file:// URLs]
    #[arg(long, env = "LEGITCHECK_BLOB_URL", global = true)]
    pub blob_url: Option<String>,

    /// JSON service configuration
    #[arg(long, short = 'c', env = "LEGITCHECK_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

impl GlobalArgs {
    /// Defaults, then the config file, then `--origin`.
    pub fn service_config(&self) -> Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                ServiceConfig::from_json_str(&json)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => ServiceConfig::default(),
        };

        if let Some(origin) = &self.origin {
            config.origin = origin.clone();
        }
        config.validate().context("invalid service configuration")
    }

    pub fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.db)
            .with_context(|| format!("opening registry {}", self.db.display()))
    }

    pub fn open_blobs(&self) -> Result<FsBlobStore> {
        let store = match &self.blob_url {
            Some(url) => FsBlobStore::open(&self.blob_dir, url.as_str()),
            None => FsBlobStore::open_file_urls(&self.blob_dir),
        };
        store.with_context(|| format!("opening blob directory {}", self.blob_dir.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: &std::path::Path) -> GlobalArgs {
        GlobalArgs {
            db: dir.join("registry.db"),
            origin: None,
            blob_dir: dir.join("blobs"),
            blob_url: None,
            config: None,
        }
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = args(dir.path()).service_config().unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_origin_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legitcheck.json");
        std::fs::write(
            &path,
            r#"{"origin": "https://file.example", "blob_prefix": "certs"}"#,
        )
        .unwrap();

        let mut global = args(dir.path());
        global.config = Some(path);
        let config = global.service_config().unwrap();
        assert_eq!(config.origin, "https://file.example");
        assert_eq!(config.blob_prefix, "certs");

        global.origin = Some("https://flag.example/".into());
        let config = global.service_config().unwrap();
        assert_eq!(config.origin, "https://flag.example");
        assert_eq!(config.blob_prefix, "certs");
    }

    #[test]
    fn test_bad_origin_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut global = args(dir.path());
        global.origin = Some("legitcheck.example".into());
        assert!(global.service_config().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut global = args(dir.path());
        global.config = Some(dir.path().join("absent.json"));
        let err = global.service_config().unwrap_err();
        assert!(format!("{err:#}").contains("reading config file"));
    }

    #[test]
    fn test_open_backends() {
        let dir = tempfile::tempdir().unwrap();
        let global = args(dir.path());
        global.open_store().unwrap();
        global.open_blobs().unwrap();
        assert!(dir.path().join("blobs").is_dir());
        assert!(dir.path().join("registry.db").exists());
    }
}
