use crate::core::error::{Error, Result};
use crate::core::liveness::{DEFAULT_PROC_ROOT, LivenessProbe, default_pid_file};
use crate::core::services::{DEFAULT_SERVICES_PATH, SystemServices};
use crate::utils::get_data_dir;
use crate::validators::InterfaceLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the daemon whose liveness is probed when none is configured
pub const DEFAULT_DAEMON: &str = "firewalld";

/// Application configuration: where the service table lives, which daemon to
/// probe, and the interface name limits of the packet-filter tooling in use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_services_file")]
    pub services_file: PathBuf,
    #[serde(default = "default_daemon")]
    pub daemon: String,
    /// Overrides `/var/run/<daemon>.pid`
    #[serde(default)]
    pub pid_file: Option<PathBuf>,
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,
    #[serde(default)]
    pub interface_limits: InterfaceLimits,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            services_file: default_services_file(),
            daemon: default_daemon(),
            pid_file: None,
            proc_root: default_proc_root(),
            interface_limits: InterfaceLimits::default(),
        }
    }
}

impl AppConfig {
    /// Service database described by this config (loaded lazily)
    pub fn services(&self) -> SystemServices {
        SystemServices::new(&self.services_file)
    }

    pub fn liveness_probe(&self) -> LivenessProbe {
        LivenessProbe {
            pid_file: self
                .pid_file
                .clone()
                .unwrap_or_else(|| default_pid_file(&self.daemon)),
            proc_root: self.proc_root.clone(),
            program: self.daemon.clone(),
        }
    }
}

fn default_services_file() -> PathBuf {
    PathBuf::from(DEFAULT_SERVICES_PATH)
}

fn default_daemon() -> String {
    DEFAULT_DAEMON.to_string()
}

fn default_proc_root() -> PathBuf {
    PathBuf::from(DEFAULT_PROC_ROOT)
}

/// Default config location: `<data_dir>/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    get_data_dir().map(|dir| dir.join("config.json"))
}

/// Saves the config to disk using an atomic write pattern.
/// 1. Writes to a temporary file.
/// 2. Sets restrictive permissions (0o600).
/// 3. Atomically renames to the target path.
///
/// Writes to `path`, or to [`default_config_path`] when `None`.
/// Returns the path written.
///
/// # Errors
///
/// Returns `Err` if no path is available or the file cannot be written.
pub async fn save_config(config: &AppConfig, path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()
            .ok_or_else(|| Error::Config("Data directory not available".to_string()))?,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(config)?;
    let temp_path = path.with_extension("json.tmp");

    let written = match write_private(&temp_path, json.as_bytes()).await {
        Ok(()) => tokio::fs::rename(&temp_path, &path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await
            && cleanup.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!("Failed to remove {:?}: {}", temp_path, cleanup);
        }
        return Err(e.into());
    }

    tracing::info!("Config saved to {:?}", path);
    Ok(path)
}

/// Writes `bytes` to a fresh file readable only by the owner, synced to disk.
async fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;

    // Create file with restrictive permissions from the start to prevent
    // race condition where file is briefly world-readable
    #[cfg(unix)]
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .await?;

    #[cfg(not(unix))]
    let mut file = tokio::fs::File::create(path).await?;

    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Loads the app config.
///
/// An explicit `path` must exist and parse. Without one, the default location
/// is tried and any failure there falls back to [`AppConfig::default`].
///
/// # Errors
///
/// Returns `Err` only for an explicit path that cannot be read or parsed.
pub async fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        let json = tokio::fs::read_to_string(path).await?;
        return Ok(serde_json::from_str(&json)?);
    }

    if let Some(path) = default_config_path()
        && let Ok(json) = tokio::fs::read_to_string(&path).await
    {
        match serde_json::from_str::<AppConfig>(&json) {
            Ok(config) => return Ok(config),
            Err(e) => tracing::warn!("Ignoring invalid config {:?}: {}", path, e),
        }
    }
    Ok(AppConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.services_file, PathBuf::from("/etc/services"));
        assert_eq!(config.daemon, "firewalld");
        assert_eq!(
            config.liveness_probe().pid_file,
            PathBuf::from("/var/run/firewalld.pid")
        );
        assert_eq!(config.interface_limits.max_len, 16);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"daemon": "fwd", "interface_limits": {"max_len": 15}}"#)
                .unwrap();
        assert_eq!(config.daemon, "fwd");
        assert_eq!(config.services_file, PathBuf::from("/etc/services"));
        assert_eq!(config.interface_limits.max_len, 15);
        assert_eq!(config.liveness_probe().program, "fwd");
    }

    #[test]
    fn test_pid_file_override() {
        let config = AppConfig {
            pid_file: Some(PathBuf::from("/run/fwd/fwd.pid")),
            ..AppConfig::default()
        };
        assert_eq!(
            config.liveness_probe().pid_file,
            PathBuf::from("/run/fwd/fwd.pid")
        );
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            daemon: "fwd".to_string(),
            ..AppConfig::default()
        };

        let written = save_config(&config, Some(&path)).await.unwrap();
        assert_eq!(written, path);
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = load_config(Some(&path)).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_explicit_missing_path_is_error() {
        let result = load_config(Some(Path::new("/nonexistent/fwspec.json"))).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_failed_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory where the config file should go makes the rename fail
        let path = dir.path().join("config.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), "x").unwrap();

        let result = save_config(&AppConfig::default(), Some(&path)).await;
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(!path.with_extension("json.tmp").exists());
        assert!(path.join("occupied").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_config_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        save_config(&AppConfig::default(), Some(&path)).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
