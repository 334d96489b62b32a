//! Configuration management
//!
//! Configuration is read once at startup from a TOML file at
//! `$CX_CONFIG_DIR/config.toml` (default `~/.config/cx/config.toml`) and then
//! overlaid with environment variables. There is no hot reload.
//!
//! PROTECTED FILE: Changes to schema_version require migration support.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable that overrides the configuration directory
pub const CONFIG_DIR_ENV: &str = "CX_CONFIG_DIR";

/// Default Microsoft identity platform authority
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

/// Default Microsoft Graph endpoint
pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";

/// Default multipart part size for streamed S3 uploads: 8 MiB
pub const DEFAULT_PART_SIZE: u64 = 8 * 1024 * 1024;

const DEFAULT_OUTPUT: &str = "human";
const DEFAULT_COLOR: &str = "auto";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_TENANT: &str = "common";
const DEFAULT_RCLONE_BINARY: &str = "rclone";
const DEFAULT_BIND: &str = "127.0.0.1:8000";
const DEFAULT_ORIGIN: &str = "http://localhost:5173";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub s3: S3Settings,

    #[serde(default)]
    pub onedrive: OneDriveSettings,

    #[serde(default)]
    pub rclone: RcloneSettings,
}

/// Default settings for CLI behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,

    /// Show progress bars
    #[serde(default = "default_true")]
    pub progress: bool,
}

/// S3 connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct S3Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint URL for S3-compatible services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Default bucket for transfers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    /// Part size for streamed multipart uploads, in bytes
    #[serde(default = "default_part_size")]
    pub part_size: u64,
}

/// Microsoft Graph / identity settings
#[derive(Clone, Serialize, Deserialize)]
pub struct OneDriveSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default = "default_tenant")]
    pub tenant_id: String,

    /// Only needed for the client-credential flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default = "default_authority")]
    pub authority: String,

    #[serde(default = "default_graph_url")]
    pub graph_url: String,

    /// Scopes requested by the device-code flow
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

/// rclone gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RcloneSettings {
    /// rclone executable name or path
    #[serde(default = "default_rclone_binary")]
    pub binary: String,

    /// Address the HTTP facade binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Origins allowed by CORS
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_part_size() -> u64 {
    DEFAULT_PART_SIZE
}

fn default_tenant() -> String {
    DEFAULT_TENANT.to_string()
}

fn default_authority() -> String {
    DEFAULT_AUTHORITY.to_string()
}

fn default_graph_url() -> String {
    DEFAULT_GRAPH_URL.to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["Files.ReadWrite.All".to_string(), "offline_access".to_string()]
}

fn default_rclone_binary() -> String {
    DEFAULT_RCLONE_BINARY.to_string()
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_origins() -> Vec<String> {
    vec![DEFAULT_ORIGIN.to_string()]
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            progress: true,
        }
    }
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            access_key: None,
            secret_key: None,
            region: default_region(),
            endpoint: None,
            bucket: None,
            part_size: default_part_size(),
        }
    }
}

impl Default for OneDriveSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            tenant_id: default_tenant(),
            client_secret: None,
            authority: default_authority(),
            graph_url: default_graph_url(),
            scopes: default_scopes(),
        }
    }
}

impl Default for RcloneSettings {
    fn default() -> Self {
        Self {
            binary: default_rclone_binary(),
            bind: default_bind(),
            allowed_origins: default_origins(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            s3: S3Settings::default(),
            onedrive: OneDriveSettings::default(),
            rclone: RcloneSettings::default(),
        }
    }
}

fn redact(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "<redacted>")
}

impl std::fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Settings")
            .field("access_key", &self.access_key)
            .field("secret_key", &redact(&self.secret_key))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("part_size", &self.part_size)
            .finish()
    }
}

impl std::fmt::Debug for OneDriveSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneDriveSettings")
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("authority", &self.authority)
            .field("graph_url", &self.graph_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

impl Config {
    /// Overlay environment variables on top of file values
    ///
    /// `lookup` is usually `|k| std::env::var(k).ok()`; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("AWS_ACCESS_KEY") {
            self.s3.access_key = Some(v);
        }
        if let Some(v) = get("AWS_SECRET_KEY") {
            self.s3.secret_key = Some(v);
        }
        if let Some(v) = get("AWS_REGION") {
            self.s3.region = v;
        }
        if let Some(v) = get("AWS_ENDPOINT_URL") {
            self.s3.endpoint = Some(v);
        }
        if let Some(v) = get("S3_BUCKET") {
            self.s3.bucket = Some(v);
        }
        if let Some(v) = get("ONEDRIVE_CLIENT_ID") {
            self.onedrive.client_id = Some(v);
        }
        if let Some(v) = get("ONEDRIVE_TENANT_ID") {
            self.onedrive.tenant_id = v;
        }
        if let Some(v) = get("ONEDRIVE_CLIENT_SECRET") {
            self.onedrive.client_secret = Some(v);
        }
        if let Some(v) = get("RCLONE_BINARY") {
            self.rclone.binary = v;
        }
        if let Some(v) = get("CX_BIND") {
            self.rclone.bind = v;
        }
    }

    /// Check URLs and sizes that would otherwise fail late
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.s3.endpoint {
            url::Url::parse(endpoint)?;
        }
        url::Url::parse(&self.onedrive.authority)?;
        url::Url::parse(&self.onedrive.graph_url)?;

        if self.s3.part_size == 0 {
            return Err(Error::Config("s3.part_size must be greater than zero".into()));
        }

        Ok(())
    }

    /// Copy with every secret replaced, for display
    pub fn redacted(&self) -> Config {
        let mut config = self.clone();
        let mask = |v: &mut Option<String>| {
            if v.is_some() {
                *v = Some("<redacted>".to_string());
            }
        };
        mask(&mut config.s3.secret_key);
        mask(&mut config.onedrive.client_secret);
        config
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    ///
    /// `CX_CONFIG_DIR` takes precedence over the platform config directory.
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("cx"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade cx.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    /// Load the file, apply process environment overrides and validate
    pub fn load_with_env(&self) -> Result<Config> {
        let mut config = self.load()?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        tracing::debug!(path = %self.config_path.display(), "configuration loaded");
        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn temp_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let manager = ConfigManager::with_path(config_path);
        (manager, temp_dir)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.defaults.output, "human");
        assert!(config.defaults.progress);
        assert_eq!(config.s3.region, "us-east-1");
        assert_eq!(config.s3.part_size, DEFAULT_PART_SIZE);
        assert_eq!(config.onedrive.tenant_id, "common");
        assert_eq!(config.rclone.binary, "rclone");
        assert_eq!(config.rclone.allowed_origins, vec!["http://localhost:5173"]);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (manager, _temp_dir) = temp_config_manager();
        let config = manager.load().unwrap();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_save_and_load() {
        let (manager, _temp_dir) = temp_config_manager();

        let mut config = Config::default();
        config.s3.bucket = Some("reports".to_string());
        config.onedrive.client_id = Some("client-123".to_string());

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(loaded.s3.bucket.as_deref(), Some("reports"));
        assert_eq!(loaded.onedrive.client_id.as_deref(), Some("client-123"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(
            manager.config_path(),
            "schema_version = 1\n[s3]\nbucket = \"b\"\n",
        )
        .unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.s3.bucket.as_deref(), Some("b"));
        assert_eq!(config.s3.region, "us-east-1");
        assert_eq!(config.onedrive.graph_url, DEFAULT_GRAPH_URL);
    }

    #[test]
    fn test_schema_version_too_new() {
        let (manager, _temp_dir) = temp_config_manager();

        let content = format!("schema_version = {}\n", SCHEMA_VERSION + 1);
        std::fs::write(manager.config_path(), content).unwrap();

        let result = manager.load();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("newer than supported"));
    }

    #[test]
    fn test_apply_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("AWS_ACCESS_KEY", "AKIA"),
            ("AWS_SECRET_KEY", "secret"),
            ("AWS_REGION", "eu-central-1"),
            ("S3_BUCKET", "incoming"),
            ("ONEDRIVE_CLIENT_ID", "cid"),
            ("ONEDRIVE_TENANT_ID", "tid"),
            ("RCLONE_BINARY", "/opt/rclone"),
            ("CX_BIND", ""),
        ]);

        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.s3.access_key.as_deref(), Some("AKIA"));
        assert_eq!(config.s3.region, "eu-central-1");
        assert_eq!(config.s3.bucket.as_deref(), Some("incoming"));
        assert_eq!(config.onedrive.client_id.as_deref(), Some("cid"));
        assert_eq!(config.onedrive.tenant_id, "tid");
        assert_eq!(config.rclone.binary, "/opt/rclone");
        // empty values are ignored
        assert_eq!(config.rclone.bind, "127.0.0.1:8000");
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.s3.endpoint = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_rejects_zero_part_size() {
        let mut config = Config::default();
        config.s3.part_size = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let mut config = Config::default();
        config.s3.secret_key = Some("s3cr3t".to_string());
        config.onedrive.client_secret = Some("hunter2".to_string());

        let shown = toml::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains("s3cr3t"));
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("<redacted>"));
    }
}
