//! Configuration loader
//!
//! Loads application configuration from a file and environment variables.
//!
//! ## Loading Strategy
//! 1. Read `.env` (if present) into the process environment
//! 2. Load the file named by `ENCORE_CONFIG`, or the first probed config file,
//!    or fall back to defaults
//! 3. Apply `ENCORE_*` environment overrides on top
//!
//! ## Environment Variables
//! - `ENCORE_CONFIG`: Explicit config file path
//! - `ENCORE_DB_PATH`, `ENCORE_DB_POOL_SIZE`: SQLite file and pool size
//! - `ENCORE_BIND_ADDRESS`, `ENCORE_PUBLIC_BASE_URL`: HTTP listener
//! - `ENCORE_GOOGLE_CLIENT_ID`, `ENCORE_GOOGLE_CLIENT_SECRET`,
//!   `ENCORE_GOOGLE_REDIRECT_URI`, `ENCORE_GOOGLE_WEBHOOK_URL`: Google OAuth
//! - `ENCORE_TIME_ZONE`: IANA zone for gig times
//! - `ENCORE_STORAGE_DIR`, `ENCORE_STORAGE_PUBLIC_URL`: Uploaded files
//! - `ENCORE_EMAIL_ENABLED`, `ENCORE_EMAIL_API_KEY`, `ENCORE_EMAIL_FROM`
//! - `ENCORE_SCHEDULER_ENABLED`: Background calendar jobs (true/false)
//!
//! ## File Locations
//! The loader probes `config.{toml,json}` and `encore.{toml,json}` in the
//! working directory, its two parents, then next to the executable.

use std::path::{Path, PathBuf};

use encore_domain::{Config, EncoreError, Result};

const FILE_NAMES: [&str; 4] = ["config.toml", "config.json", "encore.toml", "encore.json"];

/// Load configuration: file (or defaults) plus environment overrides.
///
/// # Errors
/// Returns `EncoreError::Config` if an explicitly named file is missing, a
/// file fails to parse, or an environment value is malformed.
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    let mut config = match std::env::var("ENCORE_CONFIG").ok().filter(|p| !p.trim().is_empty()) {
        Some(path) => load_from_file(Some(PathBuf::from(path)))?,
        None => match probe_config_paths() {
            Some(path) => load_from_file(Some(path))?,
            None => {
                tracing::info!("No config file found; using defaults");
                Config::default()
            }
        },
    };

    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load configuration from environment variables alone.
///
/// `ENCORE_DB_PATH` is required; everything else falls back to defaults.
///
/// # Errors
/// Returns `EncoreError::Config` if the database path is missing or a value
/// is malformed.
pub fn load_from_env() -> Result<Config> {
    env_var("ENCORE_DB_PATH")?;
    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. JSON and TOML are
/// detected by file extension.
///
/// # Errors
/// Returns `EncoreError::Config` if the file is missing, unreadable, or
/// invalid.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(EncoreError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            EncoreError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| EncoreError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| EncoreError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| EncoreError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(EncoreError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard locations; returns the first existing file.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
        roots.push(cwd.join("../.."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Overlay `ENCORE_*` variables that are set onto `config`.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(path) = env_opt("ENCORE_DB_PATH") {
        config.database.path = path;
    }
    if let Some(size) = env_opt("ENCORE_DB_POOL_SIZE") {
        config.database.pool_size = size
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| EncoreError::Config(format!("Invalid pool size: {size}")))?;
    }

    if let Some(addr) = env_opt("ENCORE_BIND_ADDRESS") {
        config.server.bind_address = addr;
    }
    if let Some(url) = env_opt("ENCORE_PUBLIC_BASE_URL") {
        config.server.public_base_url = url;
    }

    if let Some(id) = env_opt("ENCORE_GOOGLE_CLIENT_ID") {
        config.google.client_id = id;
    }
    if let Some(secret) = env_opt("ENCORE_GOOGLE_CLIENT_SECRET") {
        config.google.client_secret = Some(secret);
    }
    if let Some(uri) = env_opt("ENCORE_GOOGLE_REDIRECT_URI") {
        config.google.redirect_uri = uri;
    }
    if let Some(url) = env_opt("ENCORE_GOOGLE_WEBHOOK_URL") {
        config.google.webhook_url = Some(url);
    }
    if let Some(zone) = env_opt("ENCORE_TIME_ZONE") {
        config.google.time_zone = zone;
    }

    if let Some(dir) = env_opt("ENCORE_STORAGE_DIR") {
        config.storage.root_dir = dir;
    }
    if let Some(url) = env_opt("ENCORE_STORAGE_PUBLIC_URL") {
        config.storage.public_base_url = url;
    }

    config.email.enabled = env_bool("ENCORE_EMAIL_ENABLED", config.email.enabled);
    if let Some(key) = env_opt("ENCORE_EMAIL_API_KEY") {
        config.email.api_key = Some(key);
    }
    if let Some(from) = env_opt("ENCORE_EMAIL_FROM") {
        config.email.from_address = from;
    }

    config.scheduler.enabled = env_bool("ENCORE_SCHEDULER_ENABLED", config.scheduler.enabled);
    Ok(())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        EncoreError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Non-empty environment variable, trimmed.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const OVERRIDE_VARS: [&str; 6] = [
        "ENCORE_DB_PATH",
        "ENCORE_DB_POOL_SIZE",
        "ENCORE_GOOGLE_CLIENT_ID",
        "ENCORE_GOOGLE_WEBHOOK_URL",
        "ENCORE_EMAIL_ENABLED",
        "ENCORE_SCHEDULER_ENABLED",
    ];

    fn clear_vars() {
        for key in OVERRIDE_VARS {
            std::env::remove_var(key);
        }
    }

    fn temp_config(contents: &str, extension: &str) -> PathBuf {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).unwrap();
        path
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("ENCORE_TEST_BOOL_ON", "ON");
        std::env::set_var("ENCORE_TEST_BOOL_YES", "yes");
        std::env::set_var("ENCORE_TEST_BOOL_OFF", "off");
        std::env::set_var("ENCORE_TEST_BOOL_ZERO", "0");

        assert!(env_bool("ENCORE_TEST_BOOL_ON", false));
        assert!(env_bool("ENCORE_TEST_BOOL_YES", false));
        assert!(!env_bool("ENCORE_TEST_BOOL_OFF", true));
        assert!(!env_bool("ENCORE_TEST_BOOL_ZERO", true));

        std::env::remove_var("ENCORE_TEST_BOOL_MISSING");
        assert!(env_bool("ENCORE_TEST_BOOL_MISSING", true));
        assert!(!env_bool("ENCORE_TEST_BOOL_MISSING", false));

        for key in
            ["ENCORE_TEST_BOOL_ON", "ENCORE_TEST_BOOL_YES", "ENCORE_TEST_BOOL_OFF", "ENCORE_TEST_BOOL_ZERO"]
        {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_env_overrides_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_vars();

        std::env::set_var("ENCORE_DB_PATH", "/tmp/encore-test.db");
        std::env::set_var("ENCORE_DB_POOL_SIZE", "3");
        std::env::set_var("ENCORE_GOOGLE_CLIENT_ID", "client-abc");
        std::env::set_var("ENCORE_GOOGLE_WEBHOOK_URL", "https://encore.example/webhooks/google");
        std::env::set_var("ENCORE_SCHEDULER_ENABLED", "false");

        let config = load_from_env().expect("config from env");
        assert_eq!(config.database.path, "/tmp/encore-test.db");
        assert_eq!(config.database.pool_size, 3);
        assert!(config.google.is_configured());
        assert_eq!(
            config.google.webhook_url.as_deref(),
            Some("https://encore.example/webhooks/google")
        );
        assert!(!config.scheduler.enabled);
        assert_eq!(config.storage, encore_domain::StorageConfig::default());

        clear_vars();
    }

    #[test]
    fn test_load_from_env_requires_db_path() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_vars();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, EncoreError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_invalid_pool_size_is_rejected() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_vars();

        std::env::set_var("ENCORE_DB_PATH", "/tmp/test.db");
        for bad in ["not-a-number", "0"] {
            std::env::set_var("ENCORE_DB_POOL_SIZE", bad);
            let err = load_from_env().unwrap_err();
            assert!(matches!(err, EncoreError::Config(_)), "{bad} should be rejected");
        }

        clear_vars();
    }

    #[test]
    fn test_load_from_file_toml_keeps_defaults() {
        let path = temp_config(
            r#"
[database]
path = "gigs.db"

[google]
client_id = "client-1"
time_zone = "Europe/Berlin"

[email]
enabled = true
api_key = "re_123"
"#,
            "toml",
        );

        let config = load_from_file(Some(path.clone())).expect("toml config");
        assert_eq!(config.database.path, "gigs.db");
        assert_eq!(config.database.pool_size, 8);
        assert_eq!(config.google.time_zone, "Europe/Berlin");
        assert_eq!(config.google.token_url, "https://oauth2.googleapis.com/token");
        assert!(config.email.enabled);
        assert!(config.scheduler.enabled);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_json() {
        let path = temp_config(
            r#"{"server": {"bind_address": "0.0.0.0:9000"}, "storage": {"root_dir": "/srv/uploads"}}"#,
            "json",
        );

        let config = load_from_file(Some(path.clone())).expect("json config");
        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert_eq!(config.storage.root_dir, "/srv/uploads");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_errors() {
        let missing = load_from_file(Some(PathBuf::from("/nonexistent/encore.toml")));
        assert!(matches!(missing, Err(EncoreError::Config(_))));

        let path = temp_config(r#"{ "database": "#, "json");
        assert!(matches!(load_from_file(Some(path.clone())), Err(EncoreError::Config(_))));
        std::fs::remove_file(path).ok();

        let yaml = parse_config("database: {}", Path::new("encore.yaml"));
        assert!(matches!(yaml, Err(EncoreError::Config(_))));
    }
}
