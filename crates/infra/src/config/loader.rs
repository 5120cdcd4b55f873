//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Environment variables, when they describe a usable configuration
//! 2. Otherwise the first config file found by [`probe_config_paths`]
//!
//! ## Environment Variables
//! - `S3MANAGER_HOST`, `S3MANAGER_PORT`, `S3MANAGER_PUBLIC_URL`
//! - `S3MANAGER_SESSION_LIFETIME`: session inactivity expiry in seconds
//! - `S3MANAGER_COOKIE_SECURE`, `S3MANAGER_LOCAL_DEV_MODE` (true/false)
//! - `S3MANAGER_SWEEP_INTERVAL`: background sweep period in seconds
//! - `S3MANAGER_PIM_ENABLED` (true/false)
//! - `S3MANAGER_OIDC_PROVIDER`: `azure`, `azuread`, `keycloak`, `google` or
//!   `generic`
//! - `S3MANAGER_OIDC_CLIENT_ID` (required unless local dev mode),
//!   `S3MANAGER_OIDC_CLIENT_SECRET`, `S3MANAGER_OIDC_ISSUER`,
//!   `S3MANAGER_OIDC_TENANT_ID`
//! - `S3MANAGER_OIDC_SCOPES`: space- or comma-separated
//! - `S3MANAGER_DEFAULT_ROLE`
//!
//! ## File Locations
//! `config.{toml,json}` and `s3manager.{toml,json}` in the working
//! directory, its two parents, and the executable's directory.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use s3manager_domain::{Config, OidcConfig, ProviderKind, Result, S3ManagerError};

const CONFIG_FILE_NAMES: [&str; 4] =
    ["config.toml", "config.json", "s3manager.toml", "s3manager.json"];

/// Load configuration from the environment, falling back to a file
///
/// # Errors
/// Returns [`S3ManagerError::Config`] when neither source yields a valid
/// configuration.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Environment configuration incomplete, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from `S3MANAGER_*` environment variables
///
/// # Errors
/// Returns [`S3ManagerError::Config`] if `S3MANAGER_OIDC_CLIENT_ID` is
/// missing outside local dev mode, a value fails to parse, or the result
/// does not validate.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    let server = &mut config.server;

    if let Some(host) = env_opt("S3MANAGER_HOST") {
        server.host = host;
    }
    if let Some(port) = env_parse::<u16>("S3MANAGER_PORT")? {
        server.port = port;
    }
    server.public_url = env_opt("S3MANAGER_PUBLIC_URL");
    if let Some(lifetime) = env_parse::<u64>("S3MANAGER_SESSION_LIFETIME")? {
        server.session_lifetime_secs = lifetime;
    }
    server.cookie_secure = env_bool("S3MANAGER_COOKIE_SECURE", false);
    server.local_dev_mode = env_bool("S3MANAGER_LOCAL_DEV_MODE", false);
    server.sweep_interval_secs = env_parse::<u64>("S3MANAGER_SWEEP_INTERVAL")?;
    server.pim_enabled = env_bool("S3MANAGER_PIM_ENABLED", false);

    config.oidc = match env_var("S3MANAGER_OIDC_CLIENT_ID") {
        Ok(client_id) => Some(oidc_from_env(client_id)?),
        Err(_) if config.server.local_dev_mode => None,
        Err(e) => return Err(e),
    };

    if let Some(role) = env_opt("S3MANAGER_DEFAULT_ROLE") {
        config.roles.default_role = role;
    }

    config.validate()?;
    Ok(config)
}

fn oidc_from_env(client_id: String) -> Result<OidcConfig> {
    let provider = env_opt("S3MANAGER_OIDC_PROVIDER")
        .map(|name| ProviderKind::from_str(&name))
        .transpose()?
        .unwrap_or_default();

    let mut oidc = OidcConfig::new(provider, client_id);
    oidc.client_secret = env_opt("S3MANAGER_OIDC_CLIENT_SECRET");
    oidc.issuer = env_opt("S3MANAGER_OIDC_ISSUER");
    oidc.tenant_id = env_opt("S3MANAGER_OIDC_TENANT_ID");

    if let Some(scopes) = env_opt("S3MANAGER_OIDC_SCOPES") {
        oidc.scopes = scopes
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }

    Ok(oidc)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. The format is chosen
/// by extension (`.toml` or `.json`).
///
/// # Errors
/// Returns [`S3ManagerError::Config`] if the file is missing, unreadable,
/// malformed or fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(S3ManagerError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            S3ManagerError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| S3ManagerError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| S3ManagerError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| S3ManagerError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(S3ManagerError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Find the first existing config file in the standard locations
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        S3ManagerError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Set and non-blank
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| S3ManagerError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;
    use tempfile::NamedTempFile;

    use super::*;

    const VARS: [&str; 15] = [
        "S3MANAGER_HOST",
        "S3MANAGER_PORT",
        "S3MANAGER_PUBLIC_URL",
        "S3MANAGER_SESSION_LIFETIME",
        "S3MANAGER_COOKIE_SECURE",
        "S3MANAGER_LOCAL_DEV_MODE",
        "S3MANAGER_SWEEP_INTERVAL",
        "S3MANAGER_PIM_ENABLED",
        "S3MANAGER_OIDC_PROVIDER",
        "S3MANAGER_OIDC_CLIENT_ID",
        "S3MANAGER_OIDC_CLIENT_SECRET",
        "S3MANAGER_OIDC_ISSUER",
        "S3MANAGER_OIDC_TENANT_ID",
        "S3MANAGER_OIDC_SCOPES",
        "S3MANAGER_DEFAULT_ROLE",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn env_bool_parsing() {
        std::env::set_var("S3MANAGER_TEST_BOOL", "YES");
        assert!(env_bool("S3MANAGER_TEST_BOOL", false));
        std::env::set_var("S3MANAGER_TEST_BOOL", "off");
        assert!(!env_bool("S3MANAGER_TEST_BOOL", true));
        std::env::remove_var("S3MANAGER_TEST_BOOL");
        assert!(env_bool("S3MANAGER_TEST_BOOL", true));
    }

    #[test]
    #[serial]
    fn load_from_env_keycloak() {
        clear_env();
        std::env::set_var("S3MANAGER_PORT", "9090");
        std::env::set_var("S3MANAGER_OIDC_PROVIDER", "keycloak");
        std::env::set_var("S3MANAGER_OIDC_CLIENT_ID", "s3-manager");
        std::env::set_var("S3MANAGER_OIDC_ISSUER", "https://sso.example.com/realms/corp");
        std::env::set_var("S3MANAGER_OIDC_SCOPES", "openid, email");
        std::env::set_var("S3MANAGER_SWEEP_INTERVAL", "60");
        std::env::set_var("S3MANAGER_PIM_ENABLED", "true");

        let config = load_from_env().unwrap();
        clear_env();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.sweep_interval_secs, Some(60));
        assert!(config.server.pim_enabled);
        let oidc = config.oidc.unwrap();
        assert_eq!(oidc.provider, ProviderKind::Keycloak);
        assert_eq!(oidc.scopes, vec!["openid", "email"]);
    }

    #[test]
    #[serial]
    fn load_from_env_requires_client_id() {
        clear_env();
        assert!(matches!(load_from_env(), Err(S3ManagerError::Config(_))));
    }

    #[test]
    #[serial]
    fn load_from_env_local_dev_mode_needs_no_provider() {
        clear_env();
        std::env::set_var("S3MANAGER_LOCAL_DEV_MODE", "true");

        let config = load_from_env().unwrap();
        clear_env();

        assert!(config.server.local_dev_mode);
        assert!(config.oidc.is_none());
    }

    #[test]
    #[serial]
    fn load_from_env_rejects_bad_values() {
        clear_env();
        std::env::set_var("S3MANAGER_OIDC_CLIENT_ID", "client");
        std::env::set_var("S3MANAGER_OIDC_PROVIDER", "okta");
        let err = load_from_env().unwrap_err();
        assert!(err.to_string().contains("Supported providers"));

        std::env::set_var("S3MANAGER_OIDC_PROVIDER", "google");
        std::env::set_var("S3MANAGER_PORT", "not-a-port");
        assert!(matches!(load_from_env(), Err(S3ManagerError::Config(_))));
        clear_env();
    }

    #[test]
    fn load_from_file_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8443
cookie_secure = true

[oidc]
provider = "azuread"
client_id = "app"
tenant_id = "contoso"

[roles]
default_role = "S3-Editor"
"#
        )
        .unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.server.port, 8443);
        assert!(config.server.cookie_secure);
        assert_eq!(config.oidc.unwrap().provider, ProviderKind::Azure);
        assert_eq!(config.roles.default_role, "S3-Editor");
        assert_eq!(config.roles.role_permissions.len(), 3);
    }

    #[test]
    fn load_from_file_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{ "server": {{ "local_dev_mode": true, "session_lifetime_secs": 120 }} }}"#
        )
        .unwrap();

        let config = load_from_file(Some(file.path().to_path_buf())).unwrap();
        assert!(config.server.local_dev_mode);
        assert_eq!(config.server.session_lifetime_secs, 120);
    }

    #[test]
    fn load_from_file_validates() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[oidc]\nprovider = \"keycloak\"\nclient_id = \"app\"").unwrap();

        let err = load_from_file(Some(file.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("oidc.issuer"));
    }

    #[test]
    fn load_from_file_missing_or_unknown_format() {
        let missing = load_from_file(Some(PathBuf::from("/nonexistent/s3manager.toml")));
        assert!(matches!(missing, Err(S3ManagerError::Config(_))));

        let file = NamedTempFile::new().unwrap();
        let yaml = file.path().with_extension("yaml");
        assert!(parse_config("a: 1", &yaml).is_err());
    }
}
