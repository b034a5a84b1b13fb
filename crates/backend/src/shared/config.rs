use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub google: GoogleConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GoogleConfig {
    /// Target spreadsheet identifier
    pub sheet_id: String,
    /// Path to the service account key JSON (local development);
    /// GOOGLE_SERVICE_ACCOUNT_JSON takes precedence when set
    pub service_account_file: Option<String>,
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
port = 8000

[google]
sheet_id = ""
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
///
/// Environment variables override file values: PORT, GOOGLE_SHEET_ID,
/// GOOGLE_SERVICE_ACCOUNT_FILE (deployment setups configure through env).
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = load_config_file()?;

    if let Ok(port) = std::env::var("PORT") {
        config.server.port = port
            .parse()
            .with_context(|| format!("Invalid PORT value: {}", port))?;
    }
    if let Ok(sheet_id) = std::env::var("GOOGLE_SHEET_ID") {
        config.google.sheet_id = sheet_id;
    }
    if let Ok(path) = std::env::var("GOOGLE_SERVICE_ACCOUNT_FILE") {
        config.google.service_account_file = Some(path);
    }

    Ok(config)
}

fn load_config_file() -> anyhow::Result<Config> {
    // Try to find config.toml next to the executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    // Fall back to default config
    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.google.sheet_id, "");
        assert!(config.google.service_account_file.is_none());
    }

    #[test]
    fn test_full_config_parses() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9000

            [google]
            sheet_id = "1zv1Ww6ad8Qb"
            service_account_file = "service-account.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.google.sheet_id, "1zv1Ww6ad8Qb");
        assert_eq!(
            config.google.service_account_file.as_deref(),
            Some("service-account.json")
        );
    }
}
