use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub image_store: ImageStoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Session and sign-in settings.
///
/// `base_url` is the explicitly configured public URL; `platform_url` is the
/// one injected by the hosting platform and only consulted after forwarded
/// headers.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub session_secret: String,
    #[serde(default)]
    pub google_client_id: String,
    #[serde(default)]
    pub google_client_secret: String,
    #[serde(default)]
    pub test_bypass_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub platform_url: Option<String>,
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageStoreConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_image_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_sweep_batch")]
    pub sweep_batch: u64,
}

impl Default for ImageStoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            timeout_secs: default_image_timeout(),
            sweep_interval_secs: default_sweep_interval(),
            sweep_batch: default_sweep_batch(),
        }
    }
}

fn default_image_timeout() -> u64 { 15 }
fn default_sweep_interval() -> u64 { 300 }
fn default_sweep_batch() -> u64 { 50 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`); a missing file falls back to
    /// defaults so a pure environment deployment works.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.image_store.normalize_from_env();
        self.image_store.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Some(url) = env_non_empty("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    /// Defaults plus `DATABASE_URL`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.normalize_from_env();
        cfg
    }

    /// `[database]` section of the default config file, env-filled.
    pub fn from_file() -> Result<Self> {
        let mut cfg = load_default()?.database;
        cfg.normalize_from_env();
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.session_secret.trim().is_empty() {
            if let Some(v) = env_non_empty("AUTH_SECRET") { self.session_secret = v; }
        }
        if self.google_client_id.trim().is_empty() {
            if let Some(v) = env_non_empty("AUTH_GOOGLE_ID") { self.google_client_id = v; }
        }
        if self.google_client_secret.trim().is_empty() {
            if let Some(v) = env_non_empty("AUTH_GOOGLE_SECRET") { self.google_client_secret = v; }
        }
        if self.test_bypass_key.is_none() {
            self.test_bypass_key = env_non_empty("TEST_BYPASS_KEY");
        }
        if self.base_url.is_none() {
            self.base_url = env_non_empty("AUTH_URL");
        }
        if self.platform_url.is_none() {
            self.platform_url = env_non_empty("URL");
        }
        // An empty key in the file must not enable the bypass.
        if matches!(self.test_bypass_key.as_deref(), Some(k) if k.trim().is_empty()) {
            self.test_bypass_key = None;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.session_secret.len() < 32 {
            return Err(anyhow!("auth.session_secret must be at least 32 bytes (AUTH_SECRET)"));
        }
        for url in [&self.base_url, &self.platform_url].into_iter().flatten() {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow!("auth base urls must start with http(s): {url}"));
            }
        }
        Ok(())
    }
}

impl ImageStoreConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Some(v) = env_non_empty("IMAGE_STORE_URL") { self.url = v; }
        }
        if self.api_key.trim().is_empty() {
            if let Some(v) = env_non_empty("IMAGE_STORE_API_KEY") { self.api_key = v; }
        }
        self.url = self.url.trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(anyhow!("image_store.url must start with http(s) (IMAGE_STORE_URL)"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("image_store.timeout_secs must be positive"));
        }
        if self.sweep_batch == 0 {
            return Err(anyhow!("image_store.sweep_batch must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn full_config() -> AppConfig {
        let raw = format!(
            r#"
            [server]
            host = ""
            port = 9000

            [database]
            url = "postgres://u:p@localhost:5432/menus"

            [auth]
            session_secret = "{SECRET}"
            test_bypass_key = ""
            base_url = "https://menus.example.com"

            [image_store]
            url = "https://images.example.com/"
            api_key = "k"
            "#
        );
        toml::from_str(&raw).unwrap()
    }

    #[test]
    fn parses_and_normalizes_sections() {
        let mut cfg = full_config();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.image_store.url, "https://images.example.com");
        assert_eq!(cfg.image_store.sweep_interval_secs, 300);
    }

    #[test]
    fn empty_bypass_key_is_disabled() {
        let mut cfg = full_config();
        cfg.auth.normalize_from_env();
        assert!(cfg.auth.test_bypass_key.is_none());
    }

    #[test]
    fn short_session_secret_rejected() {
        let mut cfg = full_config();
        cfg.auth.session_secret = "short".into();
        assert!(cfg.auth.validate().is_err());
    }

    #[test]
    fn database_url_scheme_checked() {
        let cfg = DatabaseConfig { url: "mysql://x".into(), ..DatabaseConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_from_file_reads_toml() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[server]\nhost = \"0.0.0.0\"\nport = 8088").unwrap();
        let cfg = load_from_file(f.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8088);
        assert!(cfg.database.url.is_empty());
    }
}
