use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default, deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub explorer: ExplorerConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Upper bound on request bodies (uploads, JSON payloads). Derived from
    /// `fetch.max_image_bytes` when unset; see `body_limit`.
    #[serde(default)]
    pub max_body_bytes: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_server_port(),
            max_body_bytes: None,
        }
    }
}

impl ServerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured body limit, or one that fits a base64 payload of a
    /// `max_image_bytes` image plus multipart framing.
    pub fn body_limit(&self, max_image_bytes: usize) -> usize {
        self.max_body_bytes
            .unwrap_or_else(|| max_image_bytes / 3 * 4 + 4 + 64 * 1024)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig { path: default_model_path() }
    }
}

/// Bounds for fetching images by URL. One attempt, no retries.
#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExplorerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_explorer_port")]
    pub port: u16,
    #[serde(default = "default_samples_path")]
    pub samples_path: String,
    #[serde(default = "default_gamma_path")]
    pub gamma_path: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        ExplorerConfig {
            host: default_host(),
            port: default_explorer_port(),
            samples_path: default_samples_path(),
            gamma_path: default_gamma_path(),
        }
    }
}

impl ExplorerConfig {
    pub fn get_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_server_port() -> u16 {
    5000
}

fn default_explorer_port() -> u16 {
    8050
}

fn default_model_path() -> String {
    "models/classifier.json".into()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_image_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_samples_path() -> String {
    "data/PorePermDensity.csv".into()
}

fn default_gamma_path() -> String {
    "data/CoreGamma.csv".into()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

/// Loads `configuration/base.yaml`, then the `APP_ENVIRONMENT` overlay, then
/// `PV_*` environment variables (`PV_SERVER__PORT=9000`).
///
/// Missing files are allowed; every setting has a default.
pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("cannot read current directory: {}", e)))?;

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    load_from(&base_path.join("configuration"), environment, None)
}

/// Builds the layered configuration from an explicit directory.
///
/// `vars` replaces the process environment when given.
pub fn load_from(
    configuration_directory: &Path,
    environment: Environment,
    vars: Option<HashMap<String, String>>,
) -> Result<Config, config::ConfigError> {
    let config = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(
            config::File::from(configuration_directory.join(format!("{}.yaml", environment.as_str())))
                .required(false),
        )
        .add_source(
            config::Environment::with_prefix("PV")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(vars),
        )
        .build()?;

    config.try_deserialize::<Config>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_dir() -> std::path::PathBuf {
        std::env::temp_dir().join("plug-vision-no-such-configuration")
    }

    #[test]
    fn defaults_apply_without_files() {
        let config = load_from(&empty_dir(), Environment::Local, Some(HashMap::new())).unwrap();
        assert_eq!(config.server.get_address(), "127.0.0.1:5000");
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.model.path, "models/classifier.json");
        assert_eq!(config.fetch.timeout_secs, 10);
        assert_eq!(config.fetch.max_image_bytes, 10 * 1024 * 1024);
        assert_eq!(config.server.max_body_bytes, None);
        assert!(config.server.body_limit(config.fetch.max_image_bytes) > config.fetch.max_image_bytes);
        assert_eq!(config.explorer.get_address(), "127.0.0.1:8050");
    }

    #[test]
    fn environment_variables_override() {
        let vars = HashMap::from([
            ("PV_SERVER__PORT".to_string(), "9000".to_string()),
            ("PV_LOG_LEVEL".to_string(), "debug".to_string()),
            ("PV_FETCH__TIMEOUT_SECS".to_string(), "3".to_string()),
        ]);
        let config = load_from(&empty_dir(), Environment::Production, Some(vars)).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.fetch.timeout_secs, 3);
    }

    #[test]
    fn body_limit_follows_the_image_limit_unless_set() {
        let vars = HashMap::from([("PV_FETCH__MAX_IMAGE_BYTES".to_string(), "30000000".to_string())]);
        let config = load_from(&empty_dir(), Environment::Local, Some(vars)).unwrap();
        let limit = config.server.body_limit(config.fetch.max_image_bytes);
        // A base64 payload of a maximal image still fits.
        assert!(limit >= 30_000_000 / 3 * 4 + 4);

        let vars = HashMap::from([
            ("PV_FETCH__MAX_IMAGE_BYTES".to_string(), "30000000".to_string()),
            ("PV_SERVER__MAX_BODY_BYTES".to_string(), "5000".to_string()),
        ]);
        let config = load_from(&empty_dir(), Environment::Local, Some(vars)).unwrap();
        assert_eq!(config.server.body_limit(config.fetch.max_image_bytes), 5000);
    }

    #[test]
    fn yaml_files_are_layered() {
        let dir = std::env::temp_dir().join(format!("plug-vision-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("base.yaml"), "server:\n  port: 7000\nmodel:\n  path: base.json\n").unwrap();
        std::fs::write(dir.join("production.yaml"), "model:\n  path: prod.json\n").unwrap();

        let config = load_from(&dir, Environment::Production, Some(HashMap::new())).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.model.path, "prod.json");
    }

    #[test]
    fn rejects_unknown_log_level() {
        let vars = HashMap::from([("PV_LOG_LEVEL".to_string(), "loud".to_string())]);
        assert!(load_from(&empty_dir(), Environment::Local, Some(vars)).is_err());
    }

    #[test]
    fn parses_environment_names() {
        assert_eq!(Environment::try_from("Production".to_string()), Ok(Environment::Production));
        assert!(Environment::try_from("staging".to_string()).is_err());
    }
}
