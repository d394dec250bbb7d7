use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub whatsapp: WhatsappConfig,
    pub backend: BackendConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct WhatsappConfig {
    pub api_base_url: String,
    pub phone_number_id: String,
    pub token: SecretString,
}

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub whatsapp_token: Option<String>,
    pub whatsapp_phone_number_id: Option<String>,
    pub backend_base_url: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            whatsapp: WhatsappConfig {
                api_base_url: "https://graph.facebook.com/v19.0".to_string(),
                phone_number_id: String::new(),
                token: String::new().into(),
            },
            backend: BackendConfig {
                base_url: "http://localhost:3000".to_string(),
                api_key: None,
                timeout_secs: 15,
            },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 20,
            },
            server: ServerConfig { bind_address: "0.0.0.0".to_string(), port: 8080 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    whatsapp: Option<WhatsappPatch>,
    backend: Option<BackendPatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct WhatsappPatch {
    api_base_url: Option<String>,
    phone_number_id: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BackendPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("tiendy.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(whatsapp) = patch.whatsapp {
            if let Some(api_base_url) = whatsapp.api_base_url {
                self.whatsapp.api_base_url = api_base_url;
            }
            if let Some(phone_number_id) = whatsapp.phone_number_id {
                self.whatsapp.phone_number_id = phone_number_id;
            }
            if let Some(token) = whatsapp.token {
                self.whatsapp.token = token.into();
            }
        }
        if let Some(backend) = patch.backend {
            if let Some(base_url) = backend.base_url {
                self.backend.base_url = base_url;
            }
            if let Some(api_key) = backend.api_key {
                self.backend.api_key = Some(api_key.into());
            }
            if let Some(timeout_secs) = backend.timeout_secs {
                self.backend.timeout_secs = timeout_secs;
            }
        }
        if let Some(llm) = patch.llm {
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(api_key.into());
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }
        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(token) = env::var("TIENDY_WHATSAPP_TOKEN") {
            self.whatsapp.token = token.into();
        }
        if let Ok(phone_number_id) = env::var("TIENDY_WHATSAPP_PHONE_NUMBER_ID") {
            self.whatsapp.phone_number_id = phone_number_id;
        }
        if let Ok(base_url) = env::var("TIENDY_BACKEND_URL") {
            self.backend.base_url = base_url;
        }
        if let Ok(api_key) = env::var("TIENDY_BACKEND_API_KEY") {
            self.backend.api_key = Some(api_key.into());
        }
        if let Ok(api_key) = env::var("TIENDY_LLM_API_KEY") {
            self.llm.api_key = Some(api_key.into());
        }
        if let Ok(model) = env::var("TIENDY_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(level) = env::var("TIENDY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("TIENDY_LOG_FORMAT") {
            self.logging.format = format.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "TIENDY_LOG_FORMAT".to_string(),
                value: format,
            })?;
        }
        if let Ok(port) = env::var("TIENDY_SERVER_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "TIENDY_SERVER_PORT".to_string(),
                value: port,
            })?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(token) = overrides.whatsapp_token {
            self.whatsapp.token = token.into();
        }
        if let Some(phone_number_id) = overrides.whatsapp_phone_number_id {
            self.whatsapp.phone_number_id = phone_number_id;
        }
        if let Some(base_url) = overrides.backend_base_url {
            self.backend.base_url = base_url;
        }
        if let Some(base_url) = overrides.llm_base_url {
            self.llm.base_url = base_url;
        }
        if let Some(model) = overrides.llm_model {
            self.llm.model = model;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        use secrecy::ExposeSecret;

        if self.whatsapp.token.expose_secret().is_empty() {
            return Err(ConfigError::Validation(
                "whatsapp.token is required (set TIENDY_WHATSAPP_TOKEN)".to_string(),
            ));
        }
        if self.whatsapp.phone_number_id.is_empty() {
            return Err(ConfigError::Validation(
                "whatsapp.phone_number_id is required".to_string(),
            ));
        }
        if self.backend.base_url.is_empty() {
            return Err(ConfigError::Validation("backend.base_url must not be empty".to_string()));
        }
        if self.backend.timeout_secs == 0 || self.llm.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "collaborator timeouts must be greater than zero".to_string(),
            ));
        }
        if self.llm.model.is_empty() {
            return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    let default = PathBuf::from("tiendy.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

    fn valid_overrides() -> ConfigOverrides {
        ConfigOverrides {
            whatsapp_token: Some("wa-token".to_string()),
            whatsapp_phone_number_id: Some("5511111".to_string()),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn defaults_pass_validation_once_tokens_are_provided() {
        let config = AppConfig::load(LoadOptions {
            overrides: valid_overrides(),
            ..LoadOptions::default()
        })
        .expect("config should load");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.backend.timeout_secs, 15);
    }

    #[test]
    fn missing_whatsapp_token_fails_validation() {
        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                whatsapp_token: Some(String::new()),
                whatsapp_phone_number_id: Some("5511111".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let message = result.err().expect("validation error").to_string();
        assert!(message.contains("whatsapp.token"));
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            require_file: true,
            overrides: valid_overrides(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn log_format_parses_known_values() {
        assert_eq!("json".parse::<LogFormat>().expect("json"), LogFormat::Json);
        assert_eq!(" Pretty ".parse::<LogFormat>().expect("pretty"), LogFormat::Pretty);
        assert!("verbose".parse::<LogFormat>().is_err());
    }
}
