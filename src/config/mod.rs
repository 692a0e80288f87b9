//! Configuration management.
//!
//! Configuration is resolved once at startup: built-in defaults, then an
//! optional TOML file, then environment variables (a `.env` file in the
//! working directory is loaded first). The resulting [`FlowtionConfig`] is
//! immutable and handed to each component explicitly.

use crate::models::ModelPreference;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Minimum accepted length for a configured JWT secret.
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Main configuration for flowtion.
#[derive(Debug, Clone)]
pub struct FlowtionConfig {
    /// Path to the data directory.
    pub data_dir: PathBuf,
    /// Explicit database path; defaults to `<data_dir>/flowtion.db`.
    pub database_path: Option<PathBuf>,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Token and password settings.
    pub auth: AuthConfig,
    /// LLM backend settings.
    pub llm: LlmConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
    /// Placement engine settings.
    pub placement: PlacementConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin.
    pub cors_origins: Vec<String>,
    /// Whether `/metrics` is served.
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8001,
            cors_origins: Vec::new(),
            metrics_enabled: true,
        }
    }
}

/// Token and password settings.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for HS256 tokens. `None` means an ephemeral secret is generated.
    pub jwt_secret: Option<String>,
    /// Token lifetime in hours.
    pub token_ttl_hours: i64,
    /// PBKDF2 iteration count for new password hashes.
    pub password_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: 24 * 7,
            password_iterations: 100_000,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("password_iterations", &self.password_iterations)
            .finish()
    }
}

/// Connection settings for one hosted model.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// API key; the backend is disabled when absent.
    pub api_key: Option<String>,
    /// Model name sent with each request.
    pub model: String,
    /// API base URL.
    pub base_url: String,
}

impl BackendConfig {
    fn new(model: &str, base_url: &str) -> Self {
        Self {
            api_key: None,
            model: model.to_string(),
            base_url: base_url.to_string(),
        }
    }

    /// Returns true when an API key is present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// LLM backend settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model used by writing assist and insights when the caller has no preference.
    pub default_model: ModelPreference,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Nous Hermes (OpenAI-compatible).
    pub hermes: BackendConfig,
    /// `OpenAI`.
    pub openai: BackendConfig,
    /// Anthropic.
    pub anthropic: BackendConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_model: ModelPreference::Openai,
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
            hermes: BackendConfig::new("Hermes-4-70B", "https://inference-api.nousresearch.com/v1"),
            openai: BackendConfig::new("gpt-4o", "https://api.openai.com/v1"),
            anthropic: BackendConfig::new("claude-sonnet-4-20250514", "https://api.anthropic.com/v1"),
        }
    }
}

impl LlmConfig {
    /// Returns the settings for one backend.
    #[must_use]
    pub const fn backend(&self, preference: ModelPreference) -> &BackendConfig {
        match preference {
            ModelPreference::Hermes => &self.hermes,
            ModelPreference::Openai => &self.openai,
            ModelPreference::Claude => &self.anthropic,
        }
    }

    /// Returns true when at least one backend has credentials.
    #[must_use]
    pub fn any_configured(&self) -> bool {
        ModelPreference::FALLBACK_ORDER
            .iter()
            .any(|p| self.backend(*p).is_configured())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name, defaulting to pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "flowtion=info,tower_http=info".to_string(),
        }
    }
}

/// Placement engine settings.
#[derive(Debug, Clone, Copy)]
pub struct PlacementConfig {
    /// Maximum distance from the center for any new node.
    pub max_radius: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self { max_radius: 420.0 }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Database path.
    pub database_path: Option<String>,
    /// Server section.
    pub server: Option<ConfigFileServer>,
    /// Auth section.
    pub auth: Option<ConfigFileAuth>,
    /// LLM section.
    pub llm: Option<ConfigFileLlm>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
    /// Placement section.
    pub placement: Option<ConfigFilePlacement>,
}

/// Server section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileServer {
    /// Bind address.
    pub host: Option<String>,
    /// Bind port.
    pub port: Option<u16>,
    /// Allowed CORS origins.
    pub cors_origins: Option<Vec<String>>,
    /// Serve `/metrics`.
    pub metrics_enabled: Option<bool>,
}

/// Auth section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileAuth {
    /// JWT secret.
    pub jwt_secret: Option<String>,
    /// Token lifetime in hours.
    pub token_ttl_hours: Option<i64>,
    /// PBKDF2 iterations.
    pub password_iterations: Option<u32>,
}

/// One backend inside the LLM section.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileBackend {
    /// API key.
    pub api_key: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// Base URL.
    pub base_url: Option<String>,
}

/// LLM section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLlm {
    /// Default model preference.
    pub default_model: Option<String>,
    /// Request timeout.
    pub timeout_ms: Option<u64>,
    /// Connect timeout.
    pub connect_timeout_ms: Option<u64>,
    /// Hermes backend.
    pub hermes: Option<ConfigFileBackend>,
    /// `OpenAI` backend.
    pub openai: Option<ConfigFileBackend>,
    /// Anthropic backend.
    pub anthropic: Option<ConfigFileBackend>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directive.
    pub filter: Option<String>,
}

/// Placement section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFilePlacement {
    /// Maximum radius.
    pub max_radius: Option<f64>,
}

impl Default for FlowtionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".flowtion"),
            database_path: None,
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            llm: LlmConfig::default(),
            logging: LoggingConfig::default(),
            placement: PlacementConfig::default(),
        }
    }
}

impl FlowtionConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Self::from_toml_str(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for [`ConfigFile`].
    pub fn from_toml_str(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir, then `~/.config/flowtion/config.toml`.
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("flowtion").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("flowtion")
                .join("config.toml"),
        ];

        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(&path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file"),
            }
        }

        Self::default()
    }

    /// Resolves the full configuration: file (explicit or default), `.env`, then environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit config file cannot be loaded or the result is invalid.
    pub fn resolve(explicit_path: Option<&Path>) -> crate::Result<Self> {
        let _ = dotenvy::dotenv();
        let base = match explicit_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Converts a `ConfigFile` to `FlowtionConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(path) = file.database_path {
            config.database_path = Some(PathBuf::from(path));
        }
        if let Some(server) = file.server {
            if let Some(host) = server.host {
                config.server.host = host;
            }
            if let Some(port) = server.port {
                config.server.port = port;
            }
            if let Some(origins) = server.cors_origins {
                config.server.cors_origins = origins;
            }
            if let Some(enabled) = server.metrics_enabled {
                config.server.metrics_enabled = enabled;
            }
        }
        if let Some(auth) = file.auth {
            if auth.jwt_secret.is_some() {
                config.auth.jwt_secret = auth.jwt_secret;
            }
            if let Some(ttl) = auth.token_ttl_hours {
                config.auth.token_ttl_hours = ttl;
            }
            if let Some(iterations) = auth.password_iterations {
                config.auth.password_iterations = iterations;
            }
        }
        if let Some(llm) = file.llm {
            if let Some(pref) = llm.default_model.as_deref().and_then(ModelPreference::parse) {
                config.llm.default_model = pref;
            }
            if let Some(timeout_ms) = llm.timeout_ms {
                config.llm.timeout_ms = timeout_ms;
            }
            if let Some(connect_timeout_ms) = llm.connect_timeout_ms {
                config.llm.connect_timeout_ms = connect_timeout_ms;
            }
            merge_backend(&mut config.llm.hermes, llm.hermes);
            merge_backend(&mut config.llm.openai, llm.openai);
            merge_backend(&mut config.llm.anthropic, llm.anthropic);
        }
        if let Some(logging) = file.logging {
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format);
            }
            if let Some(filter) = logging.filter {
                config.logging.filter = filter;
            }
        }
        if let Some(placement) = file.placement {
            if let Some(max_radius) = placement.max_radius {
                config.placement.max_radius = max_radius;
            }
        }

        config
    }

    /// Applies overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("FLOWTION_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("FLOWTION_DB_PATH") {
            self.database_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("FLOWTION_HOST") {
            self.server.host = v;
        }
        if let Some(port) = get("FLOWTION_PORT").and_then(|v| v.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(v) = get("FLOWTION_CORS_ORIGINS") {
            self.server.cors_origins = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty() && *s != "*")
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = get("FLOWTION_JWT_SECRET") {
            self.auth.jwt_secret = Some(v);
        }
        if let Some(v) = get("NOUS_API_KEY") {
            self.llm.hermes.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.llm.openai.api_key = Some(v);
        }
        if let Some(v) = get("ANTHROPIC_API_KEY") {
            self.llm.anthropic.api_key = Some(v);
        }
        if let Some(pref) = get("FLOWTION_DEFAULT_MODEL").and_then(|v| ModelPreference::parse(&v)) {
            self.llm.default_model = pref;
        }
        if let Some(ms) = get("FLOWTION_LLM_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok()) {
            self.llm.timeout_ms = ms;
        }
        if let Some(ms) = get("FLOWTION_LLM_CONNECT_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok())
        {
            self.llm.connect_timeout_ms = ms;
        }
        if let Some(v) = get("FLOWTION_LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&v);
        }

        self
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] for a too-short JWT secret, a
    /// non-positive token lifetime, or a non-positive placement radius.
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(secret) = &self.auth.jwt_secret {
            if secret.len() < MIN_JWT_SECRET_LENGTH {
                return Err(crate::Error::InvalidInput(format!(
                    "JWT secret must be at least {MIN_JWT_SECRET_LENGTH} characters"
                )));
            }
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(crate::Error::InvalidInput(
                "token_ttl_hours must be positive".to_string(),
            ));
        }
        if self.auth.password_iterations == 0 {
            return Err(crate::Error::InvalidInput(
                "password_iterations must be positive".to_string(),
            ));
        }
        if !(self.placement.max_radius.is_finite() && self.placement.max_radius > 0.0) {
            return Err(crate::Error::InvalidInput(
                "placement.max_radius must be a positive number".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the database file path.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("flowtion.db"))
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the JWT secret.
    #[must_use]
    pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.auth.jwt_secret = Some(secret.into());
        self
    }

    /// Sets the PBKDF2 iteration count.
    #[must_use]
    pub const fn with_password_iterations(mut self, iterations: u32) -> Self {
        self.auth.password_iterations = iterations;
        self
    }
}

fn merge_backend(target: &mut BackendConfig, file: Option<ConfigFileBackend>) {
    let Some(file) = file else {
        return;
    };
    if file.api_key.is_some() {
        target.api_key = file.api_key;
    }
    if let Some(model) = file.model {
        target.model = model;
    }
    if let Some(base_url) = file.base_url {
        target.base_url = base_url;
    }
}
