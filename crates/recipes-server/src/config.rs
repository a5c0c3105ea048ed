use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// List cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Redis configuration (cache and sessions)
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        self.validate_storage()?;
        if self.redis.enabled && self.redis.pool_size == 0 {
            return Err("redis.pool_size must be > 0".into());
        }
        if self.auth.jwt_secret.is_empty() {
            return Err("auth.jwt_secret must not be empty (set JWT_SECRET)".into());
        }
        if self.auth.session_cookie.is_empty() {
            return Err("auth.session_cookie must not be empty".into());
        }
        if self.auth.session_ttl_secs == 0 {
            return Err("auth.session_ttl_secs must be > 0".into());
        }
        Ok(())
    }

    /// Checks only what is needed to open the configured store.
    pub fn validate_storage(&self) -> Result<(), String> {
        if self.storage.backend == StorageBackend::Mongo {
            if self.storage.mongo.uri.is_empty() {
                return Err("storage.mongo.uri is required for the mongo backend".into());
            }
            if self.storage.mongo.database.is_empty() {
                return Err("storage.mongo.database is required for the mongo backend".into());
            }
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongo,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub memory: MemoryStorageConfig,
    #[serde(default)]
    pub mongo: MongoStorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MemoryStorageConfig {
    /// JSON array of recipes loaded at startup
    #[serde(default)]
    pub seed_file: Option<String>,
    /// JSON array of accounts, written by `seed-users`
    #[serde(default)]
    pub users_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoStorageConfig {
    #[serde(default = "default_mongo_uri")]
    pub uri: String,
    #[serde(default = "default_mongo_database")]
    pub database: String,
    #[serde(default = "default_mongo_connect_timeout")]
    pub connect_timeout_ms: u64,
}

fn default_mongo_uri() -> String {
    "mongodb://localhost:27017".into()
}
fn default_mongo_database() -> String {
    "demo".into()
}
fn default_mongo_connect_timeout() -> u64 {
    5000
}

impl Default for MongoStorageConfig {
    fn default() -> Self {
        Self {
            uri: default_mongo_uri(),
            database: default_mongo_database(),
            connect_timeout_ms: default_mongo_connect_timeout(),
        }
    }
}

impl MongoStorageConfig {
    pub fn to_mongo_config(&self) -> recipes_db_mongo::MongoConfig {
        recipes_db_mongo::MongoConfig::new(&self.uri, &self.database)
            .with_connect_timeout_ms(self.connect_timeout_ms)
    }
}

/// Cache configuration for the recipe list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Entry lifetime in seconds; 0 keeps entries until the next write
    #[serde(default)]
    pub ttl_secs: u64,
}

fn default_cache_enabled() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: 0,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Enable Redis (gracefully degrades without it)
    #[serde(default)]
    pub enabled: bool,

    /// Redis address; `host:port` is accepted as well as a full `redis://` URL
    #[serde(default = "default_redis_url")]
    pub url: String,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    5000
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_redis_url(),
            password: None,
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

impl RedisConfig {
    /// Connection URL with scheme and password filled in.
    pub fn connection_url(&self) -> String {
        let url = if self.url.contains("://") {
            self.url.clone()
        } else {
            format!("redis://{}", self.url)
        };
        match self.password.as_deref() {
            Some(password) if !password.is_empty() && !url.contains('@') => {
                let (scheme, rest) = url.split_once("://").unwrap_or(("redis", url.as_str()));
                format!("{scheme}://:{password}@{rest}")
            }
            _ => url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret for bearer tokens
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default)]
    pub secure_cookies: bool,
    /// Also return a bearer token from sign-in
    #[serde(default)]
    pub issue_bearer_tokens: bool,
}

fn default_session_cookie() -> String {
    "recipes_api".into()
}
fn default_session_ttl_secs() -> u64 {
    30 * 24 * 60 * 60
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            session_cookie: default_session_cookie(),
            session_ttl_secs: default_session_ttl_secs(),
            secure_cookies: false,
            issue_bearer_tokens: false,
        }
    }
}

impl AuthConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
    use std::env;
    use std::path::PathBuf;

    /// Deployment variables predating the `RECIPES__*` scheme.
    #[derive(Debug, Clone, Default)]
    pub struct LegacyEnv {
        pub mongo_uri: Option<String>,
        pub mongo_database: Option<String>,
        pub redis_uri: Option<String>,
        pub redis_password: Option<String>,
        pub jwt_secret: Option<String>,
        pub port: Option<u16>,
    }

    impl LegacyEnv {
        pub fn from_env() -> Self {
            let var = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());
            Self {
                mongo_uri: var("MONGO_URI"),
                mongo_database: var("MONGO_DATABASE"),
                redis_uri: var("REDIS_URI"),
                redis_password: var("REDIS_PASSWORD"),
                jwt_secret: var("JWT_SECRET"),
                port: var("PORT").and_then(|p| p.parse().ok()),
            }
        }

        fn apply(
            &self,
            builder: ConfigBuilder<DefaultState>,
        ) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
            builder
                .set_override_option("storage.backend", self.mongo_uri.as_ref().map(|_| "mongo"))?
                .set_override_option("storage.mongo.uri", self.mongo_uri.clone())?
                .set_override_option("storage.mongo.database", self.mongo_database.clone())?
                .set_override_option("redis.enabled", self.redis_uri.as_ref().map(|_| true))?
                .set_override_option("redis.url", self.redis_uri.clone())?
                .set_override_option("redis.password", self.redis_password.clone())?
                .set_override_option("auth.jwt_secret", self.jwt_secret.clone())?
                .set_override_option("server.port", self.port.map(i64::from))
        }
    }

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        load_config_with(path, &LegacyEnv::from_env())
    }

    pub fn load_config_with(path: Option<&str>, legacy: &LegacyEnv) -> Result<AppConfig, String> {
        let merged = load_unvalidated(path, legacy)?;
        merged.validate()?;
        Ok(merged)
    }

    /// Layering: file, then `RECIPES__SECTION__KEY` variables, then legacy variables.
    pub fn load_unvalidated(path: Option<&str>, legacy: &LegacyEnv) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or("recipes.toml"));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., RECIPES__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("RECIPES")
                .prefix_separator("__")
                .try_parsing(true)
                .separator("__"),
        );
        builder = legacy
            .apply(builder)
            .map_err(|e| format!("config override error: {e}"))?;
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        cfg.try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret = "eUbP9shywUygMx7u".into();
        cfg
    }

    #[test]
    fn defaults_need_only_a_secret() {
        assert!(AppConfig::default().validate().is_err());
        assert!(valid().validate().is_ok());
        assert_eq!(valid().storage.backend, StorageBackend::Memory);
        assert!(valid().cache.enabled);
        assert_eq!(valid().cache.ttl(), None);
    }

    #[test]
    fn mongo_backend_requires_database() {
        let mut cfg = valid();
        cfg.storage.backend = StorageBackend::Mongo;
        cfg.storage.mongo.database.clear();
        assert!(cfg.validate().unwrap_err().contains("storage.mongo.database"));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut cfg = valid();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn redis_connection_url_normalisation() {
        let mut redis = RedisConfig {
            url: "localhost:6379".into(),
            ..Default::default()
        };
        assert_eq!(redis.connection_url(), "redis://localhost:6379");

        redis.password = Some("s3cret".into());
        assert_eq!(redis.connection_url(), "redis://:s3cret@localhost:6379");

        redis.url = "redis://user:pw@cache:6379/1".into();
        assert_eq!(redis.connection_url(), "redis://user:pw@cache:6379/1");
    }
}
