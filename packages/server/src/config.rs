use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deadline applied to every inbound request, outbound calls included.
    pub request_timeout_secs: u64,
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub log_level: String,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub log_queries: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HS512 secret shared with the token issuer.
    pub jwt_secret: String,
    /// Role that may see pending listings and approve or reject them.
    pub moderator_role: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory of the photo blob store.
    pub path: String,
    pub max_photo_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    /// Base URL of the owner directory; the owner id is appended as a path segment.
    pub owner_lookup_url: String,
    /// Base URL of the device registry; the device id is appended as a path segment.
    pub device_lookup_url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub identity: IdentityConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8083)?
            .set_default("server.request_timeout_secs", 30)?
            .set_default("server.log_level", "info")?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 2)?
            .set_default("database.log_queries", false)?
            .set_default("auth.moderator_role", "ADMIN")?
            .set_default("storage.path", "./data/photos")?
            .set_default("storage.max_photo_size", 10 * 1024 * 1024)?
            .set_default("identity.owner_lookup_url", "http://localhost:8080/api/users")?
            .set_default(
                "identity.device_lookup_url",
                "http://localhost:8081/api/devices",
            )?
            .set_default("identity.timeout_ms", 5000)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., LISTING__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("LISTING")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
