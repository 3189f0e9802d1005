/// Configuration management for blog-service
///
/// Everything is read from environment variables (optionally seeded from a
/// `.env` file by the binaries). Production deployments must provide a real
/// JWT secret.
use db_pool::env_utils::{env_or, parse_env_flag, parse_env_with_default};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::forms::DEFAULT_MAX_UPLOAD_BYTES;
use crate::pagination::DEFAULT_PER_PAGE;

pub const SERVICE_NAME: &str = "blog-service";
const DEV_JWT_SECRET: &str = "dev-only-secret";

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
    /// Shown in page titles and the header
    pub site_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("Unknown STORAGE_BACKEND '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: String,
    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Redis,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(format!("Unknown CACHE_BACKEND '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: String,
    /// Lifetime of cached index pages
    pub index_ttl_secs: u64,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Where anonymous visitors of login-only views are sent
    pub login_url: String,
    pub access_token_ttl_secs: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("login_url", &self.login_url)
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub root: PathBuf,
    /// Public URL prefix for stored files, always ending in `/`
    pub url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub posts_per_page: u32,
}

/// Request-time settings shared with handlers and templates.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub site_name: String,
    pub login_url: String,
    pub media_url: String,
    pub max_upload_bytes: usize,
    pub posts_per_page: u32,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "Yatube".to_string(),
            login_url: "/auth/login/".to_string(),
            media_url: "/media/".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            posts_per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl From<&Config> for SiteSettings {
    fn from(config: &Config) -> Self {
        Self {
            site_name: config.app.site_name.clone(),
            login_url: config.auth.login_url.clone(),
            media_url: config.media.url.clone(),
            max_upload_bytes: config.media.max_upload_bytes,
            posts_per_page: config.pagination.posts_per_page,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let app_env = env_or("APP_ENV", "development");
        let production = app_env.eq_ignore_ascii_case("production");

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string());
        if production && (jwt_secret.trim().is_empty() || jwt_secret == DEV_JWT_SECRET) {
            return Err("JWT_SECRET must be set to a non-default value in production".to_string());
        }

        let storage_backend: StorageBackend = env_or("STORAGE_BACKEND", "postgres").parse()?;
        if production && storage_backend == StorageBackend::Memory {
            return Err("STORAGE_BACKEND=memory is not allowed in production".to_string());
        }

        let mut media_url = env_or("MEDIA_URL", "/media/");
        if !media_url.ends_with('/') {
            media_url.push('/');
        }

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: env_or("BLOG_SERVICE_HOST", "0.0.0.0"),
                port: parse_env_with_default("BLOG_SERVICE_PORT", 8000),
                site_name: env_or("SITE_NAME", "Yatube"),
            },
            database: DatabaseConfig {
                backend: storage_backend,
                url: env_or("DATABASE_URL", "postgres://localhost/yatube"),
                run_migrations: parse_env_flag("DATABASE_RUN_MIGRATIONS", true),
            },
            cache: CacheConfig {
                backend: env_or("CACHE_BACKEND", "memory").parse()?,
                redis_url: env_or("REDIS_URL", "redis://localhost:6379"),
                index_ttl_secs: parse_env_with_default("INDEX_CACHE_TTL_SECS", 20),
            },
            auth: AuthConfig {
                jwt_secret,
                login_url: env_or("LOGIN_URL", "/auth/login/"),
                access_token_ttl_secs: parse_env_with_default("ACCESS_TOKEN_TTL_SECS", 3600),
            },
            media: MediaConfig {
                root: PathBuf::from(env_or("MEDIA_ROOT", "media")),
                url: media_url,
                max_upload_bytes: parse_env_with_default(
                    "MAX_UPLOAD_BYTES",
                    DEFAULT_MAX_UPLOAD_BYTES,
                ),
            },
            pagination: PaginationConfig {
                posts_per_page: parse_env_with_default("POSTS_PER_PAGE", DEFAULT_PER_PAGE).max(1),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}
