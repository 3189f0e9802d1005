//! Startup initialization for blog-service
//!
//! Shared by the server and the admin binary:
//!
//! ```text
//! Phase 1: Configure   logging from the environment
//! Phase 2: Connect     store (PostgreSQL or in-memory) and page cache
//! Phase 3: Assemble    AppState for create_app
//! ```

use anyhow::Context as _;
use crypto_core::jwt::JwtKeys;
use db_pool::{create_pool, DbConfig, PoolStats};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::app::AppState;
use crate::cache::{MemoryPageCache, PageCache, RedisPageCache};
use crate::config::{CacheBackend, Config, SiteSettings, StorageBackend, SERVICE_NAME};
use crate::db::{BlogStore, MemoryBlogStore, PgBlogStore};
use crate::media::MediaStorage;
use crate::templates::Templates;

// ============================================================================
// PHASE 1: Logging
// ============================================================================

/// Initialize logging; `LOG_FORMAT=json` switches to JSON lines.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

// ============================================================================
// PHASE 2: Connections
// ============================================================================

/// Open the configured store, applying migrations when enabled.
pub async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn BlogStore>> {
    match config.database.backend {
        StorageBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryBlogStore::new()))
        }
        StorageBackend::Postgres => {
            let db_config = DbConfig::from_env(SERVICE_NAME, &config.database.url);
            db_config.log_config();
            let pool = create_pool(db_config)
                .await
                .context("failed to create database pool")?;

            let store = PgBlogStore::new(pool);
            if config.database.run_migrations {
                store
                    .migrate()
                    .await
                    .context("failed to run database migrations")?;
            }
            let stats = PoolStats::of(store.pool());
            info!(
                open = stats.open,
                max = stats.max,
                "Connected to PostgreSQL via db-pool"
            );
            Ok(Arc::new(store))
        }
    }
}

/// Open the configured page cache.
pub async fn connect_cache(config: &Config) -> anyhow::Result<Arc<dyn PageCache>> {
    let ttl = Duration::from_secs(config.cache.index_ttl_secs);
    match config.cache.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryPageCache::new(ttl))),
        CacheBackend::Redis => {
            let cache = RedisPageCache::connect(&config.cache.redis_url, ttl)
                .await
                .context("failed to connect to Redis")?;
            info!(ttl_secs = ttl.as_secs(), "Page cache backed by Redis");
            Ok(Arc::new(cache))
        }
    }
}

// ============================================================================
// PHASE 3: Application state
// ============================================================================

pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let store = connect_store(config).await?;
    let cache = connect_cache(config).await?;
    let templates = Templates::new().context("failed to parse templates")?;

    Ok(AppState {
        store,
        cache,
        keys: Arc::new(JwtKeys::from_secret(
            config.auth.jwt_secret.as_bytes(),
            config.auth.access_token_ttl_secs,
        )),
        templates: Arc::new(templates),
        media: Arc::new(MediaStorage::new(config.media.root.clone())),
        settings: Arc::new(SiteSettings::from(config)),
    })
}
