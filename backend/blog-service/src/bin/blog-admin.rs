//! Administrative commands for blog-service.
//!
//! Reads the same environment as the server.

use std::env;

use anyhow::{bail, Context};
use blog_service::cache::PageCache;
use blog_service::config::{CacheBackend, StorageBackend, SERVICE_NAME};
use blog_service::db::{BlogStore, PgBlogStore};
use blog_service::{startup, Config};
use crypto_core::jwt::JwtKeys;
use db_pool::{create_pool, DbConfig};

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  blog-admin migrate");
    eprintln!("  blog-admin create-user <username> [full name]");
    eprintln!("  blog-admin create-group <slug> <title> [description]");
    eprintln!("  blog-admin issue-token <username>");
    eprintln!("  blog-admin clear-cache");
    std::process::exit(1);
}

/// Writes to an in-memory store vanish with this process.
fn require_shared_store(config: &Config, command: &str) -> anyhow::Result<()> {
    if config.database.backend == StorageBackend::Memory {
        bail!("{} requires STORAGE_BACKEND=postgres", command);
    }
    Ok(())
}

/// The in-memory cache lives inside the server process.
fn require_shared_cache(config: &Config, command: &str) -> anyhow::Result<()> {
    if config.cache.backend == CacheBackend::Memory {
        bail!("{} requires CACHE_BACKEND=redis", command);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    startup::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }
    let config = Config::from_env().map_err(anyhow::Error::msg)?;

    match args[1].as_str() {
        "migrate" if args.len() == 2 => {
            require_shared_store(&config, "migrate")?;
            let pool = create_pool(DbConfig::from_env(SERVICE_NAME, &config.database.url))
                .await
                .context("failed to create database pool")?;
            PgBlogStore::new(pool).migrate().await?;
            println!("Migrations applied");
        }
        "create-user" if (3..=4).contains(&args.len()) => {
            require_shared_store(&config, "create-user")?;
            let store = startup::connect_store(&config).await?;
            let full_name = args.get(3).map(String::as_str).unwrap_or_default();
            let user = store.create_user(&args[2], full_name).await?;
            println!("Created user {} (id {})", user.username, user.id);
        }
        "create-group" if (4..=5).contains(&args.len()) => {
            require_shared_store(&config, "create-group")?;
            let store = startup::connect_store(&config).await?;
            let description = args.get(4).map(String::as_str).unwrap_or_default();
            let group = store.create_group(&args[2], &args[3], description).await?;
            println!("Created group {} (id {})", group.slug, group.id);
        }
        "issue-token" if args.len() == 3 => {
            require_shared_store(&config, "issue-token")?;
            let store = startup::connect_store(&config).await?;
            let user = store
                .find_user_by_username(&args[2])
                .await?
                .with_context(|| format!("no user named {}", args[2]))?;
            let keys = JwtKeys::from_secret(
                config.auth.jwt_secret.as_bytes(),
                config.auth.access_token_ttl_secs,
            );
            println!("{}", keys.issue_access_token(user.id, &user.username)?);
        }
        "clear-cache" if args.len() == 2 => {
            require_shared_cache(&config, "clear-cache")?;
            let cache = startup::connect_cache(&config).await?;
            cache.clear().await?;
            println!("Page cache cleared");
        }
        _ => usage(),
    }

    Ok(())
}
