/// Blog Service
///
/// Server-rendered blog: public listings (home page, groups, profiles, post
/// pages) and login-only pages for writing posts, commenting and following
/// authors.
///
/// # Routes
///
/// - `/`, `/group/{slug}/`, `/profile/{username}/`, `/posts/{id}/` - listings and posts
/// - `/create/`, `/posts/{id}/edit/`, `/posts/{id}/comment/` - writing
/// - `/follow/`, `/profile/{username}/follow/`, `/profile/{username}/unfollow/` - subscriptions
/// - `/health`, `/health/ready`, `/health/live`, `/metrics` - operations
///
/// # Deployment
///
/// Listens on port 8000 unless `BLOG_SERVICE_PORT` says otherwise.
/// `blog-service healthcheck` probes a running instance for container
/// health checks.
use actix_web::HttpServer;
use blog_service::{create_app, startup, Config};
use std::io;

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn healthcheck() -> io::Result<()> {
    let port = std::env::var("BLOG_SERVICE_PORT").unwrap_or_else(|_| "8000".to_string());
    let url = format!("http://127.0.0.1:{}/health", port);
    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => {
            eprintln!("healthcheck HTTP status: {}", resp.status());
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"))
        }
        Err(e) => {
            eprintln!("healthcheck HTTP error: {}", e);
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        return healthcheck().await;
    }

    dotenvy::dotenv().ok();
    startup::init_logging();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting blog-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let state = match startup::build_state(&config).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Startup failed: {:#}", e);
            eprintln!("ERROR: {:#}", e);
            std::process::exit(1);
        }
    };

    let bind_address = config.bind_address();
    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || create_app(state.clone()))
        .bind(&bind_address)?
        .run();

    let handle = server.handle();
    tokio::select! {
        result = server => result?,
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, stopping HTTP server");
            handle.stop(true).await;
        }
    }

    tracing::info!("blog-service stopped");
    Ok(())
}
