/// Blog Service Library
///
/// A server-rendered blog: users publish posts (optionally in a group and
/// with an image), comment on posts and follow other authors.
///
/// # Modules
///
/// - `app`: Application state, routing and error pages
/// - `handlers`: HTTP request handlers
/// - `services`: Business logic layer
/// - `db`: Storage trait with PostgreSQL and in-memory implementations
/// - `cache`: Rendered-page cache (in-process or Redis)
/// - `forms`: Form binding and validation
/// - `middleware`: Identity, CSRF and ownership checks
/// - `templates`: HTML rendering
/// - `media`: Uploaded image storage
/// - `pagination`: Page-number pagination
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus metrics
/// - `startup`: Logging, connections and state assembly
pub mod app;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod services;
pub mod startup;
pub mod templates;

pub use app::{create_app, AppState};
pub use config::Config;
pub use error::{AppError, Result};
