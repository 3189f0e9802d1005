/// Health check handlers
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

use crate::cache::PageCache;
use crate::db::BlogStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct ComponentCheck {
    pub status: ComponentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub status: ComponentStatus,
    pub checks: HashMap<String, ComponentCheck>,
    pub timestamp: String,
}

/// Basic health check: the store answers.
pub async fn health(store: web::Data<dyn BlogStore>) -> HttpResponse {
    match store.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": crate::config::SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unavailable",
                "service": crate::config::SERVICE_NAME,
            }))
        }
    }
}

/// Readiness: the store must answer; a failing cache only degrades the
/// service since pages are then rendered on every request.
pub async fn readiness(
    store: web::Data<dyn BlogStore>,
    cache: web::Data<dyn PageCache>,
) -> HttpResponse {
    let mut checks = HashMap::new();
    let mut ready = true;
    let mut degraded = false;

    let start = Instant::now();
    let store_result = store.ping().await;
    let store_latency = Some(start.elapsed().as_millis() as u64);
    let store_check = match store_result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Store query successful".to_string(),
            latency_ms: store_latency,
        },
        Err(e) => {
            ready = false;
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("Store query failed: {}", e),
                latency_ms: store_latency,
            }
        }
    };
    checks.insert("store".to_string(), store_check);

    let start = Instant::now();
    let cache_result = cache.ping().await;
    let cache_latency = Some(start.elapsed().as_millis() as u64);
    let cache_check = match cache_result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Page cache ping successful".to_string(),
            latency_ms: cache_latency,
        },
        Err(e) => {
            degraded = true;
            ComponentCheck {
                status: ComponentStatus::Degraded,
                message: format!("Page cache ping failed: {}", e),
                latency_ms: cache_latency,
            }
        }
    };
    checks.insert("page_cache".to_string(), cache_check);

    let status = if !ready {
        ComponentStatus::Unhealthy
    } else if degraded {
        ComponentStatus::Degraded
    } else {
        ComponentStatus::Healthy
    };

    let response = ReadinessResponse {
        ready,
        status,
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}
