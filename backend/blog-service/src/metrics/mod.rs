//! Prometheus metrics for blog-service.
//!
//! Collectors are registered in the default registry; `/metrics` renders them
//! together with the pool gauges from `db-pool`.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

lazy_static! {
    /// Page cache events (hit/miss/error).
    pub static ref PAGE_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "page_cache_events_total",
        "Page cache events segmented by outcome",
        &["event"]
    )
    .expect("failed to register page_cache_events_total");

    /// Successful writes segmented by record kind (post_created, post_updated, comment, follow, unfollow).
    pub static ref CONTENT_WRITES: IntCounterVec = register_int_counter_vec!(
        "content_writes_total",
        "Content writes segmented by kind",
        &["kind"]
    )
    .expect("failed to register content_writes_total");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
