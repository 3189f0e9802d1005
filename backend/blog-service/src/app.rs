/// Application assembly
///
/// [`AppState`] holds the shared resources built once at startup;
/// [`create_app`] wires them into an actix `App` with the routes, the
/// identity middleware and the HTML error pages. The server binary and the
/// integration tests both go through `create_app`.
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderValue, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{web, App, HttpResponse};
use crypto_core::jwt::JwtKeys;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use crate::cache::PageCache;
use crate::config::SiteSettings;
use crate::db::BlogStore;
use crate::handlers;
use crate::media::MediaStorage;
use crate::metrics::serve_metrics;
use crate::middleware::IdentifyUser;
use crate::templates::{Templates, CSRF_FAILURE_PAGE, NOT_FOUND_PAGE, SERVER_ERROR_PAGE};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlogStore>,
    pub cache: Arc<dyn PageCache>,
    pub keys: Arc<JwtKeys>,
    pub templates: Arc<Templates>,
    pub media: Arc<MediaStorage>,
    pub settings: Arc<SiteSettings>,
}

pub fn create_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let error_pages = ErrorHandlers::new()
        .handler(StatusCode::NOT_FOUND, not_found_page)
        .handler(StatusCode::FORBIDDEN, csrf_failure_page)
        .handler(StatusCode::INTERNAL_SERVER_ERROR, server_error_page);

    App::new()
        .app_data(web::Data::from(state.store.clone()))
        .app_data(web::Data::from(state.cache.clone()))
        .app_data(web::Data::from(state.templates.clone()))
        .app_data(web::Data::from(state.media.clone()))
        .app_data(web::Data::from(state.settings.clone()))
        .wrap(IdentifyUser::new(state.keys.clone()))
        .wrap(error_pages)
        .wrap(TracingLogger::default())
        .configure(configure_routes)
        .default_service(web::to(unknown_route))
}

async fn unknown_route() -> HttpResponse {
    HttpResponse::NotFound().finish()
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(serve_metrics))
        .route("/health", web::get().to(handlers::health))
        .route("/health/ready", web::get().to(handlers::readiness))
        .route("/health/live", web::get().to(handlers::liveness))
        .route("/", web::get().to(handlers::index))
        .route("/follow/", web::get().to(handlers::follow_index))
        .route("/group/{slug}/", web::get().to(handlers::group_posts))
        .service(
            web::resource("/create/")
                .route(web::get().to(handlers::post_create_form))
                .route(web::post().to(handlers::post_create)),
        )
        .route("/profile/{username}/", web::get().to(handlers::profile))
        .route(
            "/profile/{username}/follow/",
            web::get().to(handlers::profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            web::get().to(handlers::profile_unfollow),
        )
        .route("/posts/{post_id}/", web::get().to(handlers::post_detail))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(handlers::post_edit_form))
                .route(web::post().to(handlers::post_edit)),
        )
        .route(
            "/posts/{post_id}/comment/",
            web::post().to(handlers::add_comment),
        );
}

fn not_found_page<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    error_page(res, NOT_FOUND_PAGE)
}

fn csrf_failure_page<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    error_page(res, CSRF_FAILURE_PAGE)
}

fn server_error_page<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    error_page(res, SERVER_ERROR_PAGE)
}

/// Replace the body of an error response with the rendered error template.
fn error_page<B>(
    res: ServiceResponse<B>,
    template: &str,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let body = {
        let req = res.request();
        let templates = req.app_data::<web::Data<Templates>>();
        let settings = req.app_data::<web::Data<SiteSettings>>();
        match (templates, settings) {
            (Some(templates), Some(settings)) => {
                templates.render_error_page(template, settings, req.path())
            }
            _ => res.status().to_string(),
        }
    };

    let (req, res) = res.into_parts();
    let res = res.set_body(body);
    let mut res = ServiceResponse::new(req, res)
        .map_into_boxed_body()
        .map_into_right_body();
    res.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );

    Ok(ErrorHandlerResponse::Response(res))
}
