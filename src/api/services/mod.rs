pub mod analytics;
pub mod cache;
pub mod health;
pub mod links;
pub mod redirect;

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};

pub use analytics::AnalyticsService;
pub use cache::CacheService;
pub use health::{AppStartTime, HealthService, health_routes};
pub use links::LinkRoutes;
pub use redirect::{RedirectService, TrustedProxies};

use crate::api::helpers::error_response;
use crate::api::types::ErrorCode;

/// Upper bound for request bodies, JSON or raw
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// `/api/*` statistics and cache management
pub fn api_routes() -> actix_web::Scope {
    web::scope("/api")
        .route("/analytics", web::get().to(AnalyticsService::list))
        .route("/analytics/{code}", web::get().to(AnalyticsService::for_code))
        .route("/cache-stats", web::get().to(CacheService::stats))
        .route("/cache-clear", web::post().to(CacheService::clear))
        .route(
            "/rate-limit-stats",
            web::get().to(AnalyticsService::rate_limit_stats),
        )
}

/// Shorten, info and the catch-all `/{code}`; register last.
pub fn link_routes() -> actix_web::Scope {
    web::scope("")
        .route("/shorten", web::post().to(LinkRoutes::shorten))
        .route("/info/{code}", web::get().to(LinkRoutes::info))
        .route("/{code}", web::get().to(RedirectService::handle_redirect))
        .route("/{code}", web::delete().to(RedirectService::handle_delete))
}

/// Malformed or oversized JSON bodies answer with the usual envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_BODY_BYTES)
        .error_handler(|err, _req| {
            let status = match err {
                JsonPayloadError::Overflow { .. }
                | JsonPayloadError::OverflowKnownLength { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            let response: HttpResponse =
                error_response(status, ErrorCode::BadRequest, &err.to_string());
            InternalError::from_response(err, response).into()
        })
}

/// Registers every route; shared by the server and the API tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(health_routes())
        .service(api_routes())
        .service(link_routes());
}
