use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, trace};

use crate::services::LinkService;

// 应用启动时间
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: DateTime<Utc>,
}

impl AppStartTime {
    pub fn now() -> Self {
        Self {
            start_datetime: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub backend: Option<String>,
    pub total_urls: Option<u64>,
    pub cache_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub response_time_ms: u64,
}

/// Health probes. Never rate limited.
pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        service: web::Data<Arc<LinkService>>,
        start_time: Option<web::Data<AppStartTime>>,
    ) -> impl Responder {
        let started = Instant::now();
        trace!("Received health check request");

        let now = Utc::now();
        let uptime = start_time
            .map(|t| (now - t.start_datetime).num_seconds().max(0) as u64)
            .unwrap_or(0);

        // 只查 count，5 秒超时
        let report = tokio::time::timeout(Duration::from_secs(5), service.health()).await;

        let (status_code, body) = match report {
            Ok(Ok(report)) => (
                StatusCode::OK,
                HealthResponse {
                    status: report.status,
                    timestamp: now,
                    uptime,
                    backend: Some(report.backend),
                    total_urls: Some(report.total_urls),
                    cache_size: Some(report.cache_size),
                    error: None,
                    response_time_ms: started.elapsed().as_millis() as u64,
                },
            ),
            Ok(Err(e)) => {
                error!("Storage health check failed: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, Self::unhealthy(now, uptime, e.message(), started))
            }
            Err(_) => {
                error!("Storage health check timeout");
                (StatusCode::SERVICE_UNAVAILABLE, Self::unhealthy(now, uptime, "timeout", started))
            }
        };

        HttpResponse::build(status_code).json(body)
    }

    fn unhealthy(now: DateTime<Utc>, uptime: u64, error: &str, started: Instant) -> HealthResponse {
        HealthResponse {
            status: "unhealthy",
            timestamp: now,
            uptime,
            backend: None,
            total_urls: None,
            cache_size: None,
            error: Some(error.to_string()),
            response_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    pub async fn readiness_check() -> impl Responder {
        HttpResponse::Ok()
            .append_header(("Content-Type", "text/plain"))
            .body("OK")
    }

    pub async fn liveness_check() -> impl Responder {
        HttpResponse::NoContent().finish()
    }
}

pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
        .route("/live", web::get().to(HealthService::liveness_check))
}
