//! Read-only statistics: per-link analytics, paginated listing, rate limiter

use std::sync::Arc;

use actix_web::{HttpResponse, web};

use crate::api::helpers::{api_result, success_response};
use crate::api::types::AnalyticsQuery;
use crate::services::{DEFAULT_PAGE_SIZE, LinkService};

pub struct AnalyticsService;

impl AnalyticsService {
    pub async fn list(
        service: web::Data<Arc<LinkService>>,
        query: web::Query<AnalyticsQuery>,
    ) -> HttpResponse {
        let page = query.page.unwrap_or(1);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        api_result(service.analytics_page(page, limit).await)
    }

    pub async fn for_code(
        service: web::Data<Arc<LinkService>>,
        path: web::Path<String>,
    ) -> HttpResponse {
        api_result(service.analytics(&path.into_inner()).await)
    }

    pub async fn rate_limit_stats(service: web::Data<Arc<LinkService>>) -> HttpResponse {
        success_response(service.rate_limit_stats())
    }
}
