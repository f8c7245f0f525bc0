use std::sync::Arc;

use actix_web::{HttpResponse, web};

use crate::api::helpers::success_response;
use crate::api::types::MessageResponse;
use crate::services::LinkService;

pub struct CacheService;

impl CacheService {
    pub async fn stats(service: web::Data<Arc<LinkService>>) -> HttpResponse {
        success_response(service.cache_stats())
    }

    /// Drops every entry and resets the counters.
    pub async fn clear(service: web::Data<Arc<LinkService>>) -> HttpResponse {
        service.clear_cache();
        success_response(MessageResponse::now("Cache cleared"))
    }
}
