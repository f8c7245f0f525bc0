//! Shorten and info endpoints

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use tracing::trace;

use crate::api::helpers::{created_response, error_from_snaplink, success_response};
use crate::api::types::ShortenResponse;
use crate::services::{LinkService, ShortenRequest};

pub struct LinkRoutes;

impl LinkRoutes {
    /// 201 for a new code, 200 when an existing one is reused.
    pub async fn shorten(
        service: web::Data<Arc<LinkService>>,
        body: web::Json<ShortenRequest>,
    ) -> impl Responder {
        match service.shorten(body.into_inner()).await {
            Ok(result) => {
                let data = ShortenResponse {
                    short_code: result.short_code,
                    short_url: result.short_url,
                };
                if result.created {
                    created_response(data)
                } else {
                    success_response(data)
                }
            }
            Err(e) => error_from_snaplink(&e),
        }
    }

    pub async fn info(
        service: web::Data<Arc<LinkService>>,
        path: web::Path<String>,
    ) -> HttpResponse {
        let code = path.into_inner();
        trace!("Info request for {}", code);

        match service.info(&code).await {
            Ok(info) => success_response(info),
            Err(e) => error_from_snaplink(&e),
        }
    }
}
