use std::sync::Arc;

use actix_web::http::header::{HeaderName, LOCATION, REFERER, USER_AGENT};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::debug;

use crate::api::helpers::{error_from_snaplink, success_response};
use crate::api::types::MessageResponse;
use crate::services::{ClickContext, LinkService};
use crate::utils::ip::resolve_client_ip;

/// Proxies whose forwarding headers are believed when attributing clicks
#[derive(Clone, Debug, Default)]
pub struct TrustedProxies(pub Vec<String>);

pub struct RedirectService;

impl RedirectService {
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        service: web::Data<Arc<LinkService>>,
        proxies: Option<web::Data<TrustedProxies>>,
    ) -> impl Responder {
        let code = path.into_inner();
        let context = Self::click_context(&req, proxies.as_deref().map(|p| &**p));

        match service.redirect(&code, context).await {
            Ok(target) => {
                debug!("Redirecting {} -> {}", code, target);
                HttpResponse::TemporaryRedirect()
                    .insert_header((LOCATION, target))
                    .finish()
            }
            Err(e) => error_from_snaplink(&e),
        }
    }

    pub async fn handle_delete(
        path: web::Path<String>,
        service: web::Data<Arc<LinkService>>,
    ) -> HttpResponse {
        let code = path.into_inner();

        match service.delete(&code).await {
            Ok(()) => success_response(MessageResponse::now(format!(
                "Successfully deleted short code '{}'",
                code
            ))),
            Err(e) => error_from_snaplink(&e),
        }
    }

    fn click_context(req: &HttpRequest, proxies: Option<&TrustedProxies>) -> ClickContext {
        let header = |name: HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };

        let trusted: &[String] = proxies.map(|p| p.0.as_slice()).unwrap_or(&[]);
        let peer = req.peer_addr().map(|addr| addr.ip().to_string());

        ClickContext {
            user_agent: header(USER_AGENT),
            ip: Some(resolve_client_ip(peer.as_deref(), req.headers(), trusted)),
            referrer: header(REFERER),
        }
    }
}
