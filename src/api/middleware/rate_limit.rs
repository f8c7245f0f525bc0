//! Per-client rate limiting middleware
//!
//! Every request except `/health` is checked against the shared
//! `RateLimiter`, keyed by the resolved client IP. Rejections short-circuit
//! with 429 before any handler runs.

use std::rc::Rc;
use std::sync::Arc;

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{HeaderName, HeaderValue},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, trace};

use crate::api::helpers::rate_limited_response;
use crate::rate_limit::RateLimiter;
use crate::utils::ip::resolve_client_ip;

pub const HEALTH_PATH: &str = "/health";

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";

#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<RateLimiter>,
    trusted_proxies: Rc<Vec<String>>,
}

impl RateLimit {
    pub fn new(limiter: Arc<RateLimiter>, trusted_proxies: Vec<String>) -> Self {
        Self {
            limiter,
            trusted_proxies: Rc::new(trusted_proxies),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            trusted_proxies: self.trusted_proxies.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limiter: Arc<RateLimiter>,
    trusted_proxies: Rc<Vec<String>>,
}

fn is_exempt(path: &str) -> bool {
    path == HEALTH_PATH || path.starts_with("/health/")
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        if is_exempt(req.path()) {
            return Box::pin(async move {
                let response = srv.call(req).await?.map_into_left_body();
                Ok(response)
            });
        }

        let peer = req.peer_addr().map(|addr| addr.ip().to_string());
        let client = resolve_client_ip(peer.as_deref(), req.headers(), &self.trusted_proxies);
        let decision = self.limiter.check(&client);

        Box::pin(async move {
            if !decision.allowed {
                let retry_after = decision.retry_after_secs.unwrap_or(1);
                debug!(
                    "Rate limit exceeded for {} on {}, retry after {}s",
                    client,
                    req.path(),
                    retry_after
                );
                return Ok(
                    req.into_response(rate_limited_response(retry_after).map_into_right_body())
                );
            }

            trace!("Rate limit ok for {} ({} remaining)", client, decision.remaining);
            let mut response = srv.call(req).await?;
            let headers = response.headers_mut();
            headers.insert(
                HeaderName::from_static(LIMIT_HEADER),
                HeaderValue::from(decision.limit),
            );
            headers.insert(
                HeaderName::from_static(REMAINING_HEADER),
                HeaderValue::from(decision.remaining),
            );
            Ok(response.map_into_left_body())
        })
    }
}
