//! Server mode
//!
//! Builds the shared components, starts the actix-web server and waits for
//! either the server to exit or a shutdown signal.

use std::time::Duration;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::DefaultHeaders, web};
use anyhow::Result;
use tracing::{info, warn};

use crate::api::middleware::RateLimit;
use crate::api::services::{AppStartTime, MAX_BODY_BYTES, TrustedProxies, configure};
use crate::config::StaticConfig;
use crate::rate_limit::spawn_idle_sweeper;
use crate::runtime::lifetime;

/// Run the HTTP server
///
/// **Note**: logging must be initialized before calling this function
pub async fn run_server(config: &'static StaticConfig) -> Result<()> {
    let app_start_time = AppStartTime::now();

    let startup = lifetime::startup::prepare_server_startup(config)
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {}", e);
            e
        })?;

    let link_service = startup.link_service.clone();
    let limiter = startup.limiter.clone();
    let trusted_proxies = config.rate_limit.trusted_proxies.clone();

    if trusted_proxies.is_empty() {
        info!("No trusted proxies configured; clients are keyed by peer address");
    } else {
        warn!(
            "Trusting forwarding headers from proxies: {:?}",
            trusted_proxies
        );
    }

    let sweeper = spawn_idle_sweeper(
        limiter.clone(),
        Duration::from_secs(config.rate_limit.idle_sweep_secs),
    );

    let cpu_count = config.server.cpu_count.clamp(1, 32);
    info!("Using {} worker threads", cpu_count);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RateLimit::new(limiter.clone(), trusted_proxies.clone()))
            // 与原服务一致：允许任意来源
            .wrap(Cors::permissive())
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-cache, no-store, must-revalidate")))
            .app_data(web::Data::new(link_service.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::Data::new(TrustedProxies(trusted_proxies.clone())))
            .app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
            .configure(configure)
    })
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_millis(5000))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    warn!("Starting server at http://{}", bind_address);
    let server = server.bind(&bind_address)?.run();
    let handle = server.handle();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown() => {
            handle.stop(true).await;
            warn!("Graceful shutdown complete");
        }
    }

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    Ok(())
}
