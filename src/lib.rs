//! snaplink - a small URL shortener service
//!
//! # Architecture
//! - `cache`: bounded LRU lookup cache with hit/miss statistics
//! - `rate_limit`: per-client sliding-window rate limiter
//! - `services`: code generation, cache-then-store lookups, link use cases
//! - `storage`: `UrlStore` trait with SeaORM and in-memory backends
//! - `api`: actix-web handlers and middleware
//! - `config`, `system`: configuration loading and logging
//! - `runtime`: component wiring and the HTTP server

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod rate_limit;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
