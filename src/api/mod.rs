//! HTTP surface
//!
//! Thin actix-web handlers over `LinkService`; rate limiting lives in
//! `middleware`.

pub mod helpers;
pub mod middleware;
pub mod services;
pub mod types;
