//! Service layer
//!
//! - `CodeGenerator`: unique code generation, custom code validation
//! - `LookupCoordinator`: cache-then-store reads with negative caching
//! - `LinkService`: the use cases served over HTTP

mod code_generator;
mod link_service;
mod lookup;

pub use code_generator::{CUSTOM_CODE_MAX_LEN, CUSTOM_CODE_MIN_LEN, CodeGenerator, RESERVED_CODES};
pub use link_service::*;
pub use lookup::LookupCoordinator;
