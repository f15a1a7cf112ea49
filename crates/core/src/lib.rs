//! Core utilities for the product catalog service
//!
//! This crate provides the shared plumbing used by the API layer and the
//! server binary:
//!
//! - **Error handling**: Structured errors with codes, context and HTTP status mapping
//! - **Configuration**: TOML file plus environment overrides, validated at load time
//! - **Validation**: Fluent request validation that reports every problem at once
//! - **Rate limiting**: Per-client fixed-window request throttling
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_core::{config::Config, rate_limit::{RateLimitConfig, RateLimiter}};
//!
//! let config = Config::load(None).expect("invalid configuration");
//! let limiter = RateLimiter::new(RateLimitConfig::from(&config.schema.rate_limit));
//!
//! if !limiter.check("127.0.0.1").allowed {
//!     eprintln!("slow down");
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod rate_limit;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema, Environment};
    pub use crate::error::{exit_codes, Error, ErrorCode, ErrorReport, Result, ResultExt};
    pub use crate::rate_limit::{RateLimitConfig, RateLimitDecision, RateLimiter};
    pub use crate::validation::{ValidationError, ValidationResult, Validator};
}
