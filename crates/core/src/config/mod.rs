//! Service configuration
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables (`APP_ENV`/`NODE_ENV`, `HOST`, `PORT`,
//! `COMMON_RATE_LIMIT_MAX_REQUESTS`, `COMMON_RATE_LIMIT_WINDOW_MS`,
//! `SEARCH_MAX_DISTANCE`).

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
