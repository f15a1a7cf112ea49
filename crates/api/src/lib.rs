//! Product catalog HTTP service
//!
//! Layers, outermost first:
//! - [`server`]: hyper routing, rate limiting, request logging and metrics
//! - [`schemas`]: request parsing and validation
//! - [`service`]: catalog operations returning [`ServiceResponse`] envelopes
//! - [`repository`]: the in-memory product store
//!
//! Search ranks products by the Damerau-Levenshtein distance between the
//! query and the product name (see `catalog_search`).

pub mod models;
pub mod pagination;
pub mod repository;
pub mod response;
pub mod schemas;
pub mod server;
pub mod service;

pub use models::{AddProductRequest, Product};
pub use pagination::{paginate, PaginatedResult};
pub use repository::ProductRepository;
pub use response::{exception_response, ServiceResponse};
pub use server::{bind, handle, serve, AppState};
pub use service::ProductService;
