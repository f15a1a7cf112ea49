//! Catalog operations behind the HTTP routes

use crate::models::{AddProductRequest, Product};
use crate::pagination::{paginate, PaginatedResult, DEFAULT_PAGE};
use crate::repository::ProductRepository;
use crate::response::{exception_response, ServiceResponse};
use crate::schemas::{PageQuery, SearchQuery};
use catalog_core::config::ConfigSchema;
use catalog_core::Error;
use catalog_search::{fuzzy_search_scored, par_fuzzy_search_scored, DEFAULT_MAX_DISTANCE};
use std::sync::Arc;
use uuid::Uuid;

/// Catalogs at least this large are searched on the rayon pool
pub const PARALLEL_SEARCH_THRESHOLD: usize = 1024;

/// Default page size when a request leaves `limit` out
pub const DEFAULT_LIMIT: usize = 10;

/// Response with optional payload (`null` on failure)
pub type ApiResponse<T> = ServiceResponse<Option<T>>;

/// Product operations over a shared repository
#[derive(Debug, Clone)]
pub struct ProductService {
    repository: Arc<ProductRepository>,
    max_distance: i64,
    default_limit: usize,
}

impl ProductService {
    pub fn new(repository: Arc<ProductRepository>) -> Self {
        Self {
            repository,
            max_distance: DEFAULT_MAX_DISTANCE,
            default_limit: DEFAULT_LIMIT,
        }
    }

    /// Service using the search and pagination settings of `schema`
    pub fn from_config(repository: Arc<ProductRepository>, schema: &ConfigSchema) -> Self {
        Self::new(repository)
            .with_max_distance(schema.search.max_distance)
            .with_default_limit(schema.pagination.default_limit)
    }

    pub fn with_max_distance(mut self, max_distance: i64) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_default_limit(mut self, default_limit: usize) -> Self {
        self.default_limit = default_limit.max(1);
        self
    }

    pub fn repository(&self) -> &Arc<ProductRepository> {
        &self.repository
    }

    /// Store a new product under a fresh v4 id
    pub fn add_product(&self, request: AddProductRequest) -> ApiResponse<Product> {
        let product = request.into_product(Uuid::new_v4().to_string());

        match self.repository.add_product(product) {
            Ok(product) => {
                tracing::info!(id = %product.id, name = %product.name, "Product added");
                ServiceResponse::success(
                    "The product has been added successfully!",
                    Some(product),
                    201,
                )
            }
            Err(e) => exception_response(&e, "An error occurred while adding the product"),
        }
    }

    /// One page of the catalog in insertion order
    pub fn get_products(&self, query: PageQuery) -> ApiResponse<PaginatedResult<Product>> {
        let (page, limit) = self.page_and_limit(query);
        let products = paginate(self.repository.products(), page, limit);
        ServiceResponse::success("Products retrieved successfully!", Some(products), 200)
    }

    pub fn get_product_by_id(&self, id: &str) -> ApiResponse<Product> {
        match self.repository.product_by_id(id) {
            Some(product) => {
                ServiceResponse::success("Product retrieved successfully!", Some(product), 200)
            }
            None => ServiceResponse::from_error(&Error::not_found("Product not found")),
        }
    }

    /// Products whose name is within the configured edit distance of the
    /// term, closest first
    pub fn search_products(&self, query: &SearchQuery) -> ApiResponse<PaginatedResult<Product>> {
        let (page, limit) = self.page_and_limit(query.page);
        let snapshot = self.repository.products();

        let matches = if snapshot.len() >= PARALLEL_SEARCH_THRESHOLD {
            par_fuzzy_search_scored(&query.term, &snapshot, self.max_distance, |p| {
                p.name.as_str()
            })
        } else {
            fuzzy_search_scored(&query.term, &snapshot, self.max_distance, |p| p.name.as_str())
        };

        tracing::debug!(
            term = %query.term,
            max_distance = self.max_distance,
            candidates = snapshot.len(),
            matched = matches.len(),
            "Fuzzy search"
        );

        let ranked: Vec<Product> = matches.into_iter().map(|m| m.item.clone()).collect();
        ServiceResponse::success("Products found!", Some(paginate(ranked, page, limit)), 200)
    }

    fn page_and_limit(&self, query: PageQuery) -> (usize, usize) {
        (
            query.page.unwrap_or(DEFAULT_PAGE),
            query.limit.unwrap_or(self.default_limit),
        )
    }
}
