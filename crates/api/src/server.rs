//! HTTP routing and the hyper server loop

use crate::response::{json_response, ServiceResponse};
use crate::schemas;
use crate::service::{ApiResponse, ProductService};
use catalog_core::rate_limit::{RateLimitDecision, RateLimiter};
use catalog_core::{Error, Result, ResultExt};
use catalog_telemetry::RequestMetrics;
use hyper::body::HttpBody;
use hyper::header::{HeaderName, HeaderValue, ALLOW, CONTENT_LENGTH, RETRY_AFTER};
use hyper::server::conn::AddrStream;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 100 * 1024;

const ALLOWED_METHODS: &str = "GET, POST";

/// How often idle rate limit windows are dropped
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Everything a request handler needs
pub struct AppState {
    pub service: ProductService,
    pub limiter: RateLimiter,
    pub metrics: Arc<RequestMetrics>,
}

impl AppState {
    pub fn new(service: ProductService, limiter: RateLimiter) -> Self {
        Self {
            service,
            limiter,
            metrics: Arc::new(RequestMetrics::new()),
        }
    }
}

/// Resolved endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    AddProduct,
    ListProducts,
    SearchProducts,
    GetProduct(String),
    MethodNotAllowed,
    NotFound,
}

impl Route {
    /// Label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::AddProduct => "POST /products",
            Self::ListProducts => "GET /products",
            Self::SearchProducts => "GET /products/search",
            Self::GetProduct(_) => "GET /products/{id}",
            Self::MethodNotAllowed => "method not allowed",
            Self::NotFound => "not found",
        }
    }
}

/// Map a method and path to a route
pub fn route(method: &Method, path: &str) -> Route {
    let path = path.trim_end_matches('/');
    let Some(rest) = path.strip_prefix("/products") else {
        return Route::NotFound;
    };

    match rest {
        "" => match *method {
            Method::POST => Route::AddProduct,
            Method::GET => Route::ListProducts,
            _ => Route::MethodNotAllowed,
        },
        "/search" => match *method {
            Method::GET => Route::SearchProducts,
            _ => Route::MethodNotAllowed,
        },
        _ => match rest.strip_prefix('/') {
            Some(id) if !id.contains('/') => match *method {
                Method::GET => Route::GetProduct(id.to_string()),
                _ => Route::MethodNotAllowed,
            },
            _ => Route::NotFound,
        },
    }
}

/// Serve one request: rate limit, route, respond, record
pub async fn handle(
    state: Arc<AppState>,
    remote: SocketAddr,
    req: Request<Body>,
) -> Response<Body> {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let route = route(&method, &path);

    let decision = state.limiter.check(&remote.ip().to_string());

    let mut response = if decision.allowed {
        dispatch(&state, &route, req).await
    } else {
        tracing::warn!(client = %remote.ip(), "Rate limit exceeded");
        let mut response = rate_limited();
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(reset_secs(&decision)));
        response
    };
    apply_rate_limit_headers(&mut response, &decision);

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    state.metrics.record(route.label(), status, elapsed);
    tracing::info!(
        method = %method,
        path = %path,
        status,
        latency_ms = elapsed.as_secs_f64() * 1000.0,
        "Request handled"
    );

    response
}

async fn dispatch(state: &AppState, route: &Route, req: Request<Body>) -> Response<Body> {
    let service = &state.service;

    match route {
        Route::AddProduct => {
            let parsed = read_body(req).await.and_then(|body| schemas::parse_add_product(&body));
            match parsed {
                Ok(request) => service.add_product(request).into_http(),
                Err(e) => error_response(&e),
            }
        }
        Route::ListProducts => match schemas::parse_pagination(req.uri().query()) {
            Ok(query) => service.get_products(query).into_http(),
            Err(e) => error_response(&e),
        },
        Route::SearchProducts => match schemas::parse_search(req.uri().query()) {
            Ok(query) => service.search_products(&query).into_http(),
            Err(e) => error_response(&e),
        },
        Route::GetProduct(id) => match schemas::parse_product_id(id) {
            Ok(id) => service.get_product_by_id(&id).into_http(),
            Err(e) => error_response(&e),
        },
        Route::MethodNotAllowed => {
            let mut response = json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                br#"{"error":"Method Not Allowed"}"#.to_vec(),
            );
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
            response
        }
        Route::NotFound => error_response(&Error::not_found("Route not found")),
    }
}

/// Collect the request body, refusing anything over [`MAX_BODY_BYTES`]
///
/// A declared length over the cap is rejected before any data is read;
/// otherwise chunks are read until the running total passes the cap.
async fn read_body(req: Request<Body>) -> Result<Vec<u8>> {
    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let mut body = req.into_body();
    let hinted = body.size_hint().lower();
    if declared.into_iter().chain([hinted]).any(|n| n > MAX_BODY_BYTES as u64) {
        return Err(body_too_large());
    }

    let mut buf = Vec::with_capacity(usize::try_from(hinted).unwrap_or(0));
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(|e| {
            Error::validation(format!("Invalid input: Failed to read body ({})", e))
        })?;
        if buf.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(body_too_large());
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

fn body_too_large() -> Error {
    Error::validation(format!("Invalid input: Body exceeds {} bytes", MAX_BODY_BYTES))
}

/// Envelope for a request that failed before reaching the service
fn error_response(err: &Error) -> Response<Body> {
    let response: ApiResponse<()> = ServiceResponse::from_error(err);
    response.into_http()
}

fn rate_limited() -> Response<Body> {
    error_response(&Error::rate_limited())
}

fn reset_secs(decision: &RateLimitDecision) -> u64 {
    decision.reset_after.as_millis().div_ceil(1000) as u64
}

fn apply_rate_limit_headers(response: &mut Response<Body>, decision: &RateLimitDecision) {
    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static("ratelimit-limit"),
        HeaderValue::from(decision.limit),
    );
    headers.insert(
        HeaderName::from_static("ratelimit-remaining"),
        HeaderValue::from(decision.remaining),
    );
    headers.insert(
        HeaderName::from_static("ratelimit-reset"),
        HeaderValue::from(reset_secs(decision)),
    );
}

/// Bind a listener for `address` (`host:port`)
pub fn bind(address: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(address)
        .map_err(Error::from)
        .context(format!("Failed to bind {}", address))?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}

/// Run the server on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local = listener.local_addr()?;

    let pruner = {
        let limiter = state.limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                let removed = limiter.prune_expired();
                if removed > 0 {
                    tracing::debug!(removed, "Pruned rate limit windows");
                }
            }
        })
    };

    let make_svc = make_service_fn(move |conn: &AddrStream| {
        let state = Arc::clone(&state);
        let remote = conn.remote_addr();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let state = Arc::clone(&state);
                async move { Ok::<_, Infallible>(handle(state, remote, req).await) }
            }))
        }
    });

    let server = Server::from_tcp(listener)
        .map_err(|e| Error::internal(format!("Failed to start server: {}", e)))?
        .serve(make_svc)
        .with_graceful_shutdown(shutdown);

    tracing::info!(address = %local, "Listening");
    let result = server.await;
    pruner.abort();

    result.map_err(|e| Error::internal(format!("Server error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::ProductRepository;
    use catalog_core::rate_limit::RateLimitConfig;
    use serde_json::Value;

    const PEER: &str = "127.0.0.1:50000";

    fn state_with_limit(max_requests: u32) -> Arc<AppState> {
        let repository = Arc::new(ProductRepository::seeded().unwrap());
        Arc::new(AppState::new(
            ProductService::new(repository),
            RateLimiter::new(RateLimitConfig::per_minute(max_requests)),
        ))
    }

    fn state() -> Arc<AppState> {
        state_with_limit(1000)
    }

    async fn call(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        body: &str,
    ) -> (StatusCode, Value, Response<Body>) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        send(state, req).await
    }

    async fn send(
        state: &Arc<AppState>,
        req: Request<Body>,
    ) -> (StatusCode, Value, Response<Body>) {
        let response = handle(Arc::clone(state), PEER.parse().unwrap(), req).await;
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = hyper::body::to_bytes(body).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json, Response::from_parts(parts, Body::empty()))
    }

    #[test]
    fn test_routing_table() {
        assert_eq!(route(&Method::POST, "/products"), Route::AddProduct);
        assert_eq!(route(&Method::GET, "/products/"), Route::ListProducts);
        assert_eq!(route(&Method::GET, "/products/search"), Route::SearchProducts);
        assert_eq!(
            route(&Method::GET, "/products/abc"),
            Route::GetProduct("abc".to_string())
        );
        assert_eq!(route(&Method::DELETE, "/products"), Route::MethodNotAllowed);
        assert_eq!(route(&Method::POST, "/products/search"), Route::MethodNotAllowed);
        assert_eq!(route(&Method::PUT, "/products/abc"), Route::MethodNotAllowed);
        assert_eq!(route(&Method::GET, "/products/a/b"), Route::NotFound);
        assert_eq!(route(&Method::GET, "/productsx"), Route::NotFound);
        assert_eq!(route(&Method::GET, "/"), Route::NotFound);
    }

    #[tokio::test]
    async fn test_list_products() {
        let (status, json, response) =
            call(&state(), Method::GET, "/products?page=2&limit=5", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["page"], 2);
        assert_eq!(json["data"]["results"].as_array().unwrap().len(), 5);
        assert_eq!(json["data"]["totalItems"], 20);
        assert_eq!(response.headers()["ratelimit-limit"], "1000");
        assert_eq!(response.headers()["ratelimit-remaining"], "999");
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_query_key() {
        let (status, json, _) = call(&state(), Method::GET, "/products?order=asc", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["statusCode"], 400);
        assert!(json["data"].is_null());
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let (status, json, _) =
            call(&state(), Method::GET, "/products/search?term=Chiar", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Products found!");
        assert_eq!(json["data"]["totalItems"], 2);
        assert_eq!(json["data"]["results"][0]["name"], "Chair");
    }

    #[tokio::test]
    async fn test_search_short_term() {
        let (status, json, _) = call(&state(), Method::GET, "/products/search?term=ab", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid input: Search term cannot be empty");
    }

    #[tokio::test]
    async fn test_add_then_fetch() {
        let state = state();
        let body = r#"{"name":"Standing Desk","category":"Furniture","description":"Electric",
            "price":499,"imageUrl":"https://example.com/desk.jpg"}"#;
        let (status, json, _) = call(&state, Method::POST, "/products", body).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["message"], "The product has been added successfully!");

        let id = json["data"]["id"].as_str().unwrap().to_string();
        let (status, json, _) = call(&state, Method::GET, &format!("/products/{id}"), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["name"], "Standing Desk");
    }

    #[tokio::test]
    async fn test_add_invalid_body() {
        let (status, json, _) = call(&state(), Method::POST, "/products", r#"{"name":""}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().starts_with("Invalid input: Name is required"));

        let (status, _, _) = call(&state(), Method::POST, "/products", "{oops").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_streamed_body_stops_at_cap() {
        const CHUNK: usize = 64 * 1024;
        const CHUNKS: usize = 800;

        let (mut sender, body) = Body::channel();
        let producer = tokio::spawn(async move {
            let mut sent = 0usize;
            for _ in 0..CHUNKS {
                let chunk = hyper::body::Bytes::from(vec![b'x'; CHUNK]);
                if sender.send_data(chunk).await.is_err() {
                    break;
                }
                sent += CHUNK;
            }
            sent
        });

        let req = Request::builder()
            .method(Method::POST)
            .uri("/products")
            .body(body)
            .unwrap();
        let (status, json, _) = send(&state(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().contains("exceeds"));

        let sent = producer.await.unwrap();
        assert!(sent < CHUNK * CHUNKS);
        assert!(sent <= MAX_BODY_BYTES + 2 * CHUNK, "read {sent} bytes");
    }

    #[tokio::test]
    async fn test_declared_length_over_cap_rejected() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/products")
            .header(CONTENT_LENGTH, (MAX_BODY_BYTES + 1).to_string())
            .body(Body::from("{}"))
            .unwrap();
        let (status, json, _) = send(&state(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().contains("exceeds"));
    }

    #[tokio::test]
    async fn test_add_oversized_body() {
        let body = format!(r#"{{"name":"{}"}}"#, "x".repeat(MAX_BODY_BYTES));
        let (status, json, _) = call(&state(), Method::POST, "/products", &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().contains("exceeds"));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let state = state();
        let (status, json, _) =
            call(&state, Method::GET, "/products/f47643c1-5109-45d4-bfad-fbd89f76e2db", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Product retrieved successfully!");

        let (status, json, _) = call(&state, Method::GET, "/products/123", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid input: Invalid uuid");

        let (status, json, _) =
            call(&state, Method::GET, "/products/00000000-0000-4000-8000-000000000000", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Product not found");
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let (status, json, response) = call(&state(), Method::DELETE, "/products", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(json["error"], "Method Not Allowed");
        assert_eq!(response.headers()[ALLOW], ALLOWED_METHODS);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, json, _) = call(&state(), Method::GET, "/orders", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "Route not found");
    }

    #[tokio::test]
    async fn test_rate_limit_exhausted() {
        let state = state_with_limit(2);
        for _ in 0..2 {
            let (status, _, _) = call(&state, Method::GET, "/products", "").await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, json, response) = call(&state, Method::GET, "/products", "").await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["message"], "Too many requests, please try again later.");
        assert_eq!(response.headers()["ratelimit-remaining"], "0");
        assert!(response.headers().contains_key(RETRY_AFTER));
    }

    #[tokio::test]
    async fn test_metrics_recorded() {
        let state = state();
        call(&state, Method::GET, "/products", "").await;
        call(&state, Method::GET, "/nowhere", "").await;

        let snapshot = state.metrics.snapshot();
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.error_responses, 1);
        assert_eq!(snapshot.by_route["GET /products"], 1);
    }

    #[tokio::test]
    async fn test_serve_graceful_shutdown() {
        let listener = bind("127.0.0.1:0").unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, state(), async {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
