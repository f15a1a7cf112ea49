//! Request parsing and validation
//!
//! Every parser reports all problems at once as a `ValidationError` whose
//! message is `Invalid input: <msg>, <msg>`, which the service turns into a
//! `400` envelope.

use crate::models::AddProductRequest;
use catalog_core::validation::Validator;
use catalog_core::{Error, Result};
use serde_json::{Map, Value};

/// Query keys accepted by `GET /products`
const PAGINATION_KEYS: &[&str] = &["page", "limit"];

/// Minimum length of a search term
pub const MIN_TERM_LENGTH: usize = 3;

/// Requested page; `None` means use the default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// `GET /products/search` query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub page: PageQuery,
}

/// Parse and validate a `POST /products` body
pub fn parse_add_product(body: &[u8]) -> Result<AddProductRequest> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| Error::validation(format!("Invalid input: Malformed JSON body ({})", e)))?;

    let Value::Object(map) = value else {
        return Err(Error::validation(format!(
            "Invalid input: Expected object, received {}",
            json_type(&value)
        )));
    };

    let validator = Validator::new()
        .unknown_keys(map.keys().map(String::as_str), AddProductRequest::FIELDS)
        .required("name", string_field(&map, "name"), "Name is required")
        .required("category", string_field(&map, "category"), "Category is required")
        .required(
            "description",
            string_field(&map, "description"),
            "Description is required",
        );

    let validator = match map.get("price").and_then(Value::as_f64) {
        Some(price) => validator
            .finite("price", price)
            .min_value("price", price, 0.0, "Price must be a positive number"),
        None => validator.custom("price", || {
            Some("Price must be a positive number".to_string())
        }),
    };

    validator
        .url("imageUrl", string_field(&map, "imageUrl"), "Image is required")
        .validate()
        .to_result()?;

    serde_json::from_value(Value::Object(map)).map_err(Error::from)
}

/// Parse `page`/`limit`; any other key is rejected
pub fn parse_pagination(query: Option<&str>) -> Result<PageQuery> {
    let pairs = query_pairs(query);
    let keys = pairs.iter().map(|(k, _)| k.as_str());
    let validator = Validator::new().unknown_keys(keys, PAGINATION_KEYS);
    let (validator, page) = page_fields(validator, &pairs);
    validator.validate().to_result()?;
    Ok(page)
}

/// Parse `term` plus optional `page`/`limit`; other keys are ignored
pub fn parse_search(query: Option<&str>) -> Result<SearchQuery> {
    let pairs = query_pairs(query);
    let term = lookup(&pairs, "term").unwrap_or_default().to_string();

    let validator = Validator::new().min_length(
        "term",
        &term,
        MIN_TERM_LENGTH,
        "Search term cannot be empty",
    );
    let (validator, page) = page_fields(validator, &pairs);
    validator.validate().to_result()?;

    Ok(SearchQuery { term, page })
}

/// Validate a product id path segment
pub fn parse_product_id(id: &str) -> Result<String> {
    Validator::new().uuid("id", id).validate().to_result()?;
    Ok(id.to_string())
}

fn page_fields(validator: Validator, pairs: &[(String, String)]) -> (Validator, PageQuery) {
    let (validator, page) = validator.integer_at_least("page", lookup(pairs, "page"), 1);
    let (validator, limit) = validator.integer_at_least("limit", lookup(pairs, "limit"), 1);

    let page = PageQuery {
        page: page.and_then(|n| usize::try_from(n).ok()),
        limit: limit.and_then(|n| usize::try_from(n).ok()),
    };
    (validator, page)
}

/// Decoded `key=value` pairs in query-string order
fn query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

/// First value for `key`
fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// String value of `key`, or `""` when missing or not a string
fn string_field<'a>(map: &'a Map<String, Value>, key: &str) -> &'a str {
    map.get(key).and_then(Value::as_str).unwrap_or("")
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
