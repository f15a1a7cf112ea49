//! Fuzzy product search for the catalog service.
//!
//! This crate provides:
//! - Restricted Damerau-Levenshtein (optimal string alignment) edit distance
//! - Ranked fuzzy matching over any record type via a projection closure
//! - Optional parallel scoring with rayon
//!
//! Matching is case-sensitive and uses no signal other than edit distance.
//!
//! # Example
//!
//! ```
//! use catalog_search::fuzzy_search;
//!
//! struct Product { name: String }
//!
//! let products = vec![
//!     Product { name: "Laptop".into() },
//!     Product { name: "Lamp".into() },
//!     Product { name: "Chair".into() },
//! ];
//!
//! let found = fuzzy_search("Lamp", &products, 3, |p| p.name.as_str());
//! let names: Vec<&str> = found.iter().map(|p| p.name.as_str()).collect();
//! assert_eq!(names, vec!["Lamp", "Laptop"]);
//! ```

mod distance;
mod fuzzy;

pub use distance::damerau_levenshtein;
pub use fuzzy::{fuzzy_search, fuzzy_search_scored, FuzzyMatch};

#[cfg(feature = "parallel")]
pub use fuzzy::par_fuzzy_search_scored;

/// Default largest edit distance accepted by catalog search.
pub const DEFAULT_MAX_DISTANCE: i64 = 3;
