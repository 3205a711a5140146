//! Cache types for catalog lookups.

use bazaar_core::{Category, Shop};

/// Cache key for catalog lists.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Shops,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<Category>),
    Shops(Vec<Shop>),
}
