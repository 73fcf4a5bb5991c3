//! Persistence interfaces for the marketplace collections.
//!
//! Handlers talk to these traits; `mongo` holds the production
//! implementations and `memory` a test double so HTTP scenarios run
//! without a database.

#[cfg(test)]
pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Cart, Order, Product, ProductInput, SearchHistory, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_verification_token(&self, token: &str)
        -> Result<Option<User>, StoreError>;
    async fn create(&self, user: &User) -> Result<(), StoreError>;
    /// Replace the stored document for `user.id`.
    async fn save(&self, user: &User) -> Result<(), StoreError>;
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
    async fn all(&self) -> Result<Vec<User>, StoreError>;
    async fn count(&self) -> Result<u64, StoreError>;
}

/// Filters for `ProductStore::search`. No pagination.
#[derive(Debug, Default, Clone)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub alphabetical: bool,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: &Product) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StoreError>;
    async fn all(&self) -> Result<Vec<Product>, StoreError>;
    /// Newest first, at most `limit`.
    async fn recent(&self, limit: i64) -> Result<Vec<Product>, StoreError>;
    /// Newest first within one category.
    async fn by_category(&self, category: &str) -> Result<Vec<Product>, StoreError>;
    /// `$set`-style update gated on the seller owning the product.
    async fn update_owned(
        &self,
        id: &str,
        seller_id: &str,
        changes: &ProductInput,
    ) -> Result<bool, StoreError>;
    async fn delete_owned(&self, id: &str, seller_id: &str) -> Result<bool, StoreError>;
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Product>, StoreError>;
    /// Case-insensitive match on name/description/category, at most `limit`.
    async fn suggest(&self, q: &str, limit: i64) -> Result<Vec<Product>, StoreError>;
    async fn count(&self) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn find_by_user(&self, user_id: &str) -> Result<Option<Cart>, StoreError>;
    /// Upsert keyed by `cart.user_id` (one cart per user).
    async fn save(&self, cart: &Cart) -> Result<(), StoreError>;
    async fn clear(&self, user_id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;
    /// Newest first.
    async fn find_by_buyer(&self, buyer_id: &str) -> Result<Vec<Order>, StoreError>;
    async fn all(&self) -> Result<Vec<Order>, StoreError>;
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
    async fn count(&self) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Bump the search counter for a product (created on first hit).
    async fn record(&self, product_id: &str) -> Result<(), StoreError>;
    /// Most-searched first, at most `limit`.
    async fn popular(&self, limit: i64) -> Result<Vec<SearchHistory>, StoreError>;
}
