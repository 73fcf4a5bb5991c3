//! In-memory stores backing the HTTP scenario tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{
    CartStore, OrderStore, ProductStore, SearchQuery, SearchStore, StoreError, UserStore,
};
use crate::models::{Cart, Order, Product, ProductInput, SearchHistory, User};

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches_text(product: &Product, q: &str) -> bool {
    contains_ci(&product.name, q)
        || contains_ci(&product.description, q)
        || contains_ci(&product.category, q)
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.verification_token.as_deref() == Some(token))
            .cloned())
    }

    async fn create(&self, user: &User) -> Result<(), StoreError> {
        self.users.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        if let Some(slot) = users.iter_mut().find(|u| u.id == user.id) {
            *slot = user.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() < before)
    }

    async fn all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.users.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct MemoryProductStore {
    products: Mutex<Vec<Product>>,
}

impl MemoryProductStore {
    fn sorted_desc(&self) -> Vec<Product> {
        let mut products = self.products.lock().unwrap().clone();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        products
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert(&self, product: &Product) -> Result<(), StoreError> {
        self.products.lock().unwrap().push(product.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn all(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.lock().unwrap().clone())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Product>, StoreError> {
        let mut products = self.sorted_desc();
        products.truncate(limit as usize);
        Ok(products)
    }

    async fn by_category(&self, category: &str) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .sorted_desc()
            .into_iter()
            .filter(|p| p.category == category)
            .collect())
    }

    async fn update_owned(
        &self,
        id: &str,
        seller_id: &str,
        changes: &ProductInput,
    ) -> Result<bool, StoreError> {
        let mut products = self.products.lock().unwrap();
        match products
            .iter_mut()
            .find(|p| p.id == id && p.seller_id == seller_id)
        {
            Some(product) => {
                product.name = changes.name.clone();
                product.description = changes.description.clone();
                product.category = changes.category.clone();
                product.price = changes.price;
                product.seller_phone = changes.seller_phone.clone();
                if let Some(image) = &changes.image {
                    product.image = Some(image.clone());
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_owned(&self, id: &str, seller_id: &str) -> Result<bool, StoreError> {
        let mut products = self.products.lock().unwrap();
        let before = products.len();
        products.retain(|p| !(p.id == id && p.seller_id == seller_id));
        Ok(products.len() < before)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut products = self.products.lock().unwrap();
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() < before)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self
            .sorted_desc()
            .into_iter()
            .filter(|p| query.q.as_deref().map_or(true, |q| matches_text(p, q)))
            .filter(|p| query.category.as_deref().map_or(true, |c| p.category == c))
            .filter(|p| query.price_min.map_or(true, |min| p.price >= min))
            .filter(|p| query.price_max.map_or(true, |max| p.price <= max))
            .collect();
        if query.alphabetical {
            products.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(products)
    }

    async fn suggest(&self, q: &str, limit: i64) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .products
            .lock()
            .unwrap()
            .iter()
            .filter(|p| matches_text(p, q))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.products.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct MemoryCartStore {
    carts: Mutex<Vec<Cart>>,
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn find_by_user(&self, user_id: &str) -> Result<Option<Cart>, StoreError> {
        Ok(self
            .carts
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        let mut carts = self.carts.lock().unwrap();
        match carts.iter_mut().find(|c| c.user_id == cart.user_id) {
            Some(slot) => *slot = cart.clone(),
            None => carts.push(cart.clone()),
        }
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        if let Some(cart) = self
            .carts
            .lock()
            .unwrap()
            .iter_mut()
            .find(|c| c.user_id == user_id)
        {
            cart.items.clear();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryOrderStore {
    orders: Mutex<Vec<Order>>,
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.lock().unwrap().push(order.clone());
        Ok(())
    }

    async fn find_by_buyer(&self, buyer_id: &str) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.buyer_id == buyer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn all(&self) -> Result<Vec<Order>, StoreError> {
        let mut orders = self.orders.lock().unwrap().clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut orders = self.orders.lock().unwrap();
        let before = orders.len();
        orders.retain(|o| o.id != id);
        Ok(orders.len() < before)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.orders.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct MemorySearchStore {
    history: Mutex<Vec<SearchHistory>>,
}

#[async_trait]
impl SearchStore for MemorySearchStore {
    async fn record(&self, product_id: &str) -> Result<(), StoreError> {
        let mut history = self.history.lock().unwrap();
        match history.iter_mut().find(|h| h.product_id == product_id) {
            Some(entry) => {
                entry.search_count += 1;
                entry.last_searched = Utc::now();
            }
            None => history.push(SearchHistory {
                id: Uuid::new_v4().to_string(),
                product_id: product_id.to_string(),
                search_count: 1,
                last_searched: Utc::now(),
            }),
        }
        Ok(())
    }

    async fn popular(&self, limit: i64) -> Result<Vec<SearchHistory>, StoreError> {
        let mut history = self.history.lock().unwrap().clone();
        history.sort_by(|a, b| b.search_count.cmp(&a.search_count));
        history.truncate(limit as usize);
        Ok(history)
    }
}
