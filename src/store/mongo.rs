//! MongoDB-backed stores.

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::StreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{FindOptions, ReplaceOptions};
use mongodb::{Collection, Cursor, Database};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::{
    CartStore, OrderStore, ProductStore, SearchQuery, SearchStore, StoreError, UserStore,
};
use crate::models::{Cart, Order, Product, ProductInput, SearchHistory, User};

async fn collect<T>(mut cursor: Cursor<T>) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let mut out = Vec::new();
    while let Some(item) = cursor.next().await {
        out.push(item?);
    }
    Ok(out)
}

/// `$or` clause matching name, description or category case-insensitively.
fn text_filter(q: &str) -> Vec<Document> {
    vec![
        doc! {"name": {"$regex": q, "$options": "i"}},
        doc! {"description": {"$regex": q, "$options": "i"}},
        doc! {"category": {"$regex": q, "$options": "i"}},
    ]
}

pub struct MongoUserStore {
    users: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self { users: db.collection("users") }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.find_one(doc! {"email": email}, None).await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.find_one(doc! {"_id": id}, None).await?)
    }

    async fn find_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, StoreError> {
        // Expiry is checked by the caller so both store backends agree.
        Ok(self
            .users
            .find_one(doc! {"verificationToken": token}, None)
            .await?)
    }

    async fn create(&self, user: &User) -> Result<(), StoreError> {
        self.users.insert_one(user, None).await?;
        Ok(())
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        self.users
            .replace_one(doc! {"_id": &user.id}, user, None)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.users.delete_one(doc! {"_id": id}, None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn all(&self) -> Result<Vec<User>, StoreError> {
        collect(self.users.find(None, None).await?).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.users.count_documents(None, None).await?)
    }
}

pub struct MongoProductStore {
    products: Collection<Product>,
}

impl MongoProductStore {
    pub fn new(db: &Database) -> Self {
        Self { products: db.collection("products") }
    }
}

#[async_trait]
impl ProductStore for MongoProductStore {
    async fn insert(&self, product: &Product) -> Result<(), StoreError> {
        self.products.insert_one(product, None).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.find_one(doc! {"_id": id}, None).await?)
    }

    async fn all(&self) -> Result<Vec<Product>, StoreError> {
        collect(self.products.find(None, None).await?).await
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Product>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! {"createdAt": -1})
            .limit(limit)
            .build();
        collect(self.products.find(None, options).await?).await
    }

    async fn by_category(&self, category: &str) -> Result<Vec<Product>, StoreError> {
        let options = FindOptions::builder().sort(doc! {"createdAt": -1}).build();
        collect(
            self.products
                .find(doc! {"category": category}, options)
                .await?,
        )
        .await
    }

    async fn update_owned(
        &self,
        id: &str,
        seller_id: &str,
        changes: &ProductInput,
    ) -> Result<bool, StoreError> {
        let mut set = doc! {
            "name": &changes.name,
            "description": &changes.description,
            "category": &changes.category,
            "price": changes.price,
            "sellerPhone": &changes.seller_phone,
        };
        if let Some(image) = &changes.image {
            set.insert("image", image);
        }
        let result = self
            .products
            .update_one(
                doc! {"_id": id, "sellerId": seller_id},
                doc! {"$set": set},
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn delete_owned(&self, id: &str, seller_id: &str) -> Result<bool, StoreError> {
        let result = self
            .products
            .delete_one(doc! {"_id": id, "sellerId": seller_id}, None)
            .await?;
        Ok(result.deleted_count == 1)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.products.delete_one(doc! {"_id": id}, None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Product>, StoreError> {
        let mut filter = Document::new();
        if let Some(q) = &query.q {
            filter.insert("$or", text_filter(q));
        }
        if let Some(category) = &query.category {
            filter.insert("category", category.clone());
        }
        let mut price = Document::new();
        if let Some(min) = query.price_min {
            price.insert("$gte", min);
        }
        if let Some(max) = query.price_max {
            price.insert("$lte", max);
        }
        if !price.is_empty() {
            filter.insert("price", price);
        }

        let sort = if query.alphabetical {
            doc! {"name": 1, "createdAt": -1}
        } else {
            doc! {"createdAt": -1}
        };
        let options = FindOptions::builder().sort(sort).build();
        collect(self.products.find(filter, options).await?).await
    }

    async fn suggest(&self, q: &str, limit: i64) -> Result<Vec<Product>, StoreError> {
        let options = FindOptions::builder().limit(limit).build();
        collect(
            self.products
                .find(doc! {"$or": text_filter(q)}, options)
                .await?,
        )
        .await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.products.count_documents(None, None).await?)
    }
}

pub struct MongoCartStore {
    carts: Collection<Cart>,
}

impl MongoCartStore {
    pub fn new(db: &Database) -> Self {
        Self { carts: db.collection("carts") }
    }
}

#[async_trait]
impl CartStore for MongoCartStore {
    async fn find_by_user(&self, user_id: &str) -> Result<Option<Cart>, StoreError> {
        Ok(self.carts.find_one(doc! {"userId": user_id}, None).await?)
    }

    async fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.carts
            .replace_one(doc! {"userId": &cart.user_id}, cart, options)
            .await?;
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<(), StoreError> {
        self.carts
            .update_one(
                doc! {"userId": user_id},
                doc! {"$set": {"items": []}},
                None,
            )
            .await?;
        Ok(())
    }
}

pub struct MongoOrderStore {
    orders: Collection<Order>,
}

impl MongoOrderStore {
    pub fn new(db: &Database) -> Self {
        Self { orders: db.collection("orders") }
    }
}

#[async_trait]
impl OrderStore for MongoOrderStore {
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        self.orders.insert_one(order, None).await?;
        Ok(())
    }

    async fn find_by_buyer(&self, buyer_id: &str) -> Result<Vec<Order>, StoreError> {
        let options = FindOptions::builder().sort(doc! {"createdAt": -1}).build();
        collect(self.orders.find(doc! {"buyerId": buyer_id}, options).await?).await
    }

    async fn all(&self) -> Result<Vec<Order>, StoreError> {
        let options = FindOptions::builder().sort(doc! {"createdAt": -1}).build();
        collect(self.orders.find(None, options).await?).await
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.orders.delete_one(doc! {"_id": id}, None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.orders.count_documents(None, None).await?)
    }
}

pub struct MongoSearchStore {
    history: Collection<SearchHistory>,
}

impl MongoSearchStore {
    pub fn new(db: &Database) -> Self {
        Self { history: db.collection("search_history") }
    }
}

#[async_trait]
impl SearchStore for MongoSearchStore {
    async fn record(&self, product_id: &str) -> Result<(), StoreError> {
        match self
            .history
            .find_one(doc! {"productId": product_id}, None)
            .await?
        {
            Some(mut entry) => {
                entry.search_count += 1;
                entry.last_searched = Utc::now();
                self.history
                    .replace_one(doc! {"_id": &entry.id}, &entry, None)
                    .await?;
            }
            None => {
                let entry = SearchHistory {
                    id: Uuid::new_v4().to_string(),
                    product_id: product_id.to_string(),
                    search_count: 1,
                    last_searched: Utc::now(),
                };
                self.history.insert_one(&entry, None).await?;
            }
        }
        Ok(())
    }

    async fn popular(&self, limit: i64) -> Result<Vec<SearchHistory>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! {"searchCount": -1})
            .limit(limit)
            .build();
        collect(self.history.find(None, options).await?).await
    }
}
