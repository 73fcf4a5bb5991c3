//! Product listing, creation, and the homepage/popular aggregations.
//!
//! Listing endpoints are public; mutations resolve the session themselves
//! via `identify`, since they share paths with the public routes.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::identify;
use crate::models::{Product, ProductInput};
use crate::state::AppState;
use crate::store::{ProductStore, SearchQuery, SearchStore};
use crate::token;

/// Homepage sections, one newest-first list per category.
const HOMEPAGE_SECTIONS: &[(&str, &str)] = &[
    ("Phones", "phoneDeals"),
    ("TVs", "tvDeals"),
    ("Electronics", "electronicsDeals"),
    ("Fashion", "fashionDeals"),
    ("Furnitures", "furnitureDeals"),
    ("Home-Comforts", "homeComfortsDeals"),
    ("Kitchen", "kitchenDeals"),
    ("Transport", "transportDeals"),
    ("Personal-Care", "personalCareDeals"),
];

const DEFAULT_IMAGE: &str = "default-image.jpg";

pub async fn list_products(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let products = state.products.all().await?;
    Ok(HttpResponse::Ok().json(products))
}

pub async fn homepage(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let mut sections = serde_json::Map::new();
    sections.insert(
        "addedRecently".to_string(),
        json!(state.products.search(&SearchQuery::default()).await?),
    );
    for (category, key) in HOMEPAGE_SECTIONS {
        sections.insert(
            (*key).to_string(),
            json!(state.products.by_category(category).await?),
        );
    }
    Ok(HttpResponse::Ok().json(serde_json::Value::Object(sections)))
}

pub async fn create_product(
    state: web::Data<AppState>,
    req: HttpRequest,
    input: web::Json<ProductInput>,
) -> Result<HttpResponse, ApiError> {
    let user = identify(req.cookie(token::SESSION_COOKIE), state.get_ref()).await?;
    let input = input.into_inner();

    if input.name.trim().is_empty()
        || input.description.trim().is_empty()
        || input.category.trim().is_empty()
        || input.seller_phone.trim().is_empty()
    {
        return Err(ApiError::InvalidInput("All fields are required".into()));
    }
    if !input.price.is_finite() || input.price <= 0.0 {
        return Err(ApiError::InvalidInput("Invalid price".into()));
    }

    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        description: input.description,
        category: input.category,
        price: input.price,
        image: input.image.or_else(|| Some(DEFAULT_IMAGE.to_string())),
        seller_id: user.id,
        seller_phone: input.seller_phone,
        created_at: Utc::now(),
    };
    state.products.insert(&product).await?;

    Ok(HttpResponse::Created().json(json!({"success": true, "product": product})))
}

pub async fn update_product(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    input: web::Json<ProductInput>,
) -> Result<HttpResponse, ApiError> {
    let user = identify(req.cookie(token::SESSION_COOKIE), state.get_ref()).await?;
    let updated = state
        .products
        .update_owned(&path.into_inner(), &user.id, &input)
        .await?;
    if !updated {
        return Err(ApiError::NotFound("Product"));
    }
    Ok(HttpResponse::Ok().json(json!({"message": "Product updated successfully"})))
}

pub async fn delete_product(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = identify(req.cookie(token::SESSION_COOKIE), state.get_ref()).await?;
    let deleted = state
        .products
        .delete_owned(&path.into_inner(), &user.id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("Product"));
    }
    Ok(HttpResponse::Ok().json(json!({"message": "Product deleted successfully"})))
}

/// Top products by search count; the newest listings when nothing has been
/// searched yet. Entries for since-deleted products are skipped.
pub async fn popular_products(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let history = state.searches.popular(5).await?;
    let mut products = Vec::new();
    for entry in history {
        if let Some(product) = state.products.find_by_id(&entry.product_id).await? {
            products.push(product);
        }
    }
    if products.is_empty() {
        products = state.products.recent(5).await?;
    }
    Ok(HttpResponse::Ok().json(products))
}
