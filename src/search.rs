//! Product search and type-ahead suggestions.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{ProductStore, SearchQuery, SearchStore};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    #[serde(default)]
    pub q: Option<String>,
}

pub async fn search_products(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse, ApiError> {
    let params = params.into_inner();
    let query = SearchQuery {
        q: params.q.filter(|q| !q.is_empty()),
        category: params.category.filter(|c| !c.is_empty()),
        price_min: params.price_min,
        price_max: params.price_max,
        alphabetical: params.sort.as_deref() == Some("alphabetical"),
    };
    let products = state.products.search(&query).await?;

    // Feeds the popular-products list; a failed bump never fails the search.
    for product in &products {
        if let Err(e) = state.searches.record(&product.id).await {
            log::warn!("search history update for {} failed: {e}", product.id);
        }
    }

    Ok(HttpResponse::Ok().json(json!({"products": products})))
}

pub async fn suggestions(
    state: web::Data<AppState>,
    params: web::Query<SuggestParams>,
) -> Result<HttpResponse, ApiError> {
    let q = match params.into_inner().q.filter(|q| !q.is_empty()) {
        Some(q) => q,
        None => return Ok(HttpResponse::Ok().json(json!([]))),
    };
    let products = state.products.suggest(&q, 5).await?;
    Ok(HttpResponse::Ok().json(products))
}
