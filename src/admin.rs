//! Admin surface: aggregate stats and user/product/order management.
//! Mounted behind `AuthMiddleware` + `AdminGate`.

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::ApiError;
use crate::models::PublicUser;
use crate::state::AppState;
use crate::store::{OrderStore, ProductStore, UserStore};

pub async fn dashboard(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let total_users = state.users.count().await?;
    let total_products = state.products.count().await?;
    let total_orders = state.orders.count().await?;
    Ok(HttpResponse::Ok().json(json!({
        "totalUsers": total_users,
        "totalProducts": total_products,
        "totalOrders": total_orders,
    })))
}

pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users: Vec<PublicUser> = state
        .users
        .all()
        .await?
        .iter()
        .map(PublicUser::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

pub async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if !state.users.delete(&path.into_inner()).await? {
        return Err(ApiError::NotFound("User"));
    }
    Ok(HttpResponse::Ok().json(json!({"message": "User deleted successfully"})))
}

pub async fn list_products(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.products.all().await?))
}

pub async fn delete_product(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if !state.products.delete(&path.into_inner()).await? {
        return Err(ApiError::NotFound("Product"));
    }
    Ok(HttpResponse::Ok().json(json!({"message": "Product deleted successfully"})))
}

pub async fn list_orders(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.orders.all().await?))
}

pub async fn delete_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if !state.orders.delete(&path.into_inner()).await? {
        return Err(ApiError::NotFound("Order"));
    }
    Ok(HttpResponse::Ok().json(json!({"message": "Order deleted successfully"})))
}
