//! Order placement and retrieval. An order is an immutable snapshot of the
//! purchased products; the cart is cleared by the client only after the
//! order is confirmed created, so a failed submission loses nothing.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::current_user;
use crate::models::{CreateOrderInput, Order};
use crate::state::AppState;
use crate::store::OrderStore;

pub async fn create_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    input: web::Json<CreateOrderInput>,
) -> Result<HttpResponse, ApiError> {
    let user = current_user(&req)?;
    let input = input.into_inner();

    if input.products.is_empty() || input.total_price <= 0.0 {
        return Err(ApiError::InvalidInput(
            "Products and total price are required".into(),
        ));
    }
    for product in &input.products {
        if product.seller_id.trim().is_empty() || product.seller_phone.trim().is_empty() {
            return Err(ApiError::InvalidInput(format!(
                "Product \"{}\" is missing seller information",
                product.name
            )));
        }
    }

    let order = Order {
        id: Uuid::new_v4().to_string(),
        buyer_id: user.id,
        products: input.products,
        total_price: input.total_price,
        status: "Pending".to_string(),
        created_at: Utc::now(),
    };
    state.orders.insert(&order).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Order placed successfully!",
        "order": order,
    })))
}

pub async fn my_orders(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let user = current_user(&req)?;
    let orders = state.orders.find_by_buyer(&user.id).await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "orders": orders})))
}
