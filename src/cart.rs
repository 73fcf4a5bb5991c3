//! Server half of cart reconciliation. The client holds the guest cart and
//! replays adds after login; the server-held cart is authoritative for an
//! authenticated user. Every endpoint requires the path user to match the
//! token subject.

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::current_user;
use crate::models::{AddToCartInput, Cart, CartItem, RemoveItemInput};
use crate::state::AppState;
use crate::store::CartStore;

fn owned_cart_id(req: &HttpRequest, path_user_id: &str) -> Result<String, ApiError> {
    let user = current_user(req)?;
    if user.id != path_user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(user.id)
}

pub async fn get_cart(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = owned_cart_id(&req, &path.into_inner())?;
    let items = state
        .carts
        .find_by_user(&user_id)
        .await?
        .map(|cart| cart.items)
        .unwrap_or_default();
    Ok(HttpResponse::Ok().json(items))
}

/// Append one item. Duplicates by product id are allowed here; only the
/// guest-side cart de-duplicates.
pub async fn add_item(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    input: web::Json<AddToCartInput>,
) -> Result<HttpResponse, ApiError> {
    let user_id = owned_cart_id(&req, &path.into_inner())?;
    let item = input.into_inner().item;

    // Created lazily on first add.
    let mut cart = state.carts.find_by_user(&user_id).await?.unwrap_or(Cart {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.clone(),
        items: Vec::new(),
    });

    cart.items.push(CartItem {
        id: Uuid::new_v4().to_string(),
        product_id: item.product_id,
        name: item.name,
        price: item.price,
        image: item.image,
        seller_id: item.seller_id,
        seller_phone: item.seller_phone,
    });
    state.carts.save(&cart).await?;

    Ok(HttpResponse::Ok().json(json!({"success": true, "items": cart.items})))
}

/// Remove by item identity: the client sends either the cart line id or the
/// denormalized product id, whichever it holds.
pub async fn remove_item(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    input: web::Json<RemoveItemInput>,
) -> Result<HttpResponse, ApiError> {
    let user_id = owned_cart_id(&req, &path.into_inner())?;
    let mut cart = state
        .carts
        .find_by_user(&user_id)
        .await?
        .ok_or(ApiError::NotFound("Cart"))?;

    let target = input.into_inner().product_id;
    cart.items.retain(|item| {
        item.id != target && item.product_id.as_deref() != Some(target.as_str())
    });
    state.carts.save(&cart).await?;

    Ok(HttpResponse::Ok().json(json!({"success": true, "items": cart.items})))
}

pub async fn clear_cart(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = owned_cart_id(&req, &path.into_inner())?;
    state.carts.clear(&user_id).await?;
    Ok(HttpResponse::Ok().json(json!({"success": true, "message": "Cart cleared"})))
}
