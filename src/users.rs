//! Public user lookups, password-free.

use actix_web::{web, HttpResponse};

use crate::error::ApiError;
use crate::models::PublicUser;
use crate::state::AppState;
use crate::store::UserStore;

pub async fn get_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = state
        .users
        .find_by_id(&path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(HttpResponse::Ok().json(PublicUser::from(&user)))
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
