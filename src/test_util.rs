//! Shared helpers for the HTTP scenario tests: in-memory state, app
//! construction, and seeded accounts/sessions.

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::web;
use chrono::Utc;
use uuid::Uuid;

use crate::auth;
use crate::config;
use crate::mail::recording::RecordingMailer;
use crate::models::{Product, Provider, PublicUser, User};
use crate::state::AppState;
use crate::store::{ProductStore, UserStore};
use crate::store::memory::{
    MemoryCartStore, MemoryOrderStore, MemoryProductStore, MemorySearchStore,
    MemoryUserStore,
};
use crate::token;

pub fn test_state() -> (web::Data<AppState>, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState {
        config: config::test_config(),
        users: Arc::new(MemoryUserStore::default()),
        products: Arc::new(MemoryProductStore::default()),
        carts: Arc::new(MemoryCartStore::default()),
        orders: Arc::new(MemoryOrderStore::default()),
        searches: Arc::new(MemorySearchStore::default()),
        mailer: mailer.clone(),
    };
    (web::Data::new(state), mailer)
}

/// Build the full application against the given state. A macro so the
/// opaque service type never needs naming.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .configure(crate::routes),
        )
        .await
    };
}
pub(crate) use test_app;

pub fn session_cookie_of<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == token::SESSION_COOKIE)
        .map(|c| c.into_owned())
}

pub async fn seed_verified_user(
    state: &web::Data<AppState>,
    username: &str,
    email: &str,
    password: &str,
) -> User {
    let email = email.to_lowercase();
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: email.clone(),
        password: Some(auth::hash_password(password).unwrap()),
        role: auth::assign_role(&state.config, &email),
        google_id: None,
        provider: Provider::Local,
        is_verified: true,
        verification_token: None,
        verification_token_expires: None,
        created_at: Utc::now(),
    };
    state.users.create(&user).await.unwrap();
    user
}

/// Session cookie for an existing account, as a logged-in client would hold.
pub fn session_for(state: &web::Data<AppState>, user: &User) -> Cookie<'static> {
    let signed = token::issue(&state.config.jwt_secret, &PublicUser::from(user)).unwrap();
    token::session_cookie(&state.config, signed)
}

/// Seed a verified account and hand back its session cookie.
pub async fn login_user(
    state: &web::Data<AppState>,
    username: &str,
    email: &str,
    password: &str,
) -> Cookie<'static> {
    let user = seed_verified_user(state, username, email, password).await;
    session_for(state, &user)
}

pub async fn seed_product(
    state: &web::Data<AppState>,
    name: &str,
    category: &str,
    price: f64,
    seller_id: &str,
) -> Product {
    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: format!("{name} in good condition"),
        category: category.to_string(),
        price,
        image: Some("https://images.example/p.jpg".to_string()),
        seller_id: seller_id.to_string(),
        seller_phone: "+254700000000".to_string(),
        created_at: Utc::now(),
    };
    state.products.insert(&product).await.unwrap();
    product
}
