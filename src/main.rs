use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};

mod admin;
mod auth;
mod cart;
mod config;
mod db;
mod error;
mod mail;
mod middleware;
mod models;
mod oauth;
mod orders;
mod products;
mod search;
mod state;
mod store;
#[cfg(test)]
mod test_util;
mod token;
mod users;

use config::Config;
use mail::SmtpMailer;
use middleware::{AdminGate, AuthMiddleware};
use state::AppState;
use store::mongo::{
    MongoCartStore, MongoOrderStore, MongoProductStore, MongoSearchStore, MongoUserStore,
};

/// The whole API surface. Listing routes are public; session-scoped routes
/// sit behind `AuthMiddleware`, the admin scope additionally behind
/// `AdminGate`. Product mutations share paths with public listings and
/// resolve the session in their handlers instead.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/signup", web::post().to(auth::signup))
            .route("/verify/{token}", web::get().to(auth::verify_email))
            .route("/resend-verification", web::post().to(auth::resend_verification))
            .route("/login", web::post().to(auth::login))
            .route("/logout", web::post().to(auth::logout))
            .route("/auth/google", web::get().to(oauth::google_login))
            .route("/auth/google/callback", web::get().to(oauth::google_callback))
            .service(
                web::resource("/auth/me")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(auth::me)),
            )
            .service(
                web::resource("/auth/is-admin")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(auth::is_admin)),
            )
            .service(
                web::scope("/cart")
                    .wrap(AuthMiddleware)
                    .route("/{user_id}", web::get().to(cart::get_cart))
                    .route("/{user_id}", web::post().to(cart::add_item))
                    .route("/{user_id}/remove", web::post().to(cart::remove_item))
                    .route("/{user_id}/clear", web::post().to(cart::clear_cart)),
            )
            .service(
                web::scope("/orders")
                    .wrap(AuthMiddleware)
                    .route("/create", web::post().to(orders::create_order))
                    .route("/myorders", web::get().to(orders::my_orders)),
            )
            .service(
                web::scope("/admin")
                    .wrap(AdminGate)
                    .wrap(AuthMiddleware)
                    .route("/dashboard", web::get().to(admin::dashboard))
                    .route("/users", web::get().to(admin::list_users))
                    .route("/users/{id}", web::delete().to(admin::delete_user))
                    .route("/products", web::get().to(admin::list_products))
                    .route("/products/{id}", web::delete().to(admin::delete_product))
                    .route("/orders", web::get().to(admin::list_orders))
                    .route("/orders/{id}", web::delete().to(admin::delete_order)),
            )
            .route("/products", web::get().to(products::list_products))
            .route("/products/homepage", web::get().to(products::homepage))
            .route("/products", web::post().to(products::create_product))
            .route("/products/{id}", web::put().to(products::update_product))
            .route("/products/{id}", web::delete().to(products::delete_product))
            .route("/search", web::get().to(search::search_products))
            .route("/search/suggestions", web::get().to(search::suggestions))
            .route("/popular-products", web::get().to(products::popular_products))
            .route("/users", web::get().to(users::list_users))
            .route("/users/{id}", web::get().to(users::get_user)),
    );
}

async fn index() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "second-chance",
        "status": "ok",
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let db = db::connect(&config).await;
    log::info!("connected to MongoDB database {}", config.database_name);

    let mailer = match SmtpMailer::new(&config.smtp) {
        Ok(mailer) => mailer,
        Err(e) => {
            log::error!("mailer setup failed: {e}");
            std::process::exit(1);
        }
    };

    let state = web::Data::new(AppState {
        config: config.clone(),
        users: Arc::new(MongoUserStore::new(&db)),
        products: Arc::new(MongoProductStore::new(&db)),
        carts: Arc::new(MongoCartStore::new(&db)),
        orders: Arc::new(MongoOrderStore::new(&db)),
        searches: Arc::new(MongoSearchStore::new(&db)),
        mailer: Arc::new(mailer),
    });

    let bind_addr = config.bind_addr.clone();
    let client_url = config.client_url.clone();
    log::info!("listening on {bind_addr}");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&client_url)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .route("/", web::get().to(index))
            .configure(routes)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
