//! Local credential authentication: signup, email verification, login,
//! logout, and the session-info endpoints.

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use argon2::{self, Config as ArgonConfig};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use rand::Rng;
use serde_json::json;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;
use crate::middleware::current_user;
use crate::models::{
    Provider, PublicUser, ResendInput, Role, SignInInput, SignUpInput, User,
};
use crate::state::AppState;
use crate::store::UserStore;
use crate::token;

const VERIFICATION_TTL_HOURS: i64 = 1;

/// Every successful authentication, local or federated, collapses into one
/// of these; `establish_session` is the only place a session cookie is set.
#[derive(Debug)]
pub enum AuthOutcome {
    Local(PublicUser),
    Federated { user: PublicUser, created: bool },
}

impl AuthOutcome {
    pub fn user(&self) -> &PublicUser {
        match self {
            AuthOutcome::Local(user) => user,
            AuthOutcome::Federated { user, .. } => user,
        }
    }
}

/// Issue the session token, set the cookie, and answer the way each flow
/// requires: JSON for a local login, a redirect back to the client for a
/// provider callback.
pub fn establish_session(
    config: &Config,
    outcome: AuthOutcome,
) -> Result<HttpResponse, ApiError> {
    let signed = token::issue(&config.jwt_secret, outcome.user())
        .map_err(|e| ApiError::Internal(format!("token encoding failed: {e}")))?;
    let cookie = token::session_cookie(config, signed);

    Ok(match outcome {
        AuthOutcome::Local(user) => HttpResponse::Ok().cookie(cookie).json(json!({
            "user": {"id": user.id, "username": user.username, "email": user.email}
        })),
        AuthOutcome::Federated { user, created } => {
            log::info!(
                "federated login for {} ({})",
                user.email,
                if created { "new account" } else { "existing account" }
            );
            HttpResponse::Found()
                .cookie(cookie)
                .append_header((header::LOCATION, config.client_url.clone()))
                .finish()
        }
    })
}

/// Admin membership is seeded from the configured address at account
/// creation; authorization afterwards only ever reads the stored role.
pub fn assign_role(config: &Config, email: &str) -> Role {
    if email.eq_ignore_ascii_case(&config.admin_email) {
        Role::Admin
    } else {
        Role::User
    }
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt: [u8; 16] = rand::thread_rng().gen();
    argon2::hash_encoded(password.as_bytes(), &salt, &ArgonConfig::default())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// 32 random bytes, URL-safe encoded: opaque and link-embeddable.
fn random_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    match (parts.next(), parts.next()) {
        (Some(local), Some(domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

fn verification_body(link: &str) -> String {
    format!("Click here to verify your account: <a href=\"{link}\">{link}</a>")
}

fn verification_link(config: &Config, token: &str) -> String {
    format!("{}/verify/{}", config.client_url, token)
}

pub async fn signup(
    state: web::Data<AppState>,
    input: web::Json<SignUpInput>,
) -> Result<HttpResponse, ApiError> {
    let username = input.username.trim().to_string();
    let email = input.email.trim().to_lowercase();

    if username.len() < 3 || username.len() > 50 {
        return Err(ApiError::InvalidInput(
            "Username must be between 3 and 50 characters".into(),
        ));
    }
    if !valid_email(&email) {
        return Err(ApiError::InvalidInput(
            "Please enter a valid email address".into(),
        ));
    }
    if input.password.is_empty() {
        return Err(ApiError::InvalidInput("Password is required".into()));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::DuplicateEmail);
    }

    let verification_token = random_token();
    let role = assign_role(&state.config, &email);
    let user = User {
        id: Uuid::new_v4().to_string(),
        username,
        email,
        password: Some(hash_password(&input.password)?),
        role,
        google_id: None,
        provider: Provider::Local,
        is_verified: false,
        verification_token: Some(verification_token.clone()),
        verification_token_expires: Some(Utc::now() + Duration::hours(VERIFICATION_TTL_HOURS)),
        created_at: Utc::now(),
    };
    state.users.create(&user).await?;

    // Delivery is decoupled from the response: the account exists either
    // way and the resend endpoint covers a lost email.
    let mailer = state.mailer.clone();
    let link = verification_link(&state.config, &verification_token);
    let to = user.email.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = mailer
            .send(&to, "Verify Your Email", &verification_body(&link))
            .await
        {
            log::error!("verification email to {to} failed: {e}");
        }
    });

    Ok(HttpResponse::Created().json(json!({
        "message": "User registered. Please check your email to verify."
    })))
}

pub async fn verify_email(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let raw = path.into_inner();
    let mut user = state
        .users
        .find_by_verification_token(&raw)
        .await?
        .ok_or(ApiError::InvalidOrExpiredToken)?;

    let expires = user
        .verification_token_expires
        .ok_or(ApiError::InvalidOrExpiredToken)?;
    if expires < Utc::now() {
        return Err(ApiError::InvalidOrExpiredToken);
    }

    // Single use: the token fields must not survive a successful check.
    user.is_verified = true;
    user.verification_token = None;
    user.verification_token_expires = None;
    state.users.save(&user).await?;

    Ok(HttpResponse::Ok().json(json!({"message": "Email verified successfully!"})))
}

pub async fn resend_verification(
    state: web::Data<AppState>,
    input: web::Json<ResendInput>,
) -> Result<HttpResponse, ApiError> {
    let email = input.email.trim().to_lowercase();
    let mut user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    if user.is_verified {
        return Err(ApiError::AlreadyVerified);
    }

    // Overwriting invalidates any previously issued token.
    let verification_token = random_token();
    user.verification_token = Some(verification_token.clone());
    user.verification_token_expires = Some(Utc::now() + Duration::hours(VERIFICATION_TTL_HOURS));
    state.users.save(&user).await?;

    let link = verification_link(&state.config, &verification_token);
    state
        .mailer
        .send(&user.email, "Verify Your Email (Resent)", &verification_body(&link))
        .await?;

    Ok(HttpResponse::Ok().json(json!({"message": "Verification email resent"})))
}

pub async fn login(
    state: web::Data<AppState>,
    input: web::Json<SignInInput>,
) -> Result<HttpResponse, ApiError> {
    let email = input.email.trim().to_lowercase();
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let hash = user.password.as_deref().ok_or(ApiError::InvalidCredentials)?;
    if !argon2::verify_encoded(hash, input.password.as_bytes()).unwrap_or(false) {
        return Err(ApiError::InvalidCredentials);
    }
    if !user.is_verified {
        return Err(ApiError::NotVerified);
    }

    establish_session(&state.config, AuthOutcome::Local(PublicUser::from(&user)))
}

/// Client-side logout: the cookie is cleared, the token itself stays valid
/// until its natural expiry.
pub async fn logout(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok()
        .cookie(token::removal_cookie(&state.config))
        .json(json!({"message": "Logged out successfully"})))
}

pub async fn me(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let user = current_user(&req)?;
    Ok(HttpResponse::Ok().json(json!({"user": user})))
}

pub async fn is_admin(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let user = current_user(&req)?;
    Ok(HttpResponse::Ok().json(json!({"isAdmin": user.role == Role::Admin})))
}
