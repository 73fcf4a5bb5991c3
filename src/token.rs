//! Session token issue/verify and the cookie that carries it.
//!
//! Tokens are self-contained HS256 JWTs: verification is a pure function of
//! the token and the signing secret. There is no server-side revocation;
//! a token stays valid until its embedded expiry.

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::config::Config;
use crate::models::{Claims, PublicUser};

pub const SESSION_COOKIE: &str = "token";
pub const SESSION_TTL_DAYS: i64 = 7;

pub fn issue(secret: &str, user: &PublicUser) -> Result<String, jsonwebtoken::errors::Error> {
    issue_with_expiry(secret, user, Utc::now() + Duration::days(SESSION_TTL_DAYS))
}

pub fn issue_with_expiry(
    secret: &str,
    user: &PublicUser,
    expires_at: DateTime<Utc>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        username: Some(user.username.clone()),
        exp: expires_at.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

/// Fails on a bad signature, a malformed token, or a passed expiry. No
/// leeway: expiry is exact to the second.
pub fn verify(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
}

/// The `token` cookie, expiring together with the claims it carries.
pub fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.production)
        .max_age(CookieDuration::days(SESSION_TTL_DAYS))
        .finish()
}

/// An expired `token` cookie, for logout.
pub fn removal_cookie(config: &Config) -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.production)
        .finish();
    cookie.make_removal();
    cookie
}
