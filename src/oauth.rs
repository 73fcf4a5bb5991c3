//! Google OAuth2 federated login (authorization-code flow).
//!
//! Accounts are resolved by the verified email claim, not the provider
//! subject id: an email matching an existing account links the Google id
//! onto it, anything else creates a new, already-verified account.

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::auth::{assign_role, establish_session, AuthOutcome};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{Provider, PublicUser, User};
use crate::state::AppState;
use crate::store::UserStore;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Short-lived cookie mirroring the `state` parameter across the redirect.
const STATE_COOKIE: &str = "oauth_state";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Subset of the userinfo response this flow needs.
#[derive(Debug, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

fn redirect_uri(config: &Config) -> String {
    format!("{}/api/auth/google/callback", config.server_url)
}

fn authorization_url(config: &Config, state: &str) -> Result<String, ApiError> {
    let mut url = Url::parse(GOOGLE_AUTH_URL)
        .map_err(|e| ApiError::Internal(format!("invalid auth URL: {e}")))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("client_id", &config.google.client_id);
        query.append_pair("redirect_uri", &redirect_uri(config));
        query.append_pair("response_type", "code");
        query.append_pair("scope", "openid email profile");
        query.append_pair("state", state);
        query.append_pair("prompt", "select_account");
    }
    Ok(url.to_string())
}

fn state_cookie(config: &Config, value: String) -> Cookie<'static> {
    Cookie::build(STATE_COOKIE, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.production)
        .max_age(CookieDuration::minutes(10))
        .finish()
}

fn state_removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(STATE_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}

pub async fn google_login(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    let csrf = URL_SAFE_NO_PAD.encode(bytes);
    let url = authorization_url(&state.config, &csrf)?;
    Ok(HttpResponse::Found()
        .cookie(state_cookie(&state.config, csrf))
        .append_header((header::LOCATION, url))
        .finish())
}

async fn exchange_code(config: &Config, code: &str) -> Result<String, ApiError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| ApiError::Provider(format!("failed to create HTTP client: {e}")))?;

    let response = client
        .post(GOOGLE_TOKEN_URL)
        .form(&TokenRequest {
            code,
            client_id: &config.google.client_id,
            client_secret: &config.google.client_secret,
            redirect_uri: &redirect_uri(config),
            grant_type: "authorization_code",
        })
        .send()
        .await
        .map_err(|e| ApiError::Provider(format!("token request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Provider(format!(
            "token request failed with status {status}: {body}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| ApiError::Provider(format!("failed to parse token response: {e}")))?;
    Ok(token.access_token)
}

async fn fetch_profile(access_token: &str) -> Result<GoogleProfile, ApiError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| ApiError::Provider(format!("failed to create HTTP client: {e}")))?;

    let response = client
        .get(GOOGLE_USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| ApiError::Provider(format!("userinfo request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Provider(format!(
            "userinfo request failed with status {status}: {body}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| ApiError::Provider(format!("failed to parse userinfo: {e}")))
}

/// Resolve a provider profile to a local account, by email.
pub(crate) async fn resolve_profile(
    state: &AppState,
    profile: GoogleProfile,
) -> Result<AuthOutcome, ApiError> {
    let email = profile
        .email
        .filter(|e| !e.is_empty())
        .ok_or(ApiError::MissingEmail)?
        .to_lowercase();

    match state.users.find_by_email(&email).await? {
        Some(mut user) => {
            // Non-destructive merge: a local signup keeps its account and
            // history when the same email later arrives via Google.
            if user.google_id.is_none() {
                user.google_id = Some(profile.sub);
                state.users.save(&user).await?;
            }
            Ok(AuthOutcome::Federated {
                user: PublicUser::from(&user),
                created: false,
            })
        }
        None => {
            let username = profile
                .name
                .unwrap_or_else(|| email.split('@').next().unwrap_or("user").to_string());
            let role = assign_role(&state.config, &email);
            let user = User {
                id: Uuid::new_v4().to_string(),
                username,
                email,
                password: None,
                role,
                google_id: Some(profile.sub),
                provider: Provider::Google,
                // The provider asserts ownership of the email; no separate
                // verification round-trip.
                is_verified: true,
                verification_token: None,
                verification_token_expires: None,
                created_at: Utc::now(),
            };
            state.users.create(&user).await?;
            Ok(AuthOutcome::Federated {
                user: PublicUser::from(&user),
                created: true,
            })
        }
    }
}

async fn callback_flow(
    req: &HttpRequest,
    state: &AppState,
    query: &CallbackQuery,
) -> Result<AuthOutcome, ApiError> {
    if let Some(err) = &query.error {
        return Err(ApiError::Provider(format!("provider returned error: {err}")));
    }

    let expected = req
        .cookie(STATE_COOKIE)
        .ok_or_else(|| ApiError::InvalidInput("Missing OAuth state".into()))?;
    let presented = query
        .state
        .as_deref()
        .ok_or_else(|| ApiError::InvalidInput("Missing OAuth state".into()))?;
    if expected.value() != presented {
        return Err(ApiError::InvalidInput("OAuth state mismatch".into()));
    }

    let code = query
        .code
        .as_deref()
        .ok_or_else(|| ApiError::InvalidInput("Missing authorization code".into()))?;
    let access_token = exchange_code(&state.config, code).await?;
    let profile = fetch_profile(&access_token).await?;
    resolve_profile(state, profile).await
}

/// Callback contract is a redirect either way: to the client app on
/// success (cookie set), to its login page on failure.
pub async fn google_callback(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<CallbackQuery>,
) -> HttpResponse {
    match callback_flow(&req, state.get_ref(), &query).await {
        Ok(outcome) => match establish_session(&state.config, outcome) {
            Ok(mut resp) => {
                let _ = resp.add_cookie(&state_removal_cookie());
                resp
            }
            Err(e) => failure_redirect(&state.config, &e),
        },
        Err(e) => failure_redirect(&state.config, &e),
    }
}

fn failure_redirect(config: &Config, err: &ApiError) -> HttpResponse {
    log::error!("google login failed: {err}");
    let mut resp = HttpResponse::Found()
        .append_header((header::LOCATION, format!("{}/login", config.client_url)))
        .finish();
    let _ = resp.add_cookie(&state_removal_cookie());
    resp
}
