use std::rc::Rc;

use actix_service::{forward_ready, Service};
use actix_web::body::EitherBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, HttpMessage, HttpRequest, ResponseError};
use futures::future::{ok, LocalBoxFuture, Ready};

use crate::error::ApiError;
use crate::models::{PublicUser, Role};
use crate::state::AppState;
use crate::store::UserStore;
use crate::token;

/// Resolve the session cookie to a full identity: verify the token, then
/// re-fetch the account so a deleted user holding a still-valid token is
/// turned away (`UserGone`). The password hash never leaves the store.
pub async fn identify(
    cookie: Option<Cookie<'_>>,
    state: &AppState,
) -> Result<PublicUser, ApiError> {
    let cookie = cookie.ok_or(ApiError::Unauthenticated)?;
    let claims = token::verify(&state.config.jwt_secret, cookie.value())
        .map_err(|_| ApiError::Unauthenticated)?;
    let user = state
        .users
        .find_by_id(&claims.sub)
        .await?
        .ok_or(ApiError::UserGone)?;
    Ok(PublicUser::from(&user))
}

/// Read the identity attached by `AuthMiddleware`.
pub fn current_user(req: &HttpRequest) -> Result<PublicUser, ApiError> {
    req.extensions()
        .get::<PublicUser>()
        .cloned()
        .ok_or(ApiError::Unauthenticated)
}

/// Answer for a rejected request without invoking the wrapped service.
fn reject<B>(req: ServiceRequest, err: ApiError) -> ServiceResponse<EitherBody<B>> {
    let response = err.error_response().map_into_right_body();
    req.into_response(response)
}

/// Middleware factory protecting a scope or resource: requests without a
/// resolvable identity never reach the handler.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService { service: Rc::new(service) })
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let state = match req.app_data::<web::Data<AppState>>().cloned() {
                Some(state) => state,
                None => {
                    return Ok(reject(
                        req,
                        ApiError::Internal("application state missing".into()),
                    ))
                }
            };

            match identify(req.request().cookie(token::SESSION_COOKIE), &state).await {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    service
                        .call(req)
                        .await
                        .map(|res| res.map_into_left_body())
                }
                Err(err) => Ok(reject(req, err)),
            }
        })
    }
}

/// Requires an identity already attached by `AuthMiddleware` whose stored
/// role is `admin`. Register inside an `AuthMiddleware` wrap.
pub struct AdminGate;

impl<S, B> Transform<S, ServiceRequest> for AdminGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AdminGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AdminGateService { service: Rc::new(service) })
    }
}

pub struct AdminGateService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AdminGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let role = req.extensions().get::<PublicUser>().map(|u| u.role);

        Box::pin(async move {
            let err = match role {
                Some(Role::Admin) => {
                    return service
                        .call(req)
                        .await
                        .map(|res| res.map_into_left_body())
                }
                Some(_) => ApiError::Forbidden,
                None => ApiError::Unauthenticated,
            };
            Ok(reject(req, err))
        })
    }
}
