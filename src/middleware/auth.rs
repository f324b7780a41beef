//! Authentication middleware
//!
//! Extractors that resolve the bearer token to a principal and apply the
//! role tiers. Every request runs the full chain; nothing is cached.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::auth::{AuthService, RolePolicy};
use crate::error::ApiError;
use crate::models::User;

/// Principal resolved from a valid access token
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::unauthorized())?;

        let auth_service = Arc::<AuthService>::from_ref(state);
        let user = auth_service.current_principal(bearer.token()).await?;

        Ok(AuthenticatedUser(user))
    }
}

async fn authorize_request<S>(
    parts: &mut Parts,
    state: &S,
    policy: RolePolicy,
) -> Result<User, ApiError>
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
    Ok(policy.authorize(user)?)
}

/// Principal with the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authorize_request(parts, state, RolePolicy::ADMIN_ONLY)
            .await
            .map(AdminUser)
    }
}

/// Principal with the seller or admin role
#[derive(Debug, Clone)]
pub struct SellerUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for SellerUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authorize_request(parts, state, RolePolicy::SELLER_OR_ADMIN)
            .await
            .map(SellerUser)
    }
}
