//! Header-based identity extractors
//!
//! The gateway in front of this service authenticates the caller and
//! forwards who they are in `X-User-Id`, `X-User-Name` and `X-User-Role`.

use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use govgpt_core::{UserIdentity, UserRole};
use tracing::debug;

use crate::WebError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// An identified caller whose account is active
#[derive(Debug, Clone)]
pub struct VerifiedUser(pub UserIdentity);

/// A caller whose role is `admin`
#[derive(Debug, Clone)]
pub struct AdminUser(pub UserIdentity);

impl<S> FromRequestParts<S> for VerifiedUser
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = identity_from_headers(&parts.headers)
            .ok_or_else(|| WebError::Unauthorized("Not authenticated".to_string()))?;
        if user.role == UserRole::Pending {
            return Err(WebError::Unauthorized("Access prohibited".to_string()));
        }
        Ok(VerifiedUser(user))
    }
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let VerifiedUser(user) = VerifiedUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            debug!(user_id = %user.id, "Admin route refused");
            return Err(WebError::Forbidden("Access prohibited".to_string()));
        }
        Ok(AdminUser(user))
    }
}

/// Build the caller identity; `None` when no user id was forwarded
pub fn identity_from_headers(headers: &HeaderMap) -> Option<UserIdentity> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let id = header(USER_ID_HEADER)?;
    let name = header(USER_NAME_HEADER).unwrap_or(id);
    let role = header(USER_ROLE_HEADER)
        .map(UserRole::parse)
        .unwrap_or_default();

    Some(UserIdentity::new(id, name, role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request, StatusCode};

    fn parts(headers: &[(&'static str, &'static str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, HeaderValue::from_static(value));
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_missing_user_id_is_unauthorized() {
        let mut parts = parts(&[(USER_ROLE_HEADER, "admin")]);
        let err = VerifiedUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_verified_user_defaults() {
        let mut parts = parts(&[(USER_ID_HEADER, "u-1")]);
        let VerifiedUser(user) = VerifiedUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.name, "u-1");
        assert_eq!(user.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_pending_user_is_refused() {
        let mut parts = parts(&[(USER_ID_HEADER, "u-2"), (USER_ROLE_HEADER, "pending")]);
        let err = VerifiedUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_requires_role() {
        let mut user_parts = parts(&[(USER_ID_HEADER, "u-1"), (USER_ROLE_HEADER, "user")]);
        let err = AdminUser::from_request_parts(&mut user_parts, &()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let mut admin_parts = parts(&[
            (USER_ID_HEADER, "root"),
            (USER_NAME_HEADER, "Root"),
            (USER_ROLE_HEADER, "admin"),
        ]);
        let AdminUser(admin) = AdminUser::from_request_parts(&mut admin_parts, &()).await.unwrap();
        assert_eq!(admin.name, "Root");
        assert!(admin.is_admin());
    }
}
