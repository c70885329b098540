use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::jwt::{SessionKeys, TokenError};
use crate::{error::ApiError, state::AppState, users::Role};

/// Identity of the caller, placed in request extensions by [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            warn!(user_id = self.id, "admin role required");
            Err(ApiError::forbidden("Forbidden"))
        }
    }
}

/// Resolves the bearer token in `headers` to an identity.
pub fn authenticate(headers: &HeaderMap, keys: &SessionKeys) -> Result<AuthUser, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    let header = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid authorization format"))?;

    let mut parts = header.split(' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default();
    if scheme != "Bearer" || token.is_empty() {
        return Err(ApiError::unauthorized("Invalid authorization format"));
    }

    let payload = keys.verify(token).map_err(|e| match e {
        TokenError::InvalidPayload => {
            warn!("session token payload has unexpected shape");
            ApiError::unauthorized("Invalid token payload")
        }
        TokenError::Invalid(err) => {
            warn!(error = %err, "session token rejected");
            ApiError::unauthorized("Invalid or expired token")
        }
    })?;

    Ok(AuthUser {
        id: payload.id,
        email: payload.email,
        role: payload.role,
    })
}

/// Route layer for protected groups: rejects with 401 before any handler runs.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let keys = SessionKeys::from_ref(&state);
    let user = authenticate(req.headers(), &keys)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

/// An [`AuthUser`] with the admin role. Rejects with 403 before later
/// extractors (such as the body) run.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.require_admin()?;
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::SessionPayload;
    use axum::http::HeaderValue;

    fn keys() -> SessionKeys {
        SessionKeys::from_config(&AppState::test_config().jwt)
    }

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    fn message(err: ApiError) -> String {
        match err {
            ApiError::Unauthorized(msg) => msg,
            other => panic!("expected 401, got {other:?}"),
        }
    }

    #[test]
    fn missing_header() {
        let err = authenticate(&HeaderMap::new(), &keys()).unwrap_err();
        assert_eq!(message(err), "Unauthorized");
    }

    #[test]
    fn wrong_scheme_or_missing_token() {
        for value in ["Basic abc", "bearer abc", "Bearer", "Bearer ", "Token"] {
            let err = authenticate(&headers(value), &keys()).unwrap_err();
            assert_eq!(message(err), "Invalid authorization format", "{value}");
        }
    }

    #[test]
    fn bad_token() {
        let err = authenticate(&headers("Bearer nonsense"), &keys()).unwrap_err();
        assert_eq!(message(err), "Invalid or expired token");
    }

    #[test]
    fn valid_token_yields_identity() {
        let keys = keys();
        let token = keys
            .sign(&SessionPayload {
                id: 3,
                email: "ana@example.com".into(),
                role: Role::Admin,
            })
            .unwrap();
        let user = authenticate(&headers(&format!("Bearer {token}")), &keys).unwrap();
        assert_eq!(user.id, 3);
        assert!(user.is_admin());
        assert!(user.require_admin().is_ok());
    }

    #[tokio::test]
    async fn admin_extractor_checks_role() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        parts.extensions.insert(AuthUser {
            id: 2,
            email: "u@example.com".into(),
            role: Role::User,
        });
        let err = AdminUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        parts.extensions.insert(AuthUser {
            id: 3,
            email: "a@example.com".into(),
            role: Role::Admin,
        });
        let AdminUser(admin) = AdminUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(admin.id, 3);
    }

    #[test]
    fn non_admin_is_forbidden() {
        let user = AuthUser {
            id: 1,
            email: "u@example.com".into(),
            role: Role::User,
        };
        assert!(matches!(user.require_admin(), Err(ApiError::Forbidden(_))));
    }
}
