use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use uuid::Uuid;

use crate::{
    error::IdentityError,
    identity::{IdentityProvider, RoleState, SessionState, UserMetadata},
};

/// Claims
///
/// The part of a Supabase-issued access token the portal relies on. Supabase signs
/// these with the project's JWT secret (HS256).
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user in `auth.users`.
    pub sub: Uuid,
    /// Expiration Time (exp): the token is rejected after this timestamp.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
    /// Free-form profile data; `is_admin` drives the admin gate.
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// AccessToken Extractor Result
///
/// The bearer token presented with a request, if any. Extraction never fails: a
/// missing or malformed `Authorization` header simply means an anonymous caller,
/// and the guard decides what an anonymous caller may see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessToken(pub Option<String>);

impl AccessToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for AccessToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AccessToken(bearer_token(&parts.headers).map(str::to_string)))
    }
}

/// bearer_token
///
/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// JwtIdentityProvider
///
/// Answers identity questions without a network round trip by verifying the
/// access token locally against the project JWT secret. Expiration is always
/// enforced. A token that fails verification is "no session", not a provider
/// failure, so this backend never returns `Err`.
#[derive(Clone)]
pub struct JwtIdentityProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(jwt_secret: &str) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        // Supabase tokens carry `aud: authenticated`; the portal does not pin it.
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    fn verify(&self, access_token: Option<&str>) -> Option<Claims> {
        let token = access_token?;
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("access token expired"),
                    kind => tracing::debug!(?kind, "access token rejected"),
                }
                None
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn get_session(
        &self,
        access_token: Option<&str>,
    ) -> Result<SessionState, IdentityError> {
        Ok(SessionState {
            is_authenticated: self.verify(access_token).is_some(),
        })
    }

    async fn get_user_role(
        &self,
        access_token: Option<&str>,
    ) -> Result<Option<RoleState>, IdentityError> {
        Ok(self.verify(access_token).map(|claims| RoleState {
            is_admin: claims.user_metadata.is_admin,
        }))
    }
}
