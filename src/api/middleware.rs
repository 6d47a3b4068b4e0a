use crate::api::AppState;
use crate::domain::user::Claims;
use crate::error::AppError;
use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, Request, header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Extractor for endpoints that require a store-issued bearer token.
#[derive(Debug)]
pub struct AuthUser {
    pub claims: Claims,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts.headers.get(header::AUTHORIZATION).ok_or(AppError::AuthError)?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::AuthError)?;
        let token = auth_str.strip_prefix("Bearer ").ok_or(AppError::AuthError)?;

        let claims = verify_store_token(token, &state.config.store.jwt_secret)?;

        Ok(Self { claims })
    }
}

/// Verifies a store-issued access token. The store sets an audience claim we
/// do not own, so audience validation stays off.
///
/// # Errors
/// `AppError::AuthError` for any invalid, expired, or malformed token.
pub fn verify_store_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|_| AppError::AuthError)?;

    Ok(token_data.claims)
}

/// Propagates an incoming `x-request-id` or mints a fresh UUID.
#[derive(Clone, Copy, Debug)]
pub struct MakeRequestUuidOrHeader;

impl MakeRequestId for MakeRequestUuidOrHeader {
    fn make_request_id<B>(&mut self, request: &Request<B>) -> Option<RequestId> {
        if let Some(incoming) = request.headers().get("x-request-id") {
            return Some(RequestId::new(incoming.clone()));
        }
        HeaderValue::from_str(&Uuid::new_v4().to_string()).ok().map(RequestId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    #[test]
    fn test_verify_roundtrip() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            exp: 2_000_000_000,
            email: Some("user@example.com".to_string()),
            role: Some("authenticated".to_string()),
            created_at: None,
        };
        let token =
            encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).expect("encode");

        let decoded = verify_store_token(&token, "secret").expect("verify");
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.email, claims.email);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            exp: 2_000_000_000,
            email: None,
            role: None,
            created_at: None,
        };
        let token =
            encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret1")).expect("encode");

        assert!(matches!(verify_store_token(&token, "secret2"), Err(AppError::AuthError)));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            exp: 1_000, // long past
            email: None,
            role: None,
            created_at: None,
        };
        let token =
            encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).expect("encode");

        assert!(matches!(verify_store_token(&token, "secret"), Err(AppError::AuthError)));
    }
}
