//! OIDC bearer-token verification for the admin HTTP surface (SPEC_FULL.md
//! §4.10).

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("missing or malformed bearer token")]
    MissingToken,

    #[error("token verification failed: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub exp: usize,
}

/// Verifies a bearer token against `issuer` using a fixed decoding key.
///
/// Pragmatic depth: this does not fetch and cache the issuer's JWKS over
/// HTTP (out of scope for this core); it verifies signature, expiry, and
/// issuer against a key supplied by the caller, keeping key material
/// separate from verification logic.
pub fn verify_bearer_token(token: &str, issuer: &str, decoding_key: &DecodingKey) -> Result<Claims, AuthError> {
    let header = decode_header(token)?;
    let mut validation = Validation::new(header.alg.unwrap_or(Algorithm::RS256));
    validation.set_issuer(&[issuer]);

    let data = decode::<Claims>(token, decoding_key, &validation)?;
    Ok(data.claims)
}

/// Extracts the bearer token from an `Authorization` header value.
pub fn extract_bearer(header_value: Option<&str>) -> Result<&str, AuthError> {
    header_value
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_is_an_error() {
        assert!(matches!(extract_bearer(None), Err(AuthError::MissingToken)));
    }

    #[test]
    fn non_bearer_scheme_is_an_error() {
        assert!(matches!(extract_bearer(Some("Basic abc123")), Err(AuthError::MissingToken)));
    }

    #[test]
    fn well_formed_bearer_header_is_extracted() {
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }
}
