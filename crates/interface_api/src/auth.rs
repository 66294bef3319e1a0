//! Authentication
//!
//! Bearer JWTs carry the caller's identity in `sub` and the role labels
//! issued by the identity provider in `roles`. The first label that maps
//! onto a claims workflow [`Role`] becomes the caller's role.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use domain_claims::{Caller, Role};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (lecturer id or staff login)
    pub sub: String,
    /// Role labels, e.g. `Lecturer`, `ProgrammeCoordinator`, `HR`
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token carries no claims workflow role")]
    NoKnownRole,
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `roles` - User's role labels
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Resolves the workflow caller from validated token claims
pub fn caller_from_claims(claims: &Claims) -> Result<Caller, AuthError> {
    if claims.sub.trim().is_empty() {
        return Err(AuthError::InvalidToken);
    }
    let role = claims
        .roles
        .iter()
        .find_map(|label| label.parse::<Role>().ok())
        .ok_or(AuthError::NoKnownRole)?;
    Ok(Caller::new(claims.sub.trim(), role))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip_resolves_caller() {
        let token = create_token("pc.naidoo", vec!["ProgrammeCoordinator".to_string()], SECRET, 60)
            .unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        let caller = caller_from_claims(&claims).unwrap();
        assert_eq!(caller.identity, "pc.naidoo");
        assert_eq!(caller.role, Role::Coordinator);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token("L1", vec!["Lecturer".to_string()], SECRET, 60).unwrap();
        assert!(matches!(
            validate_token(&token, "other"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_unrecognised_roles_rejected() {
        let claims = Claims {
            sub: "x".to_string(),
            roles: vec!["admin".to_string()],
            exp: 0,
            iat: 0,
        };
        assert!(matches!(caller_from_claims(&claims), Err(AuthError::NoKnownRole)));
    }
}
