// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::HashMap;

use chrono::{Duration, Utc};
use hotel_common::Employee;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Employee id.
    pub sub: String,
    pub username: String,
    pub role: String,
    /// Token id, used for revocation.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn employee_id(&self) -> Result<i64, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::Invalid("subject is not an employee id".to_string()))
    }
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to issue token: {0}")]
    Generation(String),
}

/// Issues and validates access tokens, and remembers revoked ones until
/// they would have expired anyway.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_minutes: i64,
    revoked: RwLock<HashMap<String, i64>>,
}

impl TokenService {
    pub fn new(secret: &str, expiration_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_minutes,
            revoked: RwLock::new(HashMap::new()),
        }
    }

    pub fn issue(&self, employee: &Employee) -> Result<String, TokenError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.expiration_minutes);
        let claims = Claims {
            sub: employee.id.to_string(),
            username: employee.username.clone(),
            role: employee.role.as_str().to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp", "iat"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            }
        })?;

        if self.revoked.read().contains_key(&data.claims.jti) {
            return Err(TokenError::Revoked);
        }
        Ok(data.claims)
    }

    pub fn revoke(&self, claims: &Claims) {
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.write();
        revoked.retain(|_, exp| *exp > now);
        revoked.insert(claims.jti.clone(), claims.exp);
    }

    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").map(str::trim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotel_common::EmployeeRole;

    fn employee() -> Employee {
        let now = Utc::now();
        Employee {
            id: 7,
            username: "jdoe".to_string(),
            password_hash: String::new(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            department_id: None,
            role: EmployeeRole::Receptionist,
            phone: String::new(),
            avatar_path: None,
            employee_number: None,
            hire_date: None,
            is_available: true,
            is_active: true,
            bio: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    #[test]
    fn issued_token_validates() {
        let service = TokenService::new(SECRET, 60);
        let token = service.issue(&employee()).unwrap();
        let claims = service.validate(&token).unwrap();
        assert_eq!(claims.employee_id().unwrap(), 7);
        assert_eq!(claims.role, "receptionist");
    }

    #[test]
    fn revoked_token_is_rejected() {
        let service = TokenService::new(SECRET, 60);
        let token = service.issue(&employee()).unwrap();
        let claims = service.validate(&token).unwrap();
        service.revoke(&claims);
        assert!(matches!(service.validate(&token), Err(TokenError::Revoked)));

        // Other tokens of the same employee stay valid.
        let other = service.issue(&employee()).unwrap();
        assert!(service.validate(&other).is_ok());
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let issuer = TokenService::new(SECRET, 60);
        let other = TokenService::new("another-secret-that-is-long-enough-too", 60);
        let token = issuer.issue(&employee()).unwrap();
        assert!(matches!(other.validate(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = TokenService::new(SECRET, -10);
        let token = service.issue(&employee()).unwrap();
        assert!(matches!(service.validate(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(TokenService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(TokenService::extract_from_header("Basic abc"), None);
    }
}
