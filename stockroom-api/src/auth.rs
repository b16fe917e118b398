use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PRODUCTS_READ: &str = "products:read";
pub const ORDERS_READ: &str = "orders:read";

// ============================================================================
// JWT Claims
// ============================================================================

/// Request metadata attached to read responses. Carries no identity.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MetadataClaims {
    pub scope: String,
    pub request_id: String,
    pub iat: u64,
    pub exp: u64,
}

/// Signs and checks HS256 response-metadata tokens
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: u64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    pub fn issue(&self, scope: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp().max(0) as u64;
        let claims = MetadataClaims {
            scope: scope.to_owned(),
            request_id: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<MetadataClaims, jsonwebtoken::errors::Error> {
        let token_data = decode::<MetadataClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_round_trips_claims() {
        let issuer = TokenIssuer::new("test-secret", 900);

        let token = issuer.issue(PRODUCTS_READ).unwrap();
        let claims = issuer.verify(&token).unwrap();

        assert_eq!(claims.scope, "products:read");
        assert_eq!(claims.exp - claims.iat, 900);
        assert!(Uuid::parse_str(&claims.request_id).is_ok());
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let token = TokenIssuer::new("secret-a", 900).issue(ORDERS_READ).unwrap();

        assert!(TokenIssuer::new("secret-b", 900).verify(&token).is_err());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let issuer = TokenIssuer::new("test-secret", 60);
        let a = issuer.verify(&issuer.issue(ORDERS_READ).unwrap()).unwrap();
        let b = issuer.verify(&issuer.issue(ORDERS_READ).unwrap()).unwrap();

        assert_ne!(a.request_id, b.request_id);
    }
}
