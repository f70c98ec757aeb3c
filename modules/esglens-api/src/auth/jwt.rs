use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ISSUER: &str = "esglens";

/// JWT claims carried by bearer tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

/// JWT service for creating and verifying bearer tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl JwtService {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn create_token(&self, user_id: i32, username: &str, is_admin: bool) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::seconds(self.ttl_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            is_admin,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a token. Returns claims if valid and not expired.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::new("test-secret-key", 24 * 3600)
    }

    #[test]
    fn roundtrip_token() {
        let svc = test_service();
        let token = svc.create_token(42, "analyst", false).unwrap();
        let claims = svc.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username, "analyst");
        assert!(!claims.is_admin);
        assert_eq!(claims.iss, "esglens");
    }

    #[test]
    fn rejects_garbage() {
        assert!(test_service().verify_token("garbage").is_err());
    }

    #[test]
    fn rejects_wrong_secret() {
        let svc1 = JwtService::new("secret-a", 3600);
        let svc2 = JwtService::new("secret-b", 3600);
        let token = svc1.create_token(1, "analyst", false).unwrap();
        assert!(svc2.verify_token(&token).is_err());
    }

    #[test]
    fn token_carries_configured_ttl() {
        let svc = JwtService::new("s", 900);
        let token = svc.create_token(1, "analyst", true).unwrap();
        let claims = svc.verify_token(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn tokens_have_unique_ids() {
        let svc = test_service();
        let c1 = svc.verify_token(&svc.create_token(1, "a", false).unwrap()).unwrap();
        let c2 = svc.verify_token(&svc.create_token(1, "a", false).unwrap()).unwrap();
        assert_ne!(c1.jti, c2.jti);
    }
}
