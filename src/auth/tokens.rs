//! HS256 bearer token verification

use anyhow::{Context, Result};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::Claims;

/// Verifies tokens signed with the shared secret
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, issuer: &str, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = leeway_seconds;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .context("JWT validation failed")?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-that-is-long-enough-123";

    fn token(secret: &str, iss: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: uuid::Uuid::new_v4().to_string(),
            iss: iss.to_string(),
            iat: Some(now),
            exp: now + exp_offset,
            nbf: None,
            email: Some("buyer@example.com".to_string()),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_valid_token() {
        let verifier = TokenVerifier::new(SECRET, "bell24h", 0);
        let claims = verifier.verify(&token(SECRET, "bell24h", 3600)).unwrap();
        assert_eq!(claims.iss, "bell24h");
        assert_eq!(claims.email.as_deref(), Some("buyer@example.com"));
    }

    #[test]
    fn accepts_token_without_issued_at() {
        let now = chrono::Utc::now().timestamp();
        let claims = serde_json::json!({
            "sub": uuid::Uuid::new_v4().to_string(),
            "iss": "bell24h",
            "exp": now + 3600,
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let verifier = TokenVerifier::new(SECRET, "bell24h", 0);
        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.iat, None);
        assert_eq!(claims.email, None);
    }

    #[test]
    fn rejects_wrong_secret() {
        let verifier = TokenVerifier::new(SECRET, "bell24h", 0);
        assert!(verifier.verify(&token("another-secret", "bell24h", 3600)).is_err());
    }

    #[test]
    fn rejects_wrong_issuer() {
        let verifier = TokenVerifier::new(SECRET, "bell24h", 0);
        assert!(verifier.verify(&token(SECRET, "someone-else", 3600)).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let verifier = TokenVerifier::new(SECRET, "bell24h", 0);
        assert!(verifier.verify(&token(SECRET, "bell24h", -600)).is_err());
    }

    #[test]
    fn rejects_garbage() {
        let verifier = TokenVerifier::new(SECRET, "bell24h", 0);
        assert!(verifier.verify("not.a.token").is_err());
    }
}
