use chrono::Utc;
use courier_types::api::Claims;
use courier_types::error::{Error, Result};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{debug, error};

use crate::config::AuthConfig;

/// Turns a verified username into a signed bearer token and back.
///
/// Tokens carry no expiry: a token stays valid for as long as the signing
/// key does.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, username: &str) -> Result<String> {
        let claims = Claims {
            username: username.to_string(),
            iat: Utc::now().timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            error!("Token signing failed: {}", e);
            Error::Internal("token signing failed".into())
        })
    }

    /// Recover the username from a token. Any defect in the token is
    /// reported as `Unauthenticated`.
    pub fn verify(&self, token: &str) -> Result<String> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.username)
            .map_err(|e| {
                debug!("Rejected token: {}", e);
                Error::Unauthenticated
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PasswordCost;

    fn issuer(secret: &str) -> SessionIssuer {
        SessionIssuer::new(&AuthConfig {
            jwt_secret: secret.into(),
            password_cost: PasswordCost::MIN,
        })
    }

    #[test]
    fn issued_token_verifies() {
        let issuer = issuer("test-secret");
        let token = issuer.issue("alice").unwrap();
        assert_eq!(issuer.verify(&token).unwrap(), "alice");
    }

    #[test]
    fn token_from_other_key_is_rejected() {
        let token = issuer("key-one").issue("alice").unwrap();
        assert_eq!(issuer("key-two").verify(&token), Err(Error::Unauthenticated));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let issuer = issuer("test-secret");
        let token = issuer.issue("alice").unwrap();
        let forged = token.replacen(".", ".x", 1);
        assert_eq!(issuer.verify(&forged), Err(Error::Unauthenticated));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let issuer = issuer("test-secret");
        for token in ["", "garbage", "a.b.c"] {
            assert_eq!(issuer.verify(token), Err(Error::Unauthenticated));
        }
    }

    #[test]
    fn old_tokens_stay_valid() {
        let issuer = issuer("test-secret");
        let claims = Claims {
            username: "alice".into(),
            iat: 0,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert_eq!(issuer.verify(&token).unwrap(), "alice");
    }
}
