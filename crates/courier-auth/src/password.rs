use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use courier_types::error::{Error, Result};
use tracing::{error, warn};

use crate::config::AuthConfig;

/// Salted one-way password hashing (Argon2id).
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Hash of a throwaway password at the configured cost. Unknown users are
    /// checked against it so their logins cost as much as a wrong password.
    decoy_hash: String,
    #[cfg(test)]
    verifications: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl PasswordHasher {
    pub fn new(config: &AuthConfig) -> password_hash::Result<Self> {
        let cost = config.password_cost;
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        let decoy_hash = argon2.hash_password(b"courier-decoy", &salt)?.to_string();

        Ok(Self {
            argon2,
            decoy_hash,
            #[cfg(test)]
            verifications: Default::default(),
        })
    }

    /// Hash with a fresh random salt. Returns a PHC string.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| {
                error!("Password hashing failed: {}", e);
                Error::Internal("password hashing failed".into())
            })
    }

    /// Constant-time check of `password` against a stored PHC string. The
    /// cost recorded in the hash is used, not the configured one.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Unparseable stored password hash: {}", e);
                return false;
            }
        };

        #[cfg(test)]
        self.verifications
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burn one full verification for a user that does not exist. Always
    /// `false`.
    pub fn verify_decoy(&self, password: &str) -> bool {
        let _ = self.verify(password, &self.decoy_hash);
        false
    }

    #[cfg(test)]
    pub(crate) fn verifications(&self) -> usize {
        self.verifications
            .load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PasswordCost;

    fn config(password_cost: PasswordCost) -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            password_cost,
        }
    }

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(&config(PasswordCost::MIN)).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = hasher();
        let hash = hasher.hash("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("correct horse"));
        assert!(hasher.verify("correct horse", &hash));
        assert!(!hasher.verify("correct horse ", &hash));
        assert!(!hasher.verify("", &hash));
    }

    #[test]
    fn salts_differ() {
        let hasher = hasher();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn garbage_hash_never_verifies() {
        let hasher = hasher();
        assert!(!hasher.verify("anything", "not-a-phc-string"));
    }

    #[test]
    fn decoy_runs_a_real_verification() {
        let hasher = hasher();
        assert!(!hasher.verify_decoy("courier-decoy"));
        assert!(!hasher.verify_decoy("anything"));
        assert_eq!(hasher.verifications(), 2);
    }

    #[test]
    fn decoy_uses_the_configured_cost() {
        let cost = PasswordCost {
            iterations: 3,
            ..PasswordCost::MIN
        };
        let hasher = PasswordHasher::new(&config(cost)).unwrap();
        let decoy = PasswordHash::new(&hasher.decoy_hash).unwrap();
        let params = Params::try_from(&decoy).unwrap();
        assert_eq!(params.t_cost(), 3);
        assert_eq!(params.m_cost(), PasswordCost::MIN.memory_kib);
    }

    #[test]
    fn invalid_cost_is_rejected() {
        let cost = PasswordCost {
            memory_kib: 1,
            ..PasswordCost::MIN
        };
        assert!(PasswordHasher::new(&config(cost)).is_err());
    }
}
