use std::fmt;

use argon2::Params;

/// Argon2 work factor. Higher values make every hash (and every login)
/// proportionally slower.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl PasswordCost {
    /// Cheapest cost Argon2 accepts. Only suitable for tests.
    pub const MIN: PasswordCost = PasswordCost {
        memory_kib: Params::MIN_M_COST,
        iterations: Params::MIN_T_COST,
        parallelism: Params::MIN_P_COST,
    };
}

impl Default for PasswordCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Process-wide auth settings, loaded once at startup and handed to the
/// hasher and the session issuer. Never mutated afterwards.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub password_cost: PasswordCost,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("password_cost", &self.password_cost)
            .finish()
    }
}
