use std::sync::Arc;

use courier_db::Database;
use courier_db::models::NewUser;
use courier_types::api::RegisterRequest;
use courier_types::error::Result;
use courier_types::models::{UserDetail, UserSummary};
use tracing::{debug, info};

use crate::password::PasswordHasher;

/// User records plus the credential checks that sit on top of them.
/// Password hashes go in through `register` and never come back out.
#[derive(Clone)]
pub struct CredentialStore {
    db: Arc<Database>,
    hasher: PasswordHasher,
}

impl CredentialStore {
    pub fn new(db: Arc<Database>, hasher: PasswordHasher) -> Self {
        Self { db, hasher }
    }

    pub fn register(&self, req: &RegisterRequest) -> Result<UserSummary> {
        let password_hash = self.hasher.hash(&req.password)?;

        let user = self.db.create_user(&NewUser {
            username: &req.username,
            password_hash: &password_hash,
            first_name: &req.first_name,
            last_name: &req.last_name,
            phone: &req.phone,
        })?;

        info!("Registered user {}", user.username);
        Ok(user)
    }

    /// `false` both for an unknown user and for a wrong password, so callers
    /// cannot tell which usernames exist. Both paths run one Argon2
    /// verification.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<bool> {
        let ok = match self.db.get_password_hash(username)? {
            Some(stored) => self.hasher.verify(password, &stored),
            None => self.hasher.verify_decoy(password),
        };

        if !ok {
            debug!("Failed login for {}", username);
        }
        Ok(ok)
    }

    pub fn touch_login(&self, username: &str) -> Result<()> {
        self.db.touch_login(username)
    }

    pub fn list(&self) -> Result<Vec<UserSummary>> {
        self.db.list_users()
    }

    pub fn get(&self, username: &str) -> Result<UserDetail> {
        self.db.get_user(username)
    }
}
