//! Courier authentication and authorization.
//!
//! - `password`: Argon2id hashing with a configured cost
//! - `credentials`: registration and login checks on top of the user table
//! - `session`: signed bearer tokens carrying a username
//! - `policy`: who may see or touch which user and message

pub mod config;
pub mod credentials;
pub mod password;
pub mod policy;
pub mod session;

pub use config::{AuthConfig, PasswordCost};
pub use credentials::CredentialStore;
pub use password::PasswordHasher;
pub use session::SessionIssuer;
