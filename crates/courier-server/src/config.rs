use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use courier_auth::{AuthConfig, PasswordCost};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Everything the process reads from its environment, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub store_timeout: Duration,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("COURIER_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("COURIER_JWT_SECRET is unset or still a placeholder");
        }

        let host = lookup("COURIER_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&lookup, "COURIER_PORT", 3000)?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let defaults = PasswordCost::default();
        let password_cost = PasswordCost {
            memory_kib: parse_or(&lookup, "COURIER_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&lookup, "COURIER_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&lookup, "COURIER_HASH_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            addr,
            db_path: lookup("COURIER_DB_PATH")
                .unwrap_or_else(|| "courier.db".into())
                .into(),
            store_timeout: Duration::from_millis(parse_or(
                &lookup,
                "COURIER_STORE_TIMEOUT_MS",
                5000,
            )?),
            auth: AuthConfig {
                jwt_secret,
                password_cost,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} is not valid: {:?}", key, raw)),
        None => Ok(default),
    }
}
