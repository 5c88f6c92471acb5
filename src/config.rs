use std::net::SocketAddr;

use anyhow::{bail, Context};
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use tracing::warn;

/// Secret used when `SECRET_KEY` is unset. Only accepted in development.
pub const DEFAULT_SECRET: &str = "dev-secret-change-me";

/// Longest accepted access token lifetime: one year.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" | "local" | "test" => AppEnv::Development,
            _ => AppEnv::Production,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: String,
    pub ttl_minutes: i64,
}

impl JwtConfig {
    /// Parsed signing algorithm. Only the HMAC family works with a shared secret.
    pub fn algorithm(&self) -> anyhow::Result<Algorithm> {
        let alg: Algorithm = self
            .algorithm
            .parse()
            .with_context(|| format!("unknown signing algorithm {:?}", self.algorithm))?;
        match alg {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
            other => bail!("signing algorithm {:?} needs a key pair, not a secret", other),
        }
    }

    /// Default token lifetime, bounded to `1..=MAX_TTL_MINUTES` minutes.
    pub fn ttl(&self) -> anyhow::Result<time::Duration> {
        if !(1..=MAX_TTL_MINUTES).contains(&self.ttl_minutes) {
            bail!(
                "token lifetime must be between 1 and {} minutes, got {}",
                MAX_TTL_MINUTES,
                self.ttl_minutes
            );
        }
        Ok(time::Duration::minutes(self.ttl_minutes))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: AppEnv,
    pub listen_addr: SocketAddr,
    pub database_url: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let env = AppEnv::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".into()));
        let listen_addr = listen_addr(
            &std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            &std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into()),
        )?;
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://users.db?mode=rwc".into());
        let jwt = JwtConfig {
            secret: std::env::var("SECRET_KEY").unwrap_or_else(|_| DEFAULT_SECRET.into()),
            algorithm: std::env::var("ALGORITHM").unwrap_or_else(|_| "HS256".into()),
            ttl_minutes: match std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES") {
                Ok(v) => v
                    .trim()
                    .parse::<i64>()
                    .context("ACCESS_TOKEN_EXPIRE_MINUTES must be an integer")?,
                Err(_) => 30,
            },
        };
        Ok(Self {
            env,
            listen_addr,
            database_url,
            jwt,
        })
    }

    /// Refuses configurations that would sign tokens with a guessable key.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.jwt.algorithm()?;

        self.jwt.ttl()?;

        let weak = self.jwt.secret.is_empty() || self.jwt.secret == DEFAULT_SECRET;
        match (weak, self.env) {
            (false, _) => Ok(()),
            (true, AppEnv::Development) => {
                warn!("SECRET_KEY is unset or default; acceptable only for development");
                Ok(())
            }
            (true, AppEnv::Production) => {
                bail!("SECRET_KEY must be set to a non-default value outside development")
            }
        }
    }
}

fn listen_addr(host: &str, port: &str) -> anyhow::Result<SocketAddr> {
    let port: u16 = port
        .trim()
        .parse()
        .with_context(|| format!("APP_PORT {port:?} is not a port number"))?;
    format!("{}:{}", host.trim(), port)
        .parse()
        .with_context(|| format!("APP_HOST {host:?} is not an IP address"))
}
