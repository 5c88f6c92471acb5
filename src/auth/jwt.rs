use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use super::{error::AuthError, repo_types::PublicUser};
use crate::config::JwtConfig;

/// Arbitrary claim set carried by a token.
pub type Claims = Map<String, Value>;

/// Signs and verifies access tokens with one secret and algorithm.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    default_ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &self.algorithm)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &[u8], algorithm: Algorithm, default_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm,
            default_ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> anyhow::Result<Self> {
        Ok(Self::new(cfg.secret.as_bytes(), cfg.algorithm()?, cfg.ttl()?))
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Copies `claims`, stamps `exp` = now + `ttl` and signs. A negative `ttl`
    /// yields a well-formed token that is already expired.
    pub fn issue(&self, claims: &Claims, ttl: Option<Duration>) -> Result<String, AuthError> {
        let exp = OffsetDateTime::now_utc()
            .checked_add(ttl.unwrap_or(self.default_ttl))
            .ok_or(AuthError::ExpiryOutOfRange)?;
        let mut payload = claims.clone();
        payload.insert("exp".into(), Value::from(exp.unix_timestamp()));

        let token = encode(&Header::new(self.algorithm), &payload, &self.encoding)?;
        debug!(alg = ?self.algorithm, exp = exp.unix_timestamp(), "jwt signed");
        Ok(token)
    }

    pub fn issue_for(&self, user: &PublicUser) -> Result<String, AuthError> {
        let mut claims = Claims::new();
        claims.insert("sub".into(), Value::from(user.email.clone()));
        self.issue(&claims, None)
    }

    /// Checks algorithm, signature and `exp` (no leeway). Other claims, `aud`
    /// included, are the caller's to interpret.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(alg = ?self.algorithm, "jwt verified");
        Ok(data.claims)
    }
}

/// Subject (`sub`) of a verified bearer token.
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenIssuer: FromRef<S>,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let issuer = TokenIssuer::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header".to_string(),
            ))?;

        let claims = match issuer.verify(token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err((
                    StatusCode::UNAUTHORIZED,
                    "Invalid or expired token".to_string(),
                ));
            }
        };

        match claims.get("sub").and_then(Value::as_str) {
            Some(sub) => Ok(AuthUser(sub.to_string())),
            None => Err((
                StatusCode::UNAUTHORIZED,
                "Token has no subject".to_string(),
            )),
        }
    }
}
