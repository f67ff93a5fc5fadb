//! Identity-pool token verification
//!
//! Users sign in against a managed Cognito user pool, which issues RS256
//! signed ID tokens. Services never see passwords; they verify the ID token
//! presented as `Authorization: Bearer` against the pool's published JWKS
//! and consult the Redis revocation list populated on sign-out.

use jsonwebtoken::{
    Algorithm, DecodingKey, Validation, decode, decode_header,
    errors::{Error as JwtError, ErrorKind},
    jwk::JwkSet,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::RedisPool;

const REVOKED_TOKEN_PREFIX: &str = "revoked_token:";

/// Errors raised while verifying or revoking tokens
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token header is malformed: {0}")]
    Malformed(#[source] JwtError),

    #[error("Token was signed with an unknown key: {0}")]
    UnknownKey(String),

    #[error("Token has expired")]
    Expired,

    #[error("Token is invalid: {0}")]
    Invalid(#[source] JwtError),

    #[error("Expected an ID token, got a {0} token")]
    WrongTokenUse(String),

    #[error("Token carries no email claim")]
    MissingEmail,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Failed to load signing keys: {0}")]
    KeyFetch(String),

    #[error("Revocation list unavailable: {0}")]
    RevocationStore(String),

    #[error("Identity pool configuration error: {0}")]
    Configuration(String),
}

/// Coordinates of the managed user pool
#[derive(Debug, Clone)]
pub struct IdentityPoolConfig {
    /// AWS region hosting the pool
    pub region: String,
    /// User pool identifier, e.g. `us-east-1_AbCdEf123`
    pub user_pool_id: String,
    /// App client identifier, the audience of issued ID tokens
    pub client_id: String,
    /// Endpoint override for pool emulators
    pub endpoint_override: Option<String>,
}

impl IdentityPoolConfig {
    /// Create a new IdentityPoolConfig from environment variables
    ///
    /// # Environment Variables
    /// - `COGNITO_REGION`: AWS region (default: "us-east-1")
    /// - `COGNITO_USER_POOL_ID`: User pool id (required)
    /// - `COGNITO_CLIENT_ID`: App client id (required)
    /// - `COGNITO_ENDPOINT`: Optional endpoint override
    pub fn from_env() -> Result<Self, TokenError> {
        let region = std::env::var("COGNITO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let user_pool_id = std::env::var("COGNITO_USER_POOL_ID").map_err(|_| {
            TokenError::Configuration("COGNITO_USER_POOL_ID environment variable not set".into())
        })?;

        let client_id = std::env::var("COGNITO_CLIENT_ID").map_err(|_| {
            TokenError::Configuration("COGNITO_CLIENT_ID environment variable not set".into())
        })?;

        let endpoint_override = std::env::var("COGNITO_ENDPOINT")
            .ok()
            .map(|endpoint| endpoint.trim_end_matches('/').to_string())
            .filter(|endpoint| !endpoint.is_empty());

        Ok(Self {
            region,
            user_pool_id,
            client_id,
            endpoint_override,
        })
    }

    /// Base URL of the pool API
    pub fn endpoint(&self) -> String {
        match &self.endpoint_override {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://cognito-idp.{}.amazonaws.com", self.region),
        }
    }

    /// Expected `iss` claim of issued tokens
    pub fn issuer(&self) -> String {
        format!("{}/{}", self.endpoint(), self.user_pool_id)
    }

    /// Location of the pool's signing keys
    pub fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.issuer())
    }
}

/// Claims of a pool ID token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub phone_number: Option<String>,
    pub token_use: String,
    pub jti: Option<String>,
    pub iat: u64,
    pub exp: u64,
}

/// Identity of a verified caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthUser {
    pub sub: String,
    pub email: String,
    pub email_verified: bool,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub phone_number: Option<String>,
    /// Identifier used on the revocation list
    #[serde(skip)]
    pub token_id: String,
    /// Expiry of the presented token (seconds since epoch)
    #[serde(skip)]
    pub expires_at: u64,
}

impl TryFrom<IdTokenClaims> for AuthUser {
    type Error = TokenError;

    fn try_from(claims: IdTokenClaims) -> Result<Self, Self::Error> {
        if claims.token_use != "id" {
            return Err(TokenError::WrongTokenUse(claims.token_use));
        }

        let email = claims
            .email
            .filter(|email| !email.is_empty())
            .ok_or(TokenError::MissingEmail)?;

        let token_id = claims
            .jti
            .unwrap_or_else(|| format!("{}:{}", claims.sub, claims.iat));

        Ok(AuthUser {
            sub: claims.sub,
            email,
            email_verified: claims.email_verified,
            given_name: claims.given_name,
            family_name: claims.family_name,
            phone_number: claims.phone_number,
            token_id,
            expires_at: claims.exp,
        })
    }
}

/// Verifies ID tokens against the pool's signing keys
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Arc<HashMap<String, DecodingKey>>,
    validation: Validation,
}

impl TokenVerifier {
    /// Download the pool JWKS and build a verifier from it
    pub async fn fetch(config: &IdentityPoolConfig) -> Result<Self, TokenError> {
        let url = config.jwks_url();
        info!("Fetching identity pool signing keys from {}", url);

        let jwks = reqwest::get(&url)
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| TokenError::KeyFetch(e.to_string()))?
            .json::<JwkSet>()
            .await
            .map_err(|e| TokenError::KeyFetch(e.to_string()))?;

        Self::from_jwk_set(config, &jwks)
    }

    /// Build a verifier from an already parsed key set
    pub fn from_jwk_set(config: &IdentityPoolConfig, jwks: &JwkSet) -> Result<Self, TokenError> {
        let mut keys = HashMap::new();

        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                warn!("Skipping signing key without a kid");
                continue;
            };
            let key = DecodingKey::from_jwk(jwk).map_err(|e| TokenError::KeyFetch(e.to_string()))?;
            keys.insert(kid, key);
        }

        if keys.is_empty() {
            return Err(TokenError::KeyFetch("key set contains no usable keys".into()));
        }

        info!("Loaded {} identity pool signing keys", keys.len());
        Ok(Self::with_keys(config, keys))
    }

    /// Build a verifier from decoding keys indexed by `kid`
    pub fn with_keys(config: &IdentityPoolConfig, keys: HashMap<String, DecodingKey>) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[config.issuer()]);
        validation.set_audience(&[config.client_id.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        Self {
            keys: Arc::new(keys),
            validation,
        }
    }

    /// Verify an ID token and return the caller it identifies
    pub fn verify(&self, token: &str) -> Result<AuthUser, TokenError> {
        let header = decode_header(token).map_err(TokenError::Malformed)?;
        let kid = header.kid.unwrap_or_default();
        let key = self
            .keys
            .get(&kid)
            .ok_or_else(|| TokenError::UnknownKey(kid.clone()))?;

        let data = decode::<IdTokenClaims>(token, key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e),
            }
        })?;

        AuthUser::try_from(data.claims)
    }
}

/// Tokens invalidated by sign-out before their natural expiry
#[derive(Clone)]
pub struct RevocationList {
    redis: RedisPool,
}

impl RevocationList {
    pub fn new(redis: RedisPool) -> Self {
        Self { redis }
    }

    /// Revoke the token a caller authenticated with, until it would have expired
    pub async fn revoke(&self, user: &AuthUser) -> Result<(), TokenError> {
        let ttl = user.expires_at.saturating_sub(now_secs());
        if ttl == 0 {
            return Ok(());
        }

        self.redis
            .set_with_ttl(&revocation_key(&user.token_id), &user.sub, ttl)
            .await
            .map_err(|e| TokenError::RevocationStore(e.to_string()))
    }

    /// Whether the caller's token has been revoked
    pub async fn is_revoked(&self, user: &AuthUser) -> Result<bool, TokenError> {
        self.redis
            .exists(&revocation_key(&user.token_id))
            .await
            .map_err(|e| TokenError::RevocationStore(e.to_string()))
    }

    /// Fail with [`TokenError::Revoked`] when the caller's token was revoked
    pub async fn ensure_active(&self, user: &AuthUser) -> Result<(), TokenError> {
        if self.is_revoked(user).await? {
            return Err(TokenError::Revoked);
        }
        Ok(())
    }
}

fn revocation_key(token_id: &str) -> String {
    format!("{}{}", REVOKED_TOKEN_PREFIX, token_id)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
