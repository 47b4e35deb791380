use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::SecurityConfig;

pub mod password;

/// Tokens are valid for one hour and never renewed
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

const SIGNING_ALGORITHM: Algorithm = Algorithm::RS256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Caller identity carried by a token and attached to authenticated requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: i64,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user: AuthUser, issued_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user.user_id,
            role: user.role,
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Signing key not configured: {0}")]
    KeyMissing(&'static str),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("JWT generation error: {0}")]
    Generation(String),

    /// Structural, signature, algorithm and expiry failures all collapse here
    #[error("Invalid token")]
    Invalid,
}

/// Issues and verifies RS256 identity tokens.
///
/// Verification is a pure function of the signature and expiry; there is no
/// revocation list. Only the public key is needed to verify, so other services
/// can check tokens without holding the signing secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| TokenError::InvalidKey(format!("private key: {}", e)))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| TokenError::InvalidKey(format!("public key: {}", e)))?;

        // Pinning the algorithm rejects HS256 tokens forged with the public key
        let validation = Validation::new(SIGNING_ALGORITHM);

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
        })
    }

    /// Load the key pair from inline PEM text, falling back to key files
    pub fn from_config(security: &SecurityConfig) -> Result<Self, TokenError> {
        let private_pem = load_pem(
            security.private_key.as_deref(),
            security.private_key_file.as_deref(),
            "PRIVATE_KEY",
        )?;
        let public_pem = load_pem(
            security.public_key.as_deref(),
            security.public_key_file.as_deref(),
            "PUBLIC_KEY",
        )?;

        Self::from_pem(private_pem.as_bytes(), public_pem.as_bytes())
    }

    pub fn issue(&self, user: AuthUser) -> Result<String, TokenError> {
        self.sign(&Claims::new(user, Utc::now()))
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            TokenError::Invalid
        })?;

        Ok(AuthUser {
            user_id: data.claims.user_id,
            role: data.claims.role,
        })
    }
}

fn load_pem(
    inline: Option<&str>,
    path: Option<&std::path::Path>,
    name: &'static str,
) -> Result<String, TokenError> {
    if let Some(pem) = inline.filter(|pem| !pem.trim().is_empty()) {
        return Ok(pem.to_string());
    }

    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| TokenError::InvalidKey(format!("{} ({}): {}", name, path.display(), e))),
        None => Err(TokenError::KeyMissing(name)),
    }
}
