use base64::{engine::general_purpose, Engine as _};
use chrono::Utc;
use serde::Deserialize;

use crate::api::error::ApiError;

/// Claims this crate reads from an access token.
#[derive(Debug, Clone, Deserialize)]
struct Claims {
    /// The authenticated user's id.
    sub: String,
    /// Expiry as a Unix timestamp.
    exp: Option<i64>,
}

/// An authenticated backend session.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user_id: String,
    pub expires_at: Option<i64>,
}

impl Session {
    pub fn new(access_token: String, refresh_token: Option<String>, user_id: String) -> Self {
        let expires_at = decode_claims(&access_token).ok().and_then(|c| c.exp);
        Self {
            access_token,
            refresh_token,
            user_id,
            expires_at,
        }
    }

    /// Rebuild a session from a bare access token, e.g. one the frontend
    /// kept across reloads. The user id is the token's `sub` claim.
    pub fn from_access_token(access_token: impl Into<String>) -> Result<Self, ApiError> {
        let access_token = access_token.into();
        let claims = decode_claims(&access_token)?;
        Ok(Self {
            access_token,
            refresh_token: None,
            user_id: claims.sub,
            expires_at: claims.exp,
        })
    }

    /// Tokens without an `exp` claim are treated as non-expiring.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => exp <= Utc::now().timestamp(),
            None => false,
        }
    }
}

/// Decode the payload segment of a JWT without verifying the signature.
/// Verification happens server-side; locally the token is only a carrier
/// for the user id and expiry.
fn decode_claims(token: &str) -> Result<Claims, ApiError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| ApiError::Authentication("Malformed access token".to_string()))?;

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| ApiError::Authentication(format!("Invalid token encoding: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Authentication(format!("Invalid token claims: {}", e)))
}
