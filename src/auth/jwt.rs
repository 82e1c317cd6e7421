use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session claims. Tokens are issued by the identity service; this crate only
/// verifies them (and mints them in tests).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Employee id.
    pub sub: String,
    pub tid: Uuid,
    pub role: String,
    pub exp: i64,
}

impl Claims {
    pub fn new(employee_id: impl Into<String>, tenant_id: Uuid, role: impl Into<String>) -> Self {
        Self {
            sub: employee_id.into(),
            tid: tenant_id,
            role: role.into(),
            exp: (Utc::now() + Duration::minutes(15)).timestamp(),
        }
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("JWT encode failed: {e}"))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("JWT decode failed: {e}"))
}
