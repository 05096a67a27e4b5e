use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// JWT claims issued by the upstream auth service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub exp: usize,  // Expiration timestamp
    #[serde(default)]
    pub roles: Roles,
}

/// `roles` arrives either as a single string or as an array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Roles {
    One(String),
    Many(Vec<String>),
}

impl Default for Roles {
    fn default() -> Self {
        Roles::Many(Vec::new())
    }
}

impl Roles {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Roles::One(role) => vec![role],
            Roles::Many(roles) => roles,
        }
    }
}

/// Verify an HS512 token and decode its claims.
pub fn verify(token: &str, secret: &[u8]) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS512),
    )?;
    Ok(token_data.claims)
}
