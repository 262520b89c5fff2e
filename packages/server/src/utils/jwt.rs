use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Email
    pub uid: i32,     // User ID
    pub name: String, // Full name
    pub exp: usize,   // Expiration timestamp
}

/// Sign a new JWT token for a user.
pub fn sign(user_id: i32, email: &str, full_name: &str, secret: &str) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(7))
        .ok_or_else(|| anyhow::anyhow!("Token expiry out of range"))?
        .timestamp();

    let claims = Claims {
        sub: email.to_owned(),
        uid: user_id,
        name: full_name.to_owned(),
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a JWT token.
pub fn verify(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trip() {
        let token = sign(7, "admin@ssis.local", "Admin User", "test-secret").unwrap();
        let claims = verify(&token, "test-secret").unwrap();
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.sub, "admin@ssis.local");
        assert_eq!(claims.name, "Admin User");
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = sign(1, "a@b.c", "A", "secret-one").unwrap();
        assert!(verify(&token, "secret-two").is_err());
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(verify("not-a-token", "secret").is_err());
    }
}
