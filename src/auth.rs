use crate::error::AppError;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Claims carried by the WebSocket handshake token.
///
/// Token issuance lives in the auth service; this side only verifies and
/// reads out the fields the welcome payload needs.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub user_id: i64,
    pub username: String,
    pub role: String,
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(secret.as_ref());
    let validation = Validation::default();
    let token_data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token_for(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .unwrap()
    }

    fn sample_claims() -> Claims {
        Claims {
            sub: "alice@example.com".to_string(),
            exp: 4102444800, // far future
            user_id: 7,
            username: "alice".to_string(),
            role: "admin".to_string(),
        }
    }

    #[test]
    fn round_trips_valid_token() {
        let token = token_for(&sample_claims(), "secret");
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = token_for(&sample_claims(), "secret");
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let claims = Claims {
            exp: 1000, // 1970
            ..sample_claims()
        };
        let token = token_for(&claims, "secret");
        assert!(verify_token(&token, "secret").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(verify_token("not-a-jwt", "secret").is_err());
    }
}
