use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::database::models::{Role, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: Option<String>,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn for_user(user: &User) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn expires_in(&self) -> i64 {
        (self.exp - self.iat).max(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
    #[error("JWT token has expired")]
    Expired,
    #[error("Invalid JWT token: {0}")]
    Invalid(String),
}

fn secret() -> Result<&'static str, JwtError> {
    let secret = config::config().security.jwt_secret.as_str();
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    Ok(secret)
}

/// Signs a token for `user`; returns it with its lifetime in seconds.
pub fn generate_jwt(user: &User) -> Result<(String, i64), JwtError> {
    let claims = Claims::for_user(user);
    let token = encode_claims(&claims)?;
    Ok((token, claims.expires_in()))
}

pub fn encode_claims(claims: &Claims) -> Result<String, JwtError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verifies signature and expiry. With `allow_expired`, a token past `exp`
/// is still accepted within the configured refresh grace window.
pub fn validate_jwt(token: &str, allow_expired: bool) -> Result<Claims, JwtError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());
    let mut validation = Validation::default();
    if allow_expired {
        validation.validate_exp = false;
    }

    let claims = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e.to_string()),
        })?
        .claims;

    if allow_expired {
        let grace = Duration::days(config::config().security.refresh_grace_days).num_seconds();
        if claims.exp + grace < Utc::now().timestamp() {
            return Err(JwtError::Expired);
        }
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::SubscriptionPlan;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: Some("ada@example.com".into()),
            first_name: Some("Ada".into()),
            last_name: None,
            profile_image_url: None,
            company: None,
            subscription_plan: SubscriptionPlan::Starter,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            role: Role::Manager,
            created_at: now,
            updated_at: now,
        }
    }

    fn claims_expired_days_ago(days: i64) -> Claims {
        let u = user();
        let exp = (Utc::now() - Duration::days(days)).timestamp();
        Claims { sub: u.id, email: u.email, role: u.role, exp, iat: exp - 3600 }
    }

    #[test]
    fn roundtrips_user_claims() {
        let u = user();
        let (token, expires_in) = generate_jwt(&u).unwrap();
        assert!(expires_in > 0);

        let claims = validate_jwt(&token, false).unwrap();
        assert_eq!(claims.sub, u.id);
        assert_eq!(claims.role, Role::Manager);
    }

    #[test]
    fn expired_token_rejected_unless_refreshing() {
        let token = encode_claims(&claims_expired_days_ago(1)).unwrap();
        assert!(matches!(validate_jwt(&token, false), Err(JwtError::Expired)));
        assert!(validate_jwt(&token, true).is_ok());
    }

    #[test]
    fn refresh_window_is_bounded() {
        let days = config::config().security.refresh_grace_days + 1;
        let token = encode_claims(&claims_expired_days_ago(days)).unwrap();
        assert!(matches!(validate_jwt(&token, true), Err(JwtError::Expired)));
    }

    #[test]
    fn tampered_token_rejected() {
        let (token, _) = generate_jwt(&user()).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(matches!(validate_jwt(&tampered, false), Err(JwtError::Invalid(_))));
    }
}
