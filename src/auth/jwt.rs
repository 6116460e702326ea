use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::claims::SessionClaims;

/// Validate an HS256 session token signed with the shared secret
pub fn validate_jwt(token: &str, secret: &str) -> Result<SessionClaims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<SessionClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| format!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}

/// Sign a session token for `person_id` valid for `ttl_secs`
#[cfg(test)]
pub fn issue_jwt(person_id: crate::models::PersonId, secret: &str, ttl_secs: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = SessionClaims {
        sub: person_id.to_string(),
        exp: now + ttl_secs,
        iat: now,
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("failed to sign token")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-for-session-tokens";

    #[test]
    fn test_valid_token_round_trip() {
        let token = issue_jwt(42, SECRET, 300);
        let claims = validate_jwt(&token, SECRET).unwrap();
        assert_eq!(claims.person_id().unwrap(), 42);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_jwt(42, SECRET, 300);
        assert!(validate_jwt(&token, "another-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Beyond the default 60 s leeway
        let token = issue_jwt(42, SECRET, -600);
        assert!(validate_jwt(&token, SECRET).is_err());
    }

    #[test]
    fn test_non_numeric_subject() {
        let claims = SessionClaims {
            sub: "user_abc".to_string(),
            exp: 0,
            iat: 0,
        };
        assert!(claims.person_id().is_err());
    }
}
