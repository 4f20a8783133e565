use super::model::{AuthenticatedUser, SessionClaims};
use crate::core::config::AuthConfig;
use crate::core::error::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

pub struct JwtValidator {
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    leeway: u64,
}

impl JwtValidator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            leeway: config.jwt_leeway.as_secs(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let header = decode_header(token).map_err(|e| AppError::Auth(e.to_string()))?;

        if header.alg != Algorithm::HS256 {
            return Err(AppError::Auth(format!(
                "Unsupported algorithm: {:?}. Only HS256 is allowed",
                header.alg
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Auth(e.to_string()))?;

        Ok(token_data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: SECRET.to_string(),
            issuer: "storefront-cms".to_string(),
            audience: "storefront-admin".to_string(),
            jwt_leeway: Duration::from_secs(0),
        }
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn token(claims: &SessionClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims() -> SessionClaims {
        SessionClaims {
            sub: "admin-1".to_string(),
            iss: "storefront-cms".to_string(),
            aud: "storefront-admin".to_string(),
            exp: now() + 600,
            iat: now(),
            email: Some("admin@example.com".to_string()),
            roles: vec!["admin".to_string()],
        }
    }

    #[test]
    fn test_valid_token() {
        let validator = JwtValidator::new(&config());
        let user = validator.validate_token(&token(&claims(), SECRET)).unwrap();
        assert_eq!(user.sub, "admin-1");
        assert!(user.has_admin_access());
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let validator = JwtValidator::new(&config());
        let result =
            validator.validate_token(&token(&claims(), "another-secret-of-sufficient-length!"));
        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[test]
    fn test_rejects_expired_and_wrong_audience() {
        let validator = JwtValidator::new(&config());

        let mut expired = claims();
        expired.exp = now() - 3600;
        assert!(validator.validate_token(&token(&expired, SECRET)).is_err());

        let mut foreign = claims();
        foreign.aud = "someone-else".to_string();
        assert!(validator.validate_token(&token(&foreign, SECRET)).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let validator = JwtValidator::new(&config());
        assert!(validator.validate_token("not-a-jwt").is_err());
    }
}
