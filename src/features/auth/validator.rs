use super::model::{AuthenticatedUser, CustomClaims};
use crate::core::error::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::jwks::JwksClient;

pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    issuer: String,
    audience: String,
    leeway: u64,
    claims_namespace: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    // Standard JWT claims (validated by jsonwebtoken library)
    sub: String,
    #[serde(rename = "iss")]
    _iss: String,
    #[serde(rename = "aud")]
    _aud: AudienceClaim,
    #[serde(rename = "exp")]
    _exp: u64,

    #[serde(default)]
    kind: Option<String>,
    #[serde(rename = "sessionUid", default)]
    session_uid: Option<String>,

    // Namespaced custom claims are looked up by the configured key
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

/// Audience can be either a single string or an array of strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
#[allow(dead_code)]
enum AudienceClaim {
    Single(String),
    Multiple(Vec<String>),
}

impl JwtValidator {
    pub fn new(
        jwks_client: Arc<JwksClient>,
        issuer: String,
        audience: String,
        leeway: Duration,
        claims_namespace: String,
    ) -> Self {
        Self {
            jwks_client,
            issuer,
            audience,
            leeway: leeway.as_secs(),
            claims_namespace,
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        // Decode header to get kid
        let header = decode_header(token).map_err(|e| AppError::Auth(e.to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| AppError::Auth("Missing kid in token header".to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Auth(format!(
                "Unsupported algorithm: {:?}. Only RS256 is allowed",
                header.alg
            )));
        }

        let decoding_key = self
            .jwks_client
            .get_key(&kid)
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let claims = token_data.claims;

        if let Some(kind) = &claims.kind {
            if kind != "AccessToken" {
                return Err(AppError::Auth("Token is not an access token".to_string()));
            }
        }

        self.to_authenticated_user(claims)
    }

    fn to_authenticated_user(&self, claims: Claims) -> Result<AuthenticatedUser, AppError> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Auth("Token subject is not a valid user id".to_string()))?;

        let roles = match claims.extra.get(&self.claims_namespace) {
            Some(value) => serde_json::from_value::<CustomClaims>(value.clone())
                .map_err(|e| AppError::Auth(format!("Malformed custom claims: {}", e)))?
                .roles,
            None => Vec::new(),
        };

        Ok(AuthenticatedUser {
            user_id,
            sub: claims.sub,
            session_uid: claims.session_uid,
            roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> JwtValidator {
        JwtValidator::new(
            Arc::new(JwksClient::new("https://issuer.test", Duration::from_secs(60))),
            "https://issuer.test".to_string(),
            "sharehub".to_string(),
            Duration::from_secs(0),
            "https://sharehub.app/claims".to_string(),
        )
    }

    fn claims(value: serde_json::Value) -> Claims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_roles_are_read_from_namespace() {
        let sub = Uuid::new_v4();
        let user = validator()
            .to_authenticated_user(claims(json!({
                "sub": sub.to_string(),
                "iss": "https://issuer.test",
                "aud": "sharehub",
                "exp": 0,
                "https://sharehub.app/claims": { "roles": ["admin"] }
            })))
            .unwrap();

        assert_eq!(user.user_id, sub);
        assert!(user.is_admin());
    }

    #[test]
    fn test_missing_namespace_means_no_roles() {
        let user = validator()
            .to_authenticated_user(claims(json!({
                "sub": Uuid::new_v4().to_string(),
                "iss": "https://issuer.test",
                "aud": ["sharehub", "other"],
                "exp": 0
            })))
            .unwrap();

        assert!(user.roles.is_empty());
        assert!(!user.is_member());
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        let result = validator().to_authenticated_user(claims(json!({
            "sub": "not-a-uuid",
            "iss": "https://issuer.test",
            "aud": "sharehub",
            "exp": 0
        })));

        assert!(matches!(result, Err(AppError::Auth(_))));
    }
}
