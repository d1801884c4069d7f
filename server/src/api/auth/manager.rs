//! Authentication manager

use anyhow::Result;
use chrono::Duration;

use super::jwt::{Claims, JwtError, TokenKind, create_token, validate_token};
use crate::core::config::AuthConfig;
use crate::data::types::UserRow;

/// Access and refresh tokens issued together at login
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Main authentication manager
#[derive(Debug)]
pub struct AuthManager {
    signing_key: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AuthManager {
    pub fn new(signing_key: Vec<u8>, config: &AuthConfig) -> Self {
        Self {
            signing_key,
            access_ttl: Duration::minutes(config.access_ttl_minutes as i64),
            refresh_ttl: Duration::days(config.refresh_ttl_days as i64),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue a fresh access/refresh token pair for a user
    pub fn issue_tokens(&self, user: &UserRow) -> Result<TokenPair> {
        let access = Claims::new(
            &user.id,
            &user.email,
            user.role,
            TokenKind::Access,
            self.access_ttl,
        );
        let refresh = Claims::new(
            &user.id,
            &user.email,
            user.role,
            TokenKind::Refresh,
            self.refresh_ttl,
        );

        Ok(TokenPair {
            access_token: create_token(&self.signing_key, &access)?,
            refresh_token: create_token(&self.signing_key, &refresh)?,
        })
    }

    /// Validate an access token
    pub fn validate_access(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_kind(token, TokenKind::Access)
    }

    /// Validate a refresh token
    pub fn validate_refresh(&self, token: &str) -> Result<Claims, JwtError> {
        self.validate_kind(token, TokenKind::Refresh)
    }

    fn validate_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, JwtError> {
        let claims = validate_token(token, &self.signing_key)?;
        if claims.kind != kind {
            return Err(JwtError::Invalid("Wrong token kind".to_string()));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::Role;

    fn test_manager() -> AuthManager {
        AuthManager::new(
            vec![7u8; 32],
            &AuthConfig {
                access_ttl_minutes: 15,
                refresh_ttl_days: 7,
            },
        )
    }

    fn test_user() -> UserRow {
        UserRow {
            id: "user1".to_string(),
            name: "Teacher".to_string(),
            email: "teacher@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Admin,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_issue_and_validate_pair() {
        let manager = test_manager();
        let pair = manager.issue_tokens(&test_user()).unwrap();

        let access = manager.validate_access(&pair.access_token).unwrap();
        assert_eq!(access.user_id(), "user1");
        assert_eq!(access.role, Role::Admin);

        let refresh = manager.validate_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.user_id(), "user1");
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let manager = test_manager();
        let pair = manager.issue_tokens(&test_user()).unwrap();

        assert!(manager.validate_access(&pair.refresh_token).is_err());
        assert!(manager.validate_refresh(&pair.access_token).is_err());
    }

    #[test]
    fn test_refresh_outlives_access() {
        let manager = test_manager();
        assert!(manager.refresh_ttl() > manager.access_ttl());
    }
}
