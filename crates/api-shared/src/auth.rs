//! Bearer-token identity resolution.
//!
//! Credential issuance lives outside this service. The server is configured with a fixed map
//! of tokens to owner identities, read once at startup.

use std::collections::HashMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,
    #[error("invalid bearer credential")]
    InvalidCredential,
    #[error("invalid token configuration: {0}")]
    InvalidConfig(String),
}

/// Resolves a bearer credential to the identity that owns research records.
pub trait IdentityProvider: Send + Sync {
    fn identify(&self, token: &str) -> Result<String, AuthError>;
}

/// Extracts the token from an `Authorization` header value of the form `Bearer <token>`.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Identity provider backed by a fixed token map.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenIdentity {
    owners: HashMap<String, String>,
}

impl StaticTokenIdentity {
    pub fn new(owners: HashMap<String, String>) -> Self {
        Self { owners }
    }

    /// Parses a `token:owner,token:owner` list. Unset or blank input yields an empty map,
    /// which rejects every request.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidConfig` if an entry lacks a token or an owner.
    pub fn from_env_value(value: Option<String>) -> Result<Self, AuthError> {
        let mut owners = HashMap::new();
        let Some(value) = value else {
            return Ok(Self::new(owners));
        };

        for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (token, owner) = entry
                .split_once(':')
                .map(|(t, o)| (t.trim(), o.trim()))
                .filter(|(t, o)| !t.is_empty() && !o.is_empty())
                .ok_or_else(|| {
                    AuthError::InvalidConfig(format!(
                        "expected 'token:owner', got an entry of {} characters",
                        entry.len()
                    ))
                })?;
            owners.insert(token.to_string(), owner.to_string());
        }
        if owners.is_empty() {
            tracing::warn!("no API tokens configured; all research requests will be rejected");
        }
        Ok(Self::new(owners))
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

impl IdentityProvider for StaticTokenIdentity {
    fn identify(&self, token: &str) -> Result<String, AuthError> {
        self.owners
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer   abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn test_static_tokens_from_env_value() {
        let identity =
            StaticTokenIdentity::from_env_value(Some(" t1:alice , t2:bob,".into())).unwrap();
        assert_eq!(identity.len(), 2);
        assert_eq!(identity.identify("t1"), Ok("alice".to_string()));
        assert_eq!(identity.identify("t2"), Ok("bob".to_string()));
        assert_eq!(identity.identify("t3"), Err(AuthError::InvalidCredential));
    }

    #[test]
    fn test_malformed_token_config_is_rejected() {
        assert!(matches!(
            StaticTokenIdentity::from_env_value(Some("t1".into())),
            Err(AuthError::InvalidConfig(_))
        ));
        assert!(matches!(
            StaticTokenIdentity::from_env_value(Some("t1:".into())),
            Err(AuthError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unset_tokens_reject_everything() {
        let identity = StaticTokenIdentity::from_env_value(None).unwrap();
        assert!(identity.is_empty());
        assert!(identity.identify("anything").is_err());
    }
}
