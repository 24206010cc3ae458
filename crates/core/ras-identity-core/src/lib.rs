//! Core identity provider traits and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Attribute key holding the display name of a principal.
pub const NAME_ATTRIBUTE: &str = "name";
/// Attribute key holding the email address of a principal.
pub const EMAIL_ATTRIBUTE: &str = "email";
/// Attribute key holding the avatar URL of a principal.
pub const AVATAR_ATTRIBUTE: &str = "avatar";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid authentication payload")]
    InvalidPayload,
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Profile fields pulled from an identity provider's user-info response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAttributes {
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// The identity produced by a successful login and handed to the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedPrincipal {
    /// Registration id of the provider that authenticated this principal.
    pub provider_id: String,
    /// Key in `attributes` that names the principal.
    pub name_attribute_key: String,
    pub attributes: BTreeMap<String, String>,
    pub authorities: Vec<String>,
}

impl AuthenticatedPrincipal {
    pub fn from_profile(
        provider_id: impl Into<String>,
        profile: ProfileAttributes,
        authorities: Vec<String>,
    ) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(NAME_ATTRIBUTE.to_string(), profile.name);
        if let Some(email) = profile.email {
            attributes.insert(EMAIL_ATTRIBUTE.to_string(), email);
        }
        if let Some(avatar_url) = profile.avatar_url {
            attributes.insert(AVATAR_ATTRIBUTE.to_string(), avatar_url);
        }

        Self {
            provider_id: provider_id.into(),
            name_attribute_key: NAME_ATTRIBUTE.to_string(),
            attributes,
            authorities,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn name(&self) -> &str {
        self.attribute(&self.name_attribute_key).unwrap_or_default()
    }

    pub fn email(&self) -> Option<&str> {
        self.attribute(EMAIL_ATTRIBUTE)
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.attribute(AVATAR_ATTRIBUTE)
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn verify(&self, auth_payload: serde_json::Value)
    -> IdentityResult<AuthenticatedPrincipal>;
}

/// Resolves the authorities granted to a freshly authenticated principal.
#[async_trait]
pub trait UserPermissions: Send + Sync {
    async fn get_permissions(&self, principal: &AuthenticatedPrincipal)
    -> IdentityResult<Vec<String>>;
}

/// A default implementation that returns no permissions
pub struct NoopPermissions;

#[async_trait]
impl UserPermissions for NoopPermissions {
    async fn get_permissions(
        &self,
        _principal: &AuthenticatedPrincipal,
    ) -> IdentityResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// A static permissions provider that returns the same permissions for all users
pub struct StaticPermissions {
    permissions: Vec<String>,
}

impl StaticPermissions {
    pub fn new(permissions: Vec<String>) -> Self {
        Self { permissions }
    }
}

#[async_trait]
impl UserPermissions for StaticPermissions {
    async fn get_permissions(
        &self,
        _principal: &AuthenticatedPrincipal,
    ) -> IdentityResult<Vec<String>> {
        Ok(self.permissions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> ProfileAttributes {
        ProfileAttributes {
            name: "Alice".to_string(),
            email: Some("a@x.com".to_string()),
            avatar_url: None,
        }
    }

    #[test]
    fn test_principal_from_profile() {
        let principal = AuthenticatedPrincipal::from_profile("dingtalk", alice(), Vec::new());

        assert_eq!(principal.provider_id, "dingtalk");
        assert_eq!(principal.name(), "Alice");
        assert_eq!(principal.email(), Some("a@x.com"));
        assert_eq!(principal.avatar_url(), None);
        assert!(principal.authorities.is_empty());
        assert!(!principal.attributes.contains_key(AVATAR_ATTRIBUTE));
    }

    #[test]
    fn test_error_messages() {
        let err = IdentityError::ProviderError("token endpoint returned 500".to_string());

        assert_eq!(err.clone(), err);
        assert_eq!(err.to_string(), "Provider error: token endpoint returned 500");
        assert_eq!(IdentityError::InvalidCredentials.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_permission_providers() {
        let principal = AuthenticatedPrincipal::from_profile("dingtalk", alice(), Vec::new());

        let none = NoopPermissions.get_permissions(&principal).await.unwrap();
        assert!(none.is_empty());

        let fixed = StaticPermissions::new(vec!["user:read".to_string()]);
        assert_eq!(
            fixed.get_permissions(&principal).await.unwrap(),
            vec!["user:read".to_string()]
        );
    }
}
