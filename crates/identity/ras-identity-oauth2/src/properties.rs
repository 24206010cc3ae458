//! Client registration properties as loaded from configuration, and the
//! provider presets merged into them.

use crate::config::{AccessTokenPlacement, TokenRequestEncoding, UserInfoMapping, callback_path};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

pub const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

/// Raw OAuth2 client configuration keyed by registration id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuth2ClientProperties {
    #[serde(default)]
    pub registration: HashMap<String, RegistrationProperties>,
    #[serde(default)]
    pub provider: HashMap<String, ProviderProperties>,
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegistrationProperties {
    #[serde(alias = "client_id")]
    pub client_id: String,
    #[serde(alias = "client_secret")]
    pub client_secret: String,
    #[serde(default, alias = "authorization_grant_type")]
    pub authorization_grant_type: Option<String>,
    #[serde(default, alias = "redirect_uri")]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub scope: Vec<String>,
    /// Public base URL the provider should send the browser back to.
    #[serde(default, alias = "call_back_url")]
    pub call_back_url: Option<String>,
}

impl fmt::Debug for RegistrationProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationProperties")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("authorization_grant_type", &self.authorization_grant_type)
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .field("call_back_url", &self.call_back_url)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProviderProperties {
    #[serde(default, alias = "authorization_uri")]
    pub authorization_uri: Option<String>,
    #[serde(default, alias = "token_uri")]
    pub token_uri: Option<String>,
    #[serde(default, alias = "user_info_uri")]
    pub user_info_uri: Option<String>,
}

impl From<&ProviderPreset> for ProviderProperties {
    fn from(preset: &ProviderPreset) -> Self {
        Self {
            authorization_uri: Some(preset.authorization_uri.clone()),
            token_uri: Some(preset.token_uri.clone()),
            user_info_uri: Some(preset.user_info_uri.clone()),
        }
    }
}

/// Built-in knowledge about one identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPreset {
    pub registration_id: String,
    pub authorization_uri: String,
    pub token_uri: String,
    pub user_info_uri: String,
    pub token_request_encoding: TokenRequestEncoding,
    pub access_token_placement: AccessTokenPlacement,
    pub user_info_mapping: UserInfoMapping,
}

impl ProviderPreset {
    /// DingTalk's OAuth2 endpoints. The token endpoint takes a camelCase JSON
    /// body and the contact API expects the token in its own header.
    pub fn dingtalk() -> Self {
        Self {
            registration_id: "dingtalk".to_string(),
            authorization_uri: "https://login.dingtalk.com/oauth2/auth".to_string(),
            token_uri: "https://api.dingtalk.com/v1.0/oauth2/userAccessToken".to_string(),
            user_info_uri: "https://api.dingtalk.com/v1.0/contact/users/me".to_string(),
            token_request_encoding: TokenRequestEncoding::Json,
            access_token_placement: AccessTokenPlacement::Header(
                "x-acs-dingtalk-access-token".to_string(),
            ),
            user_info_mapping: UserInfoMapping {
                name_field: "nick".to_string(),
                email_field: "email".to_string(),
                avatar_field: "avatarUrl".to_string(),
            },
        }
    }
}

/// Fills in the preset's endpoints for a configured registration, forces the
/// authorization-code grant and points its redirect at the callback path.
///
/// Endpoints already present in `properties` are kept, so operators can
/// override them. Returns `false` when no registration with the preset's id
/// exists; callers that require it should follow up with
/// [`ClientRegistration::from_properties`](crate::ClientRegistration::from_properties).
pub fn merge_registration(properties: &mut OAuth2ClientProperties, preset: &ProviderPreset) -> bool {
    let id = preset.registration_id.as_str();

    let Some(registration) = properties.registration.get_mut(id) else {
        debug!("No '{}' registration configured, skipping merge", id);
        return false;
    };

    registration.authorization_grant_type = Some(AUTHORIZATION_CODE_GRANT.to_string());
    registration.redirect_uri = Some(callback_path(id));

    let provider = properties.provider.entry(id.to_string()).or_default();
    provider
        .authorization_uri
        .get_or_insert_with(|| preset.authorization_uri.clone());
    provider
        .token_uri
        .get_or_insert_with(|| preset.token_uri.clone());
    provider
        .user_info_uri
        .get_or_insert_with(|| preset.user_info_uri.clone());

    debug!("Merged provider endpoints into '{}' registration", id);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties() -> OAuth2ClientProperties {
        let mut properties = OAuth2ClientProperties::default();
        properties.registration.insert(
            "dingtalk".to_string(),
            RegistrationProperties {
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
                authorization_grant_type: Some("client_credentials".to_string()),
                ..RegistrationProperties::default()
            },
        );
        properties
    }

    #[test]
    fn test_merge_populates_registration() {
        let preset = ProviderPreset::dingtalk();
        let mut properties = properties();

        assert!(merge_registration(&mut properties, &preset));

        let registration = &properties.registration["dingtalk"];
        assert_eq!(
            registration.authorization_grant_type.as_deref(),
            Some("authorization_code")
        );
        assert_eq!(
            registration.redirect_uri.as_deref(),
            Some("/login/oauth2/code/dingtalk")
        );
        assert_eq!(properties.provider["dingtalk"], ProviderProperties::from(&preset));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let preset = ProviderPreset::dingtalk();
        let mut once = properties();
        merge_registration(&mut once, &preset);

        let mut twice = properties();
        merge_registration(&mut twice, &preset);
        merge_registration(&mut twice, &preset);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_without_registration_is_noop() {
        let preset = ProviderPreset::dingtalk();
        let mut properties = OAuth2ClientProperties::default();

        assert!(!merge_registration(&mut properties, &preset));
        assert!(properties.provider.is_empty());
    }

    #[test]
    fn test_merge_keeps_endpoint_overrides() {
        let preset = ProviderPreset::dingtalk();
        let mut properties = properties();
        properties.provider.insert(
            "dingtalk".to_string(),
            ProviderProperties {
                token_uri: Some("http://localhost:9000/token".to_string()),
                ..ProviderProperties::default()
            },
        );

        merge_registration(&mut properties, &preset);

        let provider = &properties.provider["dingtalk"];
        assert_eq!(provider.token_uri.as_deref(), Some("http://localhost:9000/token"));
        assert_eq!(
            provider.authorization_uri.as_deref(),
            Some(preset.authorization_uri.as_str())
        );
    }

    #[test]
    fn test_properties_deserialize_kebab_case() {
        let json = r#"{
            "registration": {
                "dingtalk": {
                    "client-id": "abc",
                    "client-secret": "def",
                    "call-back-url": "https://app.example/"
                }
            }
        }"#;

        let properties: OAuth2ClientProperties = serde_json::from_str(json).unwrap();
        let registration = &properties.registration["dingtalk"];
        assert_eq!(registration.client_id, "abc");
        assert_eq!(
            registration.call_back_url.as_deref(),
            Some("https://app.example/")
        );
        assert!(registration.scope.is_empty());
    }

    #[test]
    fn test_debug_redacts_client_secret() {
        let mut properties = properties();
        properties
            .registration
            .get_mut("dingtalk")
            .unwrap()
            .client_secret = "s3cr3t-value".to_string();

        let debug = format!("{:?}", properties);
        assert!(!debug.contains("s3cr3t-value"));
        assert!(debug.contains("client"));
    }
}
