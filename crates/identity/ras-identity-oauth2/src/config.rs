//! OAuth2 configuration types.

use crate::error::{OAuth2Error, OAuth2Result};
use crate::properties::{AUTHORIZATION_CODE_GRANT, OAuth2ClientProperties, ProviderPreset};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

pub const DEFAULT_SCOPE: &str = "openid";

/// Longest accepted state lifetime (one day).
pub const MAX_STATE_TTL_SECONDS: u64 = 86_400;

const CALLBACK_PATH_PREFIX: &str = "/login/oauth2/code/";
const AUTHORIZATION_PATH_PREFIX: &str = "/oauth2/authorization/";

/// Path the provider redirects back to after consent.
pub fn callback_path(registration_id: &str) -> String {
    format!("{}{}", CALLBACK_PATH_PREFIX, registration_id)
}

/// Path that starts a login by redirecting to the provider.
pub fn authorization_path(registration_id: &str) -> String {
    format!("{}{}", AUTHORIZATION_PATH_PREFIX, registration_id)
}

/// Builds the absolute callback URL. A non-blank `callback_base_url` wins over
/// `server_base_url`; trailing slashes are removed before the path is appended.
pub fn resolve_redirect_uri(
    callback_base_url: Option<&str>,
    server_base_url: &str,
    registration_id: &str,
) -> String {
    let base = callback_base_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(server_base_url);

    format!(
        "{}{}",
        base.trim_end_matches('/'),
        callback_path(registration_id)
    )
}

/// How the authorization code is sent to the token endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenRequestEncoding {
    /// `application/x-www-form-urlencoded` with RFC 6749 field names.
    #[default]
    Form,
    /// JSON body with camelCase field names (`clientId`, `grantType`, ...).
    Json,
}

/// Where the access token goes when calling the user-info endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTokenPlacement {
    /// `Authorization: Bearer <token>`
    #[default]
    Bearer,
    /// A provider specific header carrying the raw token.
    Header(String),
}

/// Mapping configuration for user info fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfoMapping {
    pub name_field: String,
    pub email_field: String,
    pub avatar_field: String,
}

impl Default for UserInfoMapping {
    fn default() -> Self {
        Self {
            name_field: "name".to_string(),
            email_field: "email".to_string(),
            avatar_field: "picture".to_string(),
        }
    }
}

/// A fully resolved provider registration. Built once at startup and shared
/// read-only by every login attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientRegistration {
    pub registration_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    /// Externally visible base URL for the callback. Blank means unset.
    pub callback_base_url: Option<String>,
    /// Externally visible base URL of this service.
    pub server_base_url: String,
    pub scopes: Vec<String>,
    pub token_request_encoding: TokenRequestEncoding,
    pub access_token_placement: AccessTokenPlacement,
    pub user_info_mapping: UserInfoMapping,
}

impl fmt::Debug for ClientRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistration")
            .field("registration_id", &self.registration_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("authorization_endpoint", &self.authorization_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("userinfo_endpoint", &self.userinfo_endpoint)
            .field("callback_base_url", &self.callback_base_url)
            .field("server_base_url", &self.server_base_url)
            .field("scopes", &self.scopes)
            .field("token_request_encoding", &self.token_request_encoding)
            .field("access_token_placement", &self.access_token_placement)
            .field("user_info_mapping", &self.user_info_mapping)
            .finish()
    }
}

impl ClientRegistration {
    /// Resolves the registration named by `preset` out of merged client
    /// properties. Fails when the registration or its provider entry is
    /// missing so a misconfigured login is caught at startup.
    pub fn from_properties(
        properties: &OAuth2ClientProperties,
        preset: &ProviderPreset,
        server_base_url: &str,
    ) -> OAuth2Result<Self> {
        let id = preset.registration_id.as_str();

        let registration = properties.registration.get(id).ok_or_else(|| {
            OAuth2Error::ConfigError(format!("Registration '{}' not configured", id))
        })?;
        let provider = properties.provider.get(id).ok_or_else(|| {
            OAuth2Error::ConfigError(format!("Provider '{}' not configured", id))
        })?;

        if let Some(grant_type) = &registration.authorization_grant_type {
            if grant_type != AUTHORIZATION_CODE_GRANT {
                return Err(OAuth2Error::ConfigError(format!(
                    "Registration '{}' uses unsupported grant type '{}'",
                    id, grant_type
                )));
            }
        }

        let required = |value: &Option<String>, name: &str| {
            value.clone().ok_or_else(|| {
                OAuth2Error::ConfigError(format!("Provider '{}' is missing {}", id, name))
            })
        };

        let scopes = if registration.scope.is_empty() {
            vec![DEFAULT_SCOPE.to_string()]
        } else {
            registration.scope.clone()
        };

        let resolved = Self {
            registration_id: id.to_string(),
            client_id: registration.client_id.clone(),
            client_secret: registration.client_secret.clone(),
            authorization_endpoint: required(&provider.authorization_uri, "authorization-uri")?,
            token_endpoint: required(&provider.token_uri, "token-uri")?,
            userinfo_endpoint: required(&provider.user_info_uri, "user-info-uri")?,
            callback_base_url: registration.call_back_url.clone(),
            server_base_url: server_base_url.to_string(),
            scopes,
            token_request_encoding: preset.token_request_encoding,
            access_token_placement: preset.access_token_placement.clone(),
            user_info_mapping: preset.user_info_mapping.clone(),
        };

        resolved.validate()?;
        Ok(resolved)
    }

    pub fn validate(&self) -> OAuth2Result<()> {
        let non_blank = [
            ("registration id", &self.registration_id),
            ("client id", &self.client_id),
            ("client secret", &self.client_secret),
        ];
        for (name, value) in non_blank {
            if value.trim().is_empty() {
                return Err(OAuth2Error::ConfigError(format!(
                    "Registration '{}' has a blank {}",
                    self.registration_id, name
                )));
            }
        }

        for endpoint in [
            &self.authorization_endpoint,
            &self.token_endpoint,
            &self.userinfo_endpoint,
        ] {
            Url::parse(endpoint)?;
        }
        Url::parse(&self.redirect_uri())?;

        Ok(())
    }

    pub fn redirect_uri(&self) -> String {
        resolve_redirect_uri(
            self.callback_base_url.as_deref(),
            &self.server_base_url,
            &self.registration_id,
        )
    }
}

/// Settings shared by every login flow.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuth2Config {
    /// Hex encoded 32 byte AES-256 key used to seal the state parameter.
    pub state_key: String,
    pub state_ttl_seconds: u64,
    pub http_timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

impl Default for OAuth2Config {
    fn default() -> Self {
        Self {
            state_key: String::new(),
            state_ttl_seconds: 600, // 10 minutes
            http_timeout_seconds: 30,
            connect_timeout_seconds: 10,
        }
    }
}

impl fmt::Debug for OAuth2Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Config")
            .field("state_key", &"<redacted>")
            .field("state_ttl_seconds", &self.state_ttl_seconds)
            .field("http_timeout_seconds", &self.http_timeout_seconds)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .finish()
    }
}

impl OAuth2Config {
    pub fn new(state_key: impl Into<String>) -> Self {
        Self {
            state_key: state_key.into(),
            ..Self::default()
        }
    }

    pub fn with_state_ttl(mut self, seconds: u64) -> Self {
        self.state_ttl_seconds = seconds;
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = seconds;
        self
    }

    pub fn with_connect_timeout(mut self, seconds: u64) -> Self {
        self.connect_timeout_seconds = seconds;
        self
    }

    pub fn validate(&self) -> OAuth2Result<()> {
        if self.state_ttl_seconds == 0 {
            return Err(OAuth2Error::ConfigError(
                "State TTL must be positive".to_string(),
            ));
        }
        if self.state_ttl_seconds > MAX_STATE_TTL_SECONDS {
            return Err(OAuth2Error::ConfigError(format!(
                "State TTL must not exceed {} seconds",
                MAX_STATE_TTL_SECONDS
            )));
        }
        if self.http_timeout_seconds == 0 || self.connect_timeout_seconds == 0 {
            return Err(OAuth2Error::ConfigError(
                "HTTP timeouts must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{
        ProviderProperties, RegistrationProperties, merge_registration,
    };

    #[test]
    fn test_redirect_uri_strips_trailing_slash() {
        assert_eq!(
            resolve_redirect_uri(Some("https://app.example/"), "http://ignored", "dingtalk"),
            "https://app.example/login/oauth2/code/dingtalk"
        );
        assert_eq!(
            resolve_redirect_uri(Some("https://app.example///"), "http://ignored", "dingtalk"),
            "https://app.example/login/oauth2/code/dingtalk"
        );
    }

    #[test]
    fn test_redirect_uri_falls_back_to_server_base() {
        assert_eq!(
            resolve_redirect_uri(None, "http://localhost:8080/", "dingtalk"),
            "http://localhost:8080/login/oauth2/code/dingtalk"
        );
        assert_eq!(
            resolve_redirect_uri(Some("   "), "http://localhost:8080", "dingtalk"),
            "http://localhost:8080/login/oauth2/code/dingtalk"
        );
    }

    fn properties_with_dingtalk() -> OAuth2ClientProperties {
        let mut properties = OAuth2ClientProperties::default();
        properties.registration.insert(
            "dingtalk".to_string(),
            RegistrationProperties {
                client_id: "client".to_string(),
                client_secret: "s3cr3t-value".to_string(),
                ..RegistrationProperties::default()
            },
        );
        properties
    }

    #[test]
    fn test_from_properties_after_merge() {
        let preset = ProviderPreset::dingtalk();
        let mut properties = properties_with_dingtalk();
        merge_registration(&mut properties, &preset);

        let registration =
            ClientRegistration::from_properties(&properties, &preset, "https://app.example")
                .unwrap();

        assert_eq!(registration.registration_id, "dingtalk");
        assert_eq!(registration.authorization_endpoint, preset.authorization_uri);
        assert_eq!(registration.scopes, vec!["openid".to_string()]);
        assert_eq!(
            registration.redirect_uri(),
            "https://app.example/login/oauth2/code/dingtalk"
        );
        assert!(!format!("{:?}", registration).contains("s3cr3t-value"));
    }

    #[test]
    fn test_from_properties_missing_registration() {
        let preset = ProviderPreset::dingtalk();
        let mut properties = OAuth2ClientProperties::default();
        merge_registration(&mut properties, &preset);

        let result =
            ClientRegistration::from_properties(&properties, &preset, "https://app.example");
        assert!(matches!(result, Err(OAuth2Error::ConfigError(_))));
    }

    #[test]
    fn test_from_properties_missing_provider() {
        let preset = ProviderPreset::dingtalk();
        let properties = properties_with_dingtalk();

        let result =
            ClientRegistration::from_properties(&properties, &preset, "https://app.example");
        assert!(matches!(result, Err(OAuth2Error::ConfigError(_))));
    }

    #[test]
    fn test_from_properties_rejects_blank_secret() {
        let preset = ProviderPreset::dingtalk();
        let mut properties = properties_with_dingtalk();
        properties
            .registration
            .get_mut("dingtalk")
            .unwrap()
            .client_secret = " ".to_string();
        properties
            .provider
            .insert("dingtalk".to_string(), ProviderProperties::from(&preset));

        let result =
            ClientRegistration::from_properties(&properties, &preset, "https://app.example");
        assert!(matches!(result, Err(OAuth2Error::ConfigError(_))));
    }

    #[test]
    fn test_config_validation() {
        assert!(OAuth2Config::new("00").validate().is_ok());
        assert!(OAuth2Config::new("00").with_state_ttl(0).validate().is_err());
        assert!(
            OAuth2Config::new("00")
                .with_state_ttl(MAX_STATE_TTL_SECONDS)
                .validate()
                .is_ok()
        );
        assert!(
            OAuth2Config::new("00")
                .with_state_ttl(u64::MAX)
                .validate()
                .is_err()
        );
        assert!(OAuth2Config::new("00").with_http_timeout(0).validate().is_err());
        assert!(!format!("{:?}", OAuth2Config::new("abcdef")).contains("abcdef"));
    }
}
