//! OAuth2 protocol types.

use serde::{Deserialize, Serialize};

/// Where to send the browser to start a login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRedirect {
    pub url: String,
    /// Sealed state carried in `url`.
    pub state: String,
}

/// Query parameters of the provider callback.
///
/// DingTalk sends the code as `authCode`; RFC 6749 providers send `code`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
    #[serde(default, rename = "authCode", alias = "code")]
    pub auth_code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// JSON token request body for providers that take camelCase JSON.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonTokenRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub code: &'a str,
    pub grant_type: &'a str,
}

/// OAuth2 token response
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(alias = "accessToken")]
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default, alias = "expireIn")]
    pub expires_in: Option<u64>,
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .finish()
    }
}

/// User info response as returned by the provider, kept as raw claims and
/// read through a [`UserInfoMapping`](crate::UserInfoMapping).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserInfoResponse {
    pub claims: serde_json::Map<String, serde_json::Value>,
}

impl UserInfoResponse {
    /// String claim by name; empty strings count as absent.
    pub fn claim(&self, field: &str) -> Option<&str> {
        self.claims
            .get(field)
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_params_accept_both_code_names() {
        let dingtalk: CallbackParams =
            serde_json::from_value(serde_json::json!({"authCode": "abc", "state": "s"})).unwrap();
        assert_eq!(dingtalk.auth_code.as_deref(), Some("abc"));

        let standard: CallbackParams =
            serde_json::from_value(serde_json::json!({"code": "xyz"})).unwrap();
        assert_eq!(standard.auth_code.as_deref(), Some("xyz"));
        assert_eq!(standard.state, None);
    }

    #[test]
    fn test_token_response_camel_case() {
        let json = r#"{"accessToken": "tok-123", "refreshToken": "r", "expireIn": 7200}"#;

        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "tok-123");
        assert_eq!(token.expires_in, Some(7200));
        assert!(!format!("{:?}", token).contains("tok-123"));
    }

    #[test]
    fn test_token_response_snake_case() {
        let json = r#"{"access_token": "tok", "token_type": "Bearer", "expires_in": 3600}"#;

        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "tok");
        assert_eq!(token.token_type.as_deref(), Some("Bearer"));
    }

    #[test]
    fn test_user_info_claims() {
        let json = r#"{"nick": "Alice", "email": "", "avatarUrl": "http://x/a.png", "stateCode": 86}"#;

        let user_info: UserInfoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(user_info.claim("nick"), Some("Alice"));
        assert_eq!(user_info.claim("email"), None);
        assert_eq!(user_info.claim("stateCode"), None);
        assert_eq!(user_info.claim("missing"), None);
    }
}
