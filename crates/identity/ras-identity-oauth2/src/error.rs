//! OAuth2 error types.

use thiserror::Error;

pub type OAuth2Result<T> = Result<T, OAuth2Error>;

/// Coarse grouping of [`OAuth2Error`] used to pick the user-facing outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The callback could not be bound to a login this service started.
    Forgery,
    /// The provider rejected the attempt or could not be reached. The
    /// authorization code is spent, so the attempt is over; the user may
    /// start a new login.
    Upstream,
    /// The registration or local setup is broken and needs an operator.
    Configuration,
}

#[derive(Debug, Error)]
pub enum OAuth2Error {
    #[error("Token endpoint unreachable: {0}")]
    TokenEndpointUnreachable(#[source] reqwest::Error),

    #[error("User info endpoint unreachable: {0}")]
    UserInfoEndpointUnreachable(#[source] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid state parameter: {0}")]
    InvalidState(String),

    #[error("State parameter expired")]
    StateExpired,

    #[error("State parameter already used")]
    StateReplayed,

    #[error("State encryption failed")]
    StateEncryptionFailed,

    #[error("Missing authorization code")]
    MissingAuthorizationCode,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("User info request failed: {0}")]
    UserInfoFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Identity error: {0}")]
    IdentityError(#[from] ras_identity_core::IdentityError),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Invalid user info response: {0}")]
    InvalidUserInfoResponse(String),

    #[error("Callback error: {0}")]
    CallbackError(String),
}

impl OAuth2Error {
    pub fn class(&self) -> ErrorClass {
        match self {
            OAuth2Error::InvalidState(_) | OAuth2Error::StateExpired | OAuth2Error::StateReplayed => {
                ErrorClass::Forgery
            }
            OAuth2Error::ConfigError(_)
            | OAuth2Error::StateEncryptionFailed
            | OAuth2Error::UrlError(_)
            | OAuth2Error::SerializationError(_) => ErrorClass::Configuration,
            OAuth2Error::TokenEndpointUnreachable(_)
            | OAuth2Error::UserInfoEndpointUnreachable(_)
            | OAuth2Error::MissingAuthorizationCode
            | OAuth2Error::TokenExchangeFailed(_)
            | OAuth2Error::UserInfoFailed(_)
            | OAuth2Error::IdentityError(_)
            | OAuth2Error::InvalidTokenResponse(_)
            | OAuth2Error::InvalidUserInfoResponse(_)
            | OAuth2Error::CallbackError(_) => ErrorClass::Upstream,
        }
    }

    /// True when the provider could not be reached in time, as opposed to
    /// rejecting the request. Only the user can retry, by starting a new login.
    pub fn is_transient(&self) -> bool {
        match self {
            OAuth2Error::TokenEndpointUnreachable(e)
            | OAuth2Error::UserInfoEndpointUnreachable(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Text safe to show the end user. Never contains provider responses.
    pub fn user_message(&self) -> &'static str {
        match self.class() {
            ErrorClass::Forgery => "Failed to verify the state parameter",
            ErrorClass::Upstream => "Login failed, please try again",
            ErrorClass::Configuration => "Login is currently unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert_eq!(OAuth2Error::StateReplayed.class(), ErrorClass::Forgery);
        assert_eq!(
            OAuth2Error::InvalidState("bad base64".to_string()).class(),
            ErrorClass::Forgery
        );
        assert_eq!(
            OAuth2Error::TokenExchangeFailed("invalid_grant".to_string()).class(),
            ErrorClass::Upstream
        );
        assert_eq!(
            OAuth2Error::ConfigError("missing".to_string()).class(),
            ErrorClass::Configuration
        );
    }

    #[test]
    fn test_user_message_hides_details() {
        let err = OAuth2Error::TokenExchangeFailed("secret provider detail".to_string());
        assert!(!err.user_message().contains("secret provider detail"));
        assert!(!err.is_transient());
        assert_eq!(
            OAuth2Error::StateExpired.user_message(),
            "Failed to verify the state parameter"
        );
    }
}
