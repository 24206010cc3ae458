//! Outbound calls to the provider's token and user-info endpoints.

use crate::config::{AccessTokenPlacement, ClientRegistration, TokenRequestEncoding};
use crate::error::{OAuth2Error, OAuth2Result};
use crate::properties::AUTHORIZATION_CODE_GRANT;
use crate::types::{JsonTokenRequest, TokenResponse, UserInfoResponse};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};

/// OAuth2 HTTP client. Requests are bounded by the configured timeouts and
/// never retried: an authorization code can only be redeemed once.
#[derive(Clone)]
pub struct OAuth2Client {
    http_client: Client,
}

impl OAuth2Client {
    pub fn new(http_timeout_seconds: u64, connect_timeout_seconds: u64) -> OAuth2Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(http_timeout_seconds))
            .connect_timeout(Duration::from_secs(connect_timeout_seconds))
            .build()
            .map_err(|e| OAuth2Error::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    /// Exchange authorization code for tokens
    pub async fn exchange_code(
        &self,
        registration: &ClientRegistration,
        code: &str,
    ) -> OAuth2Result<TokenResponse> {
        let request = self.http_client.post(&registration.token_endpoint);

        let request = match registration.token_request_encoding {
            TokenRequestEncoding::Json => request.json(&JsonTokenRequest {
                client_id: &registration.client_id,
                client_secret: &registration.client_secret,
                code,
                grant_type: AUTHORIZATION_CODE_GRANT,
            }),
            TokenRequestEncoding::Form => {
                let redirect_uri = registration.redirect_uri();
                request.form(&[
                    ("grant_type", AUTHORIZATION_CODE_GRANT),
                    ("code", code),
                    ("client_id", registration.client_id.as_str()),
                    ("client_secret", registration.client_secret.as_str()),
                    ("redirect_uri", redirect_uri.as_str()),
                ])
            }
        };

        let response = request.send().await.map_err(|e| {
            error!("Token endpoint unreachable: {}", e);
            OAuth2Error::TokenEndpointUnreachable(e)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Token exchange failed with {}: {}", status, error_text);
            return Err(OAuth2Error::TokenExchangeFailed(format!(
                "{}: {}",
                status, error_text
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuth2Error::InvalidTokenResponse(e.to_string()))?;

        if token_response.access_token.is_empty() {
            return Err(OAuth2Error::InvalidTokenResponse(
                "empty access token".to_string(),
            ));
        }

        info!(
            "Exchanged authorization code for '{}'",
            registration.registration_id
        );
        Ok(token_response)
    }

    /// Get user info using access token
    pub async fn get_user_info(
        &self,
        registration: &ClientRegistration,
        access_token: &str,
    ) -> OAuth2Result<UserInfoResponse> {
        let request = self.http_client.get(&registration.userinfo_endpoint);

        let request = match &registration.access_token_placement {
            AccessTokenPlacement::Bearer => request.bearer_auth(access_token),
            AccessTokenPlacement::Header(name) => request.header(name.as_str(), access_token),
        };

        let response = request.send().await.map_err(|e| {
            error!("User info endpoint unreachable: {}", e);
            OAuth2Error::UserInfoEndpointUnreachable(e)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("User info request failed with {}: {}", status, error_text);
            return Err(OAuth2Error::UserInfoFailed(format!(
                "{}: {}",
                status, error_text
            )));
        }

        let user_info: UserInfoResponse = response
            .json()
            .await
            .map_err(|e| OAuth2Error::InvalidUserInfoResponse(e.to_string()))?;

        debug!(
            "Retrieved user info with {} claims",
            user_info.claims.len()
        );
        Ok(user_info)
    }
}
