//! OAuth2 authorization-code login for a single provider registration.

use crate::client::OAuth2Client;
use crate::config::{ClientRegistration, OAuth2Config};
use crate::error::{OAuth2Error, OAuth2Result};
use crate::state::{ConsumedStateStore, OAuth2State, StateCodec};
use crate::types::{AuthorizationRedirect, CallbackParams, UserInfoResponse};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use ras_identity_core::{
    AuthenticatedPrincipal, IdentityError, IdentityProvider, IdentityResult, NoopPermissions,
    ProfileAttributes, UserPermissions,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Drives the redirect / callback / profile handshake for one registration.
///
/// Cheap to clone; every login attempt is independent apart from the shared
/// consumed-state store.
#[derive(Clone)]
pub struct OAuth2Provider {
    registration: Arc<ClientRegistration>,
    client: OAuth2Client,
    state_codec: StateCodec,
    consumed_states: Arc<dyn ConsumedStateStore>,
    permissions: Arc<dyn UserPermissions>,
    state_ttl: Duration,
}

impl OAuth2Provider {
    pub fn new(
        config: OAuth2Config,
        registration: ClientRegistration,
        consumed_states: Arc<dyn ConsumedStateStore>,
    ) -> OAuth2Result<Self> {
        config.validate()?;
        registration.validate()?;

        let client = OAuth2Client::new(config.http_timeout_seconds, config.connect_timeout_seconds)?;
        let state_codec = StateCodec::from_hex_key(&config.state_key)?;
        let state_ttl = i64::try_from(config.state_ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| OAuth2Error::ConfigError("State TTL out of range".to_string()))?;

        Ok(Self {
            registration: Arc::new(registration),
            client,
            state_codec,
            consumed_states,
            permissions: Arc::new(NoopPermissions),
            state_ttl,
        })
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn UserPermissions>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn registration(&self) -> &ClientRegistration {
        &self.registration
    }

    pub fn consumed_states(&self) -> &Arc<dyn ConsumedStateStore> {
        &self.consumed_states
    }

    /// Builds the consent-screen URL with a freshly sealed state.
    pub fn initiate(&self) -> OAuth2Result<AuthorizationRedirect> {
        let registration = &self.registration;
        let mut url = Url::parse(&registration.authorization_endpoint)?;

        let state = self
            .state_codec
            .seal(&OAuth2State::new(&registration.registration_id))?;

        url.query_pairs_mut()
            .append_pair("prompt", "consent")
            .append_pair("scope", &registration.scopes.join(" "))
            .append_pair("response_type", "code")
            .append_pair("client_id", &registration.client_id)
            .append_pair("state", &state)
            .append_pair("redirect_uri", &registration.redirect_uri());

        info!(
            "Started OAuth2 login for registration: {}",
            registration.registration_id
        );

        Ok(AuthorizationRedirect {
            url: url.to_string(),
            state,
        })
    }

    /// Completes a login from the provider callback.
    ///
    /// The state is verified and burned before any outbound request is made.
    pub async fn complete_login(
        &self,
        callback: CallbackParams,
    ) -> OAuth2Result<AuthenticatedPrincipal> {
        let state = callback
            .state
            .as_deref()
            .ok_or_else(|| OAuth2Error::InvalidState("missing".to_string()))?;
        self.verify_state(state).await?;

        if let Some(error) = &callback.error {
            let error_desc = callback
                .error_description
                .as_deref()
                .unwrap_or("No description");
            return Err(OAuth2Error::CallbackError(format!(
                "{}: {}",
                error, error_desc
            )));
        }

        let code = callback
            .auth_code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or(OAuth2Error::MissingAuthorizationCode)?;

        let token_response = self.client.exchange_code(&self.registration, code).await?;

        let user_info = self
            .client
            .get_user_info(&self.registration, &token_response.access_token)
            .await?;

        let profile = self.map_user_info(&user_info)?;
        let mut principal = AuthenticatedPrincipal::from_profile(
            self.registration.registration_id.clone(),
            profile,
            Vec::new(),
        );
        principal.authorities = self.permissions.get_permissions(&principal).await?;

        info!(
            "Completed OAuth2 login for registration: {}",
            self.registration.registration_id
        );

        Ok(principal)
    }

    async fn verify_state(&self, sealed: &str) -> OAuth2Result<()> {
        let state = self.state_codec.open(sealed)?;

        if state.registration_id != self.registration.registration_id {
            return Err(OAuth2Error::InvalidState(format!(
                "issued for registration '{}'",
                state.registration_id
            )));
        }

        let expires_at = state.expires_at(self.state_ttl);
        if Utc::now() > expires_at {
            return Err(OAuth2Error::StateExpired);
        }

        self.consumed_states
            .consume(&state.nonce, expires_at)
            .await?;

        debug!("Verified state for registration: {}", state.registration_id);
        Ok(())
    }

    fn map_user_info(&self, user_info: &UserInfoResponse) -> OAuth2Result<ProfileAttributes> {
        let mapping = &self.registration.user_info_mapping;

        let name = user_info.claim(&mapping.name_field).ok_or_else(|| {
            OAuth2Error::InvalidUserInfoResponse(format!(
                "missing '{}' field",
                mapping.name_field
            ))
        })?;

        Ok(ProfileAttributes {
            name: name.to_string(),
            email: user_info.claim(&mapping.email_field).map(String::from),
            avatar_url: user_info.claim(&mapping.avatar_field).map(String::from),
        })
    }
}

#[async_trait]
impl IdentityProvider for OAuth2Provider {
    fn provider_id(&self) -> &str {
        &self.registration.registration_id
    }

    /// Accepts the callback query parameters as a JSON object.
    async fn verify(&self, auth_payload: serde_json::Value) -> IdentityResult<AuthenticatedPrincipal> {
        let callback: CallbackParams =
            serde_json::from_value(auth_payload).map_err(|_| IdentityError::InvalidPayload)?;

        self.complete_login(callback).await.map_err(|e| {
            warn!("OAuth2 login failed: {}", e);
            match e {
                OAuth2Error::IdentityError(inner) => inner,
                OAuth2Error::InvalidState(_)
                | OAuth2Error::StateExpired
                | OAuth2Error::StateReplayed => IdentityError::InvalidCredentials,
                other => IdentityError::ProviderError(other.to_string()),
            }
        })
    }
}
