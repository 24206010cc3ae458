//! OAuth2 authorization-code login for third-party identity providers.
//!
//! The flow redirects the browser to the provider's consent screen with an
//! encrypted `state`, verifies that state on the callback before redeeming the
//! authorization code, then fetches the user's profile and maps it into an
//! [`AuthenticatedPrincipal`]. Nothing is stored per login except the nonces of
//! states that have already been used.

mod client;
mod config;
mod error;
mod properties;
mod provider;
mod routes;
mod state;
mod types;


pub use client::OAuth2Client;
pub use config::{
    AccessTokenPlacement, ClientRegistration, DEFAULT_SCOPE, MAX_STATE_TTL_SECONDS, OAuth2Config,
    TokenRequestEncoding, UserInfoMapping, authorization_path, callback_path,
    resolve_redirect_uri,
};
pub use error::{ErrorClass, OAuth2Error, OAuth2Result};
pub use properties::{
    AUTHORIZATION_CODE_GRANT, OAuth2ClientProperties, ProviderPreset, ProviderProperties,
    RegistrationProperties, merge_registration,
};
pub use provider::OAuth2Provider;
pub use routes::{JsonPrincipalResponder, LoginCompletion, login_router};
pub use state::{ConsumedStateStore, InMemoryConsumedStateStore, OAuth2State, StateCodec};
pub use types::{AuthorizationRedirect, CallbackParams, TokenResponse, UserInfoResponse};

// Re-export common types for convenience
pub use ras_identity_core::{AuthenticatedPrincipal, IdentityProvider};
