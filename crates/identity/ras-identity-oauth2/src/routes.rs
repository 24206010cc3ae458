//! Browser-facing endpoints: the login redirect and the provider callback.

use crate::config::{authorization_path, callback_path};
use crate::error::{ErrorClass, OAuth2Error};
use crate::provider::OAuth2Provider;
use crate::types::CallbackParams;
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use ras_identity_core::AuthenticatedPrincipal;
use std::sync::Arc;
use tracing::{error, warn};

/// Hands a freshly authenticated principal to the surrounding session layer
/// and produces the response for the callback request.
#[async_trait]
pub trait LoginCompletion: Send + Sync {
    async fn complete(&self, principal: AuthenticatedPrincipal) -> Response;
}

/// Responds with the principal as JSON. Useful when a front end owns the
/// session.
pub struct JsonPrincipalResponder;

#[async_trait]
impl LoginCompletion for JsonPrincipalResponder {
    async fn complete(&self, principal: AuthenticatedPrincipal) -> Response {
        Json(principal).into_response()
    }
}

#[derive(Clone)]
struct LoginState {
    provider: Arc<OAuth2Provider>,
    completion: Arc<dyn LoginCompletion>,
}

/// Routes `GET /oauth2/authorization/<id>` and `GET /login/oauth2/code/<id>`
/// for the provider's registration.
pub fn login_router(
    provider: Arc<OAuth2Provider>,
    completion: Arc<dyn LoginCompletion>,
) -> Router<()> {
    let registration_id = provider.registration().registration_id.clone();

    Router::new()
        .route(&authorization_path(&registration_id), get(authorize_handler))
        .route(&callback_path(&registration_id), get(callback_handler))
        .with_state(LoginState {
            provider,
            completion,
        })
}

async fn authorize_handler(State(state): State<LoginState>) -> Response {
    match state.provider.initiate() {
        Ok(redirect) => (StatusCode::FOUND, [(header::LOCATION, redirect.url)]).into_response(),
        Err(e) => failure_response(&state.provider, e),
    }
}

async fn callback_handler(
    State(state): State<LoginState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match state.provider.complete_login(params).await {
        Ok(principal) => state.completion.complete(principal).await,
        Err(e) => failure_response(&state.provider, e),
    }
}

fn failure_response(provider: &OAuth2Provider, err: OAuth2Error) -> Response {
    let registration_id = &provider.registration().registration_id;

    let status = match err.class() {
        ErrorClass::Forgery => {
            warn!(
                target: "security",
                "Rejected OAuth2 callback for '{}': {}", registration_id, err
            );
            StatusCode::BAD_REQUEST
        }
        ErrorClass::Upstream => {
            error!("OAuth2 login for '{}' failed: {}", registration_id, err);
            StatusCode::BAD_GATEWAY
        }
        ErrorClass::Configuration => {
            error!(
                "OAuth2 login for '{}' is misconfigured: {}",
                registration_id, err
            );
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, err.user_message()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AccessTokenPlacement, ClientRegistration, OAuth2Config, TokenRequestEncoding,
        UserInfoMapping,
    };
    use crate::state::InMemoryConsumedStateStore;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    const TEST_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn router() -> Router {
        let registration = ClientRegistration {
            registration_id: "dingtalk".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            authorization_endpoint: "https://login.example.com/oauth2/auth".to_string(),
            token_endpoint: "http://127.0.0.1:9/token".to_string(),
            userinfo_endpoint: "http://127.0.0.1:9/me".to_string(),
            callback_base_url: None,
            server_base_url: "http://localhost:8080".to_string(),
            scopes: vec!["openid".to_string()],
            token_request_encoding: TokenRequestEncoding::Json,
            access_token_placement: AccessTokenPlacement::Bearer,
            user_info_mapping: UserInfoMapping::default(),
        };
        let provider = OAuth2Provider::new(
            OAuth2Config::new(TEST_KEY),
            registration,
            Arc::new(InMemoryConsumedStateStore::new()),
        )
        .unwrap();

        login_router(Arc::new(provider), Arc::new(JsonPrincipalResponder))
    }

    #[tokio::test]
    async fn test_authorize_redirects_with_302() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/oauth2/authorization/dingtalk")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://login.example.com/oauth2/auth?prompt=consent"));
        assert!(location.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Flogin%2Foauth2%2Fcode%2Fdingtalk"
        ));
    }

    #[tokio::test]
    async fn test_forged_callback_gets_generic_400() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/login/oauth2/code/dingtalk?authCode=abc&state=forged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Failed to verify the state parameter");
    }

    #[tokio::test]
    async fn test_callback_without_params_rejected() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/login/oauth2/code/dingtalk")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
