//! OAuth2 authorization-code flow with PKCE against Google's endpoints.
//!
//! Consent, code exchange and refresh are delegated to the `oauth2` crate.
//! Token requests go through a reqwest client that never follows redirects.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use encore_domain::{AuthorizationRequest, EncoreError, GoogleCalendarConfig, Result, TokenGrant};
use oauth2::basic::{
    BasicErrorResponse, BasicErrorResponseType, BasicRevocationErrorResponse,
    BasicTokenIntrospectionResponse, BasicTokenType,
};
use oauth2::{
    AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, ExtraTokenFields, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl,
    RefreshToken, RequestTokenError, Scope, StandardRevocableToken, StandardTokenResponse,
    TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::http::HttpClient;

const SCOPES: [&str; 3] = ["https://www.googleapis.com/auth/calendar.events", "openid", "email"];

/// Google returns an `id_token` next to the standard OAuth fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl ExtraTokenFields for IdTokenFields {}

type GoogleTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;

type GoogleOAuthClient = Client<
    BasicErrorResponse,
    GoogleTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// OAuth client for the Google Calendar integration
pub struct GoogleOAuth {
    client: GoogleOAuthClient,
    http: HttpClient,
}

impl GoogleOAuth {
    pub fn new(config: &GoogleCalendarConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(EncoreError::Config("Google client id is not configured".into()));
        }

        let auth_url = AuthUrl::new(config.auth_url.clone())
            .map_err(|e| EncoreError::Config(format!("invalid Google auth url: {e}")))?;
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| EncoreError::Config(format!("invalid Google token url: {e}")))?;
        let redirect_url = RedirectUrl::new(config.redirect_uri.clone())
            .map_err(|e| EncoreError::Config(format!("invalid OAuth redirect uri: {e}")))?;

        let client = Client::new(ClientId::new(config.client_id.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);
        let client = match config.client_secret.clone().filter(|s| !s.is_empty()) {
            Some(secret) => client.set_client_secret(ClientSecret::new(secret)),
            None => client,
        };

        let http = HttpClient::builder()
            .follow_redirects(false)
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self { client, http })
    }

    /// Consent URL requesting offline access, with a fresh state and PKCE pair.
    pub fn authorization_url(&self) -> AuthorizationRequest {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let mut request = self.client.authorize_url(CsrfToken::new_random);
        for scope in SCOPES {
            request = request.add_scope(Scope::new(scope.to_string()));
        }
        let (url, state) = request
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(challenge)
            .url();

        AuthorizationRequest {
            url: url.to_string(),
            state: state.secret().clone(),
            pkce_verifier: verifier.secret().clone(),
        }
    }

    pub async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> Result<TokenGrant> {
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(self.http.inner())
            .await
            .map_err(map_token_error)?;
        debug!("exchanged authorization code");
        Ok(grant_from_response(&response))
    }

    /// Fails with `TokenRevoked` when Google answers `invalid_grant`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(self.http.inner())
            .await
            .map_err(map_token_error)?;
        Ok(grant_from_response(&response))
    }
}

fn grant_from_response(response: &GoogleTokenResponse) -> TokenGrant {
    let id_token = response.extra_fields().id_token.clone();
    TokenGrant {
        access_token: response.access_token().secret().clone(),
        refresh_token: response.refresh_token().map(|t| t.secret().clone()),
        expires_in: response.expires_in().map(|d| d.as_secs() as i64),
        email: id_token.as_deref().and_then(email_from_id_token),
        id_token,
    }
}

fn map_token_error<RE>(err: RequestTokenError<RE, BasicErrorResponse>) -> EncoreError
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => match response.error() {
            BasicErrorResponseType::InvalidGrant => EncoreError::TokenRevoked(
                response
                    .error_description()
                    .cloned()
                    .unwrap_or_else(|| "Google rejected the refresh token".to_string()),
            ),
            _ => EncoreError::Auth(response.to_string()),
        },
        RequestTokenError::Request(e) => EncoreError::Network(format!("token request failed: {e}")),
        RequestTokenError::Parse(e, _) => {
            EncoreError::Provider(format!("unreadable token response: {e}"))
        }
        RequestTokenError::Other(message) => EncoreError::Provider(message),
    }
}

#[derive(Deserialize)]
struct IdTokenClaims {
    email: Option<String>,
}

/// Read the `email` claim from an id_token payload. The signature is not
/// verified.
pub fn email_from_id_token(id_token: &str) -> Option<String> {
    let payload = id_token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    match serde_json::from_slice::<IdTokenClaims>(&bytes) {
        Ok(claims) => claims.email,
        Err(err) => {
            warn!(error = %err, "id_token payload is not valid JSON");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn id_token(email: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(json!({"email": email, "sub": "1"}).to_string());
        format!("{header}.{payload}.signature")
    }

    fn config(token_url: String) -> GoogleCalendarConfig {
        GoogleCalendarConfig {
            client_id: "client-123".into(),
            client_secret: Some("secret".into()),
            token_url,
            ..GoogleCalendarConfig::default()
        }
    }

    #[test]
    fn unconfigured_client_is_rejected() {
        let result = GoogleOAuth::new(&GoogleCalendarConfig::default());
        assert!(matches!(result, Err(EncoreError::Config(_))));
    }

    #[test]
    fn authorization_url_requests_offline_consent_with_pkce() {
        let oauth = GoogleOAuth::new(&config("https://oauth2.googleapis.com/token".into())).unwrap();
        let request = oauth.authorization_url();
        let url = Url::parse(&request.url).unwrap();
        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(query["client_id"], "client-123");
        assert_eq!(query["access_type"], "offline");
        assert_eq!(query["prompt"], "consent");
        assert_eq!(query["code_challenge_method"], "S256");
        assert_eq!(query["state"], request.state);
        assert!(query["scope"].contains("calendar.events"));
        assert!(!request.pkce_verifier.is_empty());
    }

    #[test]
    fn email_is_read_from_id_token() {
        assert_eq!(email_from_id_token(&id_token("sam@example.com")).as_deref(), Some("sam@example.com"));
        assert_eq!(email_from_id_token("not-a-jwt"), None);
    }

    #[tokio::test]
    async fn code_exchange_returns_tokens_and_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("code_verifier=verifier-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "access-1",
                "refresh_token": "refresh-1",
                "expires_in": 3599,
                "token_type": "Bearer",
                "id_token": id_token("lead@example.com"),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let oauth = GoogleOAuth::new(&config(format!("{}/token", server.uri()))).unwrap();
        let grant = oauth.exchange_code("code-1", "verifier-abc").await.unwrap();

        assert_eq!(grant.access_token, "access-1");
        assert_eq!(grant.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(grant.expires_in, Some(3599));
        assert_eq!(grant.email.as_deref(), Some("lead@example.com"));
    }

    #[tokio::test]
    async fn invalid_grant_on_refresh_means_revoked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&server)
            .await;

        let oauth = GoogleOAuth::new(&config(format!("{}/token", server.uri()))).unwrap();
        let err = oauth.refresh("stale").await.unwrap_err();
        assert!(err.is_token_revoked(), "got {err:?}");
        assert_eq!(err.message(), "Token has been expired or revoked.");
    }

    #[tokio::test]
    async fn other_oauth_errors_are_auth_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_client"})),
            )
            .mount(&server)
            .await;

        let oauth = GoogleOAuth::new(&config(format!("{}/token", server.uri()))).unwrap();
        let err = oauth.refresh("anything").await.unwrap_err();
        assert!(matches!(err, EncoreError::Auth(_)), "got {err:?}");
    }
}
