//! GitHub OAuth web flow.
//!
//! 1. [`GitHubOAuth::authorization_url`] builds the redirect to GitHub.
//! 2. GitHub calls back with `code` and `state`.
//! 3. [`GitHubOAuth::exchange_code`] trades the code for a user token.
//! 4. [`GitHubOAuth::fetch_identity`] reads `/user` with that token.

use reqwest::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use url::Url;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::types::GitHubIdentity;

/// Token endpoint response. GitHub reports failures with status 200 and an
/// `error` field, so both shapes are decoded here.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Client for GitHub's OAuth endpoints.
#[derive(Debug, Clone)]
pub struct GitHubOAuth {
    http_client: Client,
    client_id: String,
    client_secret: String,
    callback_url: String,
    scope: String,
    authorize_url: Url,
    token_url: Url,
    user_url: Url,
    user_agent: String,
}

impl GitHubOAuth {
    pub fn new(config: &AuthConfig, user_agent: impl Into<String>) -> AuthResult<Self> {
        Ok(Self {
            http_client: Client::builder().build()?,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            callback_url: config.callback_url.clone(),
            scope: config.scope.clone(),
            authorize_url: Url::parse(&config.authorize_url)?,
            token_url: Url::parse(&config.token_url)?,
            user_url: Url::parse(&config.user_url)?,
            user_agent: user_agent.into(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// GitHub authorization URL carrying `state`.
    pub fn authorization_url(&self, state: &str) -> AuthResult<Url> {
        if !self.is_configured() {
            return Err(AuthError::NotConfigured);
        }

        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.callback_url)
            .append_pair("scope", &self.scope)
            .append_pair("state", state);
        Ok(url)
    }

    /// Exchange an authorization code for a user access token.
    pub async fn exchange_code(&self, code: &str) -> AuthResult<String> {
        if !self.is_configured() {
            return Err(AuthError::NotConfigured);
        }

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.callback_url.as_str()),
        ];

        tracing::debug!(token_url = %self.token_url, "Exchanging authorization code");

        let response = self
            .http_client
            .post(self.token_url.clone())
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            AuthError::TokenExchange(format!("unexpected response ({status}): {e}"))
        })?;

        if let Some(error) = token.error {
            let description = token.error_description.unwrap_or_default();
            return Err(AuthError::TokenExchange(format!("{error}: {description}")));
        }
        if !status.is_success() {
            return Err(AuthError::TokenExchange(format!("status {status}")));
        }

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::TokenExchange("no access_token in response".to_string()))
    }

    /// Read the authenticated user with a user access token.
    pub async fn fetch_identity(&self, access_token: &str) -> AuthResult<GitHubIdentity> {
        let response = self
            .http_client
            .get(self.user_url.clone())
            .bearer_auth(access_token)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?
            .error_for_status()?;

        let identity: GitHubIdentity = response.json().await?;
        if identity.login.trim().is_empty() {
            return Err(AuthError::InvalidIdentity("empty login".to_string()));
        }
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn oauth_for(server: &MockServer) -> GitHubOAuth {
        let config = AuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret-456".to_string(),
            token_url: format!("{}/login/oauth/access_token", server.uri()),
            user_url: format!("{}/user", server.uri()),
            ..Default::default()
        };
        GitHubOAuth::new(&config, "devscope-tests").unwrap()
    }

    #[test]
    fn authorization_url_carries_parameters() {
        let config = AuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            ..Default::default()
        };
        let oauth = GitHubOAuth::new(&config, "devscope-tests").unwrap();
        let url = oauth.authorization_url("abc").unwrap();

        assert!(url.as_str().starts_with("https://github.com/login/oauth/authorize?"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".to_string(), "client-123".to_string())));
        assert!(pairs.contains(&("state".to_string(), "abc".to_string())));
        assert!(pairs.contains(&(
            "redirect_uri".to_string(),
            "http://localhost:5000/api/auth/github/callback".to_string()
        )));
    }

    #[test]
    fn unconfigured_client_refuses_login() {
        let oauth = GitHubOAuth::new(&AuthConfig::default(), "devscope-tests").unwrap();
        assert!(matches!(
            oauth.authorization_url("abc"),
            Err(AuthError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn exchange_returns_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .and(header("accept", "application/json"))
            .and(body_string_contains("code=the-code"))
            .and(body_string_contains("client_secret=secret-456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "gho_token",
                "token_type": "bearer",
                "scope": "user:email"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = oauth_for(&server).exchange_code("the-code").await.unwrap();
        assert_eq!(token, "gho_token");
    }

    #[tokio::test]
    async fn exchange_surfaces_error_in_ok_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": "bad_verification_code",
                "error_description": "The code passed is incorrect or expired."
            })))
            .mount(&server)
            .await;

        let err = oauth_for(&server).exchange_code("stale").await.unwrap_err();
        match err {
            AuthError::TokenExchange(msg) => assert!(msg.starts_with("bad_verification_code")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_identity_uses_user_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("authorization", "Bearer gho_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "login": "octocat",
                "name": "The Octocat",
                "avatar_url": "https://avatars.example/octocat"
            })))
            .mount(&server)
            .await;

        let identity = oauth_for(&server).fetch_identity("gho_token").await.unwrap();
        assert_eq!(identity.login, "octocat");
        assert_eq!(identity.html_url, None);
    }

    #[tokio::test]
    async fn fetch_identity_fails_on_401() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = oauth_for(&server).fetch_identity("revoked").await.unwrap_err();
        assert!(matches!(err, AuthError::Http(_)));
    }
}
