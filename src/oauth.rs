//! Token-endpoint client: the two form-encoded grants behind HTTP Basic client authentication.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{Client as ReqwestClient, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::{ConfigError, TokenEndpointError},
	flows,
};

/// Bitbucket Cloud browser-facing authorize endpoint.
pub const BITBUCKET_AUTHORIZE_URL: &str = "https://bitbucket.org/site/oauth2/authorize";
/// Bitbucket Cloud token endpoint.
pub const BITBUCKET_TOKEN_URL: &str = "https://bitbucket.org/site/oauth2/access_token";

/// Authorize + token endpoint pair targeted by the OAuth provider.
///
/// Both fields are public so integration tests can aim the provider at a mock server.
#[derive(Clone, Debug)]
pub struct Endpoints {
	/// Browser-facing authorize URL for the code grant redirect.
	pub authorize: Url,
	/// Token URL receiving the code-exchange and refresh POSTs.
	pub token: Url,
}
impl Endpoints {
	/// Bitbucket Cloud production endpoints.
	pub fn bitbucket() -> Result<Self, ConfigError> {
		Ok(Self {
			authorize: parse_endpoint(BITBUCKET_AUTHORIZE_URL)?,
			token: parse_endpoint(BITBUCKET_TOKEN_URL)?,
		})
	}
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|e| ConfigError::InvalidEndpoint { source: e })
}

/// Wire shape of a successful token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
	/// Fresh access token.
	pub access_token: String,
	/// Rotated refresh token.
	pub refresh_token: String,
	/// Access token lifetime in seconds.
	pub expires_in: u64,
	/// Token type label; Bitbucket always answers `bearer`.
	pub token_type: String,
}
impl TokenResponse {
	/// Stamps the absolute expiry from `now` and wraps the secrets into a [`Credential`].
	pub fn into_credential(self, now: OffsetDateTime) -> Credential {
		Credential::issue(now, self.access_token, self.refresh_token, self.expires_in)
	}
}

/// Minimal client for the provider's token endpoint.
///
/// Owns the HTTP handle plus the client credentials so both grants share one Basic
/// authorization header and one response-parsing path. Neither grant retries internally.
#[derive(Clone)]
pub struct TokenClient {
	http: ReqwestClient,
	endpoints: Endpoints,
	client_id: String,
	client_secret: String,
}
impl TokenClient {
	/// Creates a client for the provided endpoints and OAuth consumer credentials.
	pub fn new(
		endpoints: Endpoints,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		Self {
			http: ReqwestClient::new(),
			endpoints,
			client_id: client_id.into(),
			client_secret: client_secret.into(),
		}
	}

	/// Replaces the underlying HTTP client.
	pub fn with_http_client(mut self, client: ReqwestClient) -> Self {
		self.http = client;

		self
	}

	/// Browser-facing authorize URL for the configured client and redirect URI.
	pub fn authorize_url(&self, redirect_uri: &Url) -> Url {
		flows::build_authorize_url(&self.endpoints.authorize, &self.client_id, redirect_uri)
	}

	/// Exchanges a one-time authorization code for a fresh credential pair.
	pub async fn exchange_code(
		&self,
		code: &str,
		redirect_uri: &Url,
	) -> Result<Credential, TokenEndpointError> {
		self.request_token(&[
			("grant_type", "authorization_code"),
			("code", code),
			("redirect_uri", redirect_uri.as_str()),
		])
		.await
	}

	/// Renews the credential pair from a refresh token.
	pub async fn refresh(&self, refresh_token: &str) -> Result<Credential, TokenEndpointError> {
		self.request_token(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
			.await
	}

	async fn request_token(
		&self,
		form: &[(&str, &str)],
	) -> Result<Credential, TokenEndpointError> {
		let response = self
			.http
			.post(self.endpoints.token.clone())
			.header(AUTHORIZATION, self.basic_authorization())
			.form(form)
			.send()
			.await?;
		let status = response.status();
		let body = response.bytes().await?;

		if !status.is_success() {
			return Err(TokenEndpointError::Status {
				status: status.as_u16(),
				body: String::from_utf8_lossy(&body).into_owned(),
			});
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&body);
		let parsed: TokenResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|e| TokenEndpointError::Parse { source: e, status: status.as_u16() })?;

		Ok(parsed.into_credential(OffsetDateTime::now_utc()))
	}

	fn basic_authorization(&self) -> String {
		let pair = format!("{}:{}", self.client_id, self.client_secret);

		format!("Basic {}", STANDARD.encode(pair))
	}
}
impl Debug for TokenClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenClient")
			.field("endpoints", &self.endpoints)
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.finish()
	}
}
