//! Environment-driven strategy selection for the authorization capability.
//!
//! Precedence, in order: an explicit bearer token variable, the OAuth consumer key + secret
//! pair, a previously stored unexpired credential reinterpreted as a bearer token, and finally
//! a configuration error carrying a remediation hint. Exactly one strategy is chosen per
//! resolution; strategies never merge.

// std
use std::env;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	provider::{AuthProvider, BearerProvider, OAuthProvider},
	store::FileStore,
};

/// Bearer-token environment variable (highest precedence).
pub const TOKEN_ENV: &str = "BITBUCKET_TOKEN";
/// OAuth consumer key environment variable.
pub const CLIENT_ID_ENV: &str = "BITBUCKET_OAUTH_CLIENT_ID";
/// OAuth consumer secret environment variable.
pub const CLIENT_SECRET_ENV: &str = "BITBUCKET_OAUTH_CLIENT_SECRET";

/// Auth strategy selected from the environment.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthConfig {
	/// Static bearer token, explicit or recovered from an unexpired stored record.
	Bearer {
		/// Token presented verbatim on every request.
		token: String,
	},
	/// Authorization-code + refresh strategy driven by consumer credentials.
	OAuth {
		/// OAuth consumer key.
		client_id: String,
		/// OAuth consumer secret.
		client_secret: String,
	},
}
impl AuthConfig {
	/// Resolves the strategy from the process environment and the default store.
	pub fn from_env() -> Result<Self> {
		let store = FileStore::from_home()?;

		Self::resolve(|key| env::var(key).ok(), &store)
	}

	/// Resolves the strategy from an injectable environment lookup and store.
	///
	/// Unset and empty variables are equivalent; an empty `BITBUCKET_TOKEN` falls through to
	/// the next precedence level instead of producing an empty header.
	pub fn resolve(
		lookup: impl Fn(&str) -> Option<String>,
		store: &FileStore,
	) -> Result<Self> {
		let var = |key| lookup(key).filter(|value: &String| !value.is_empty());

		if let Some(token) = var(TOKEN_ENV) {
			return Ok(Self::Bearer { token });
		}
		if let (Some(client_id), Some(client_secret)) =
			(var(CLIENT_ID_ENV), var(CLIENT_SECRET_ENV))
		{
			return Ok(Self::OAuth { client_id, client_secret });
		}
		if let Some(stored) = store.load()? {
			if stored.is_live_at(OffsetDateTime::now_utc()) {
				return Ok(Self::Bearer { token: stored.access_token.expose().to_string() });
			}
		}

		Err(ConfigError::MissingCredentials.into())
	}

	/// Constructs the provider matching this strategy.
	pub fn into_provider(self) -> Result<Box<dyn AuthProvider>> {
		match self {
			Self::Bearer { token } => Ok(Box::new(BearerProvider::new(token))),
			Self::OAuth { client_id, client_secret } =>
				Ok(Box::new(OAuthProvider::new(client_id, client_secret)?)),
		}
	}
}
impl Debug for AuthConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"<redacted>").finish(),
			Self::OAuth { client_id, .. } => f
				.debug_struct("OAuth")
				.field("client_id", client_id)
				.field("client_secret", &"<redacted>")
				.finish(),
		}
	}
}

/// Resolves the environment and constructs the matching provider in one step.
pub fn resolve_provider() -> Result<Box<dyn AuthProvider>> {
	AuthConfig::from_env()?.into_provider()
}
