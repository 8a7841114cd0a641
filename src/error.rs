//! Error types shared across the store, flows, and providers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; fatal until the operator fixes the environment.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Authorization-code grant failure on the loopback leg; always fatal.
	#[error(transparent)]
	Authorization(#[from] AuthorizationError),
	/// Token endpoint failure; fatal for a code exchange, a fallback trigger for a refresh.
	#[error(transparent)]
	TokenEndpoint(#[from] TokenEndpointError),
	/// Credential storage failure.
	#[error("{0}")]
	Store(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No usable auth strategy could be resolved from the environment or storage.
	#[error(
		"No Bitbucket auth configured. Set BITBUCKET_TOKEN or BITBUCKET_OAUTH_CLIENT_ID + BITBUCKET_OAUTH_CLIENT_SECRET."
	)]
	MissingCredentials,
	/// The home directory hosting the credential file could not be determined.
	#[error("Home directory could not be determined.")]
	MissingHomeDir,
	/// An authorize or token endpoint URL failed to parse.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The loopback redirect URI failed to parse.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Fatal failures of the authorization-code grant's loopback leg.
#[derive(Debug, ThisError)]
pub enum AuthorizationError {
	/// The fixed callback port could not be bound; surfaced before the browser opens.
	#[error("Failed to bind the loopback callback port {port}; it may already be in use.")]
	Bind {
		/// Loopback port the listener attempted to claim.
		port: u16,
		/// Underlying bind failure.
		#[source]
		source: std::io::Error,
	},
	/// The identity provider redirected back with an explicit error code.
	#[error("OAuth error: {code}.")]
	Denied {
		/// Error code forwarded from the provider's `error` query parameter.
		code: String,
	},
	/// The callback carried neither a `code` nor an `error` parameter.
	#[error("No authorization code received.")]
	MissingCode,
	/// No callback arrived before the watchdog fired.
	#[error("OAuth authorization timed out after {seconds} seconds.")]
	Timeout {
		/// Watchdog window that elapsed, in seconds.
		seconds: u64,
	},
}

/// Failures while talking to the token endpoint.
#[derive(Debug, ThisError)]
pub enum TokenEndpointError {
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint returned HTTP {status}: {body}")]
	Status {
		/// HTTP status code of the response.
		status: u16,
		/// Response body excerpt for operator diagnosis.
		body: String,
	},
	/// Token endpoint answered 2xx but the body could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure with the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Transport-level failure (DNS, TCP, TLS) while calling the token endpoint.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific failure.
		#[source]
		source: reqwest::Error,
	},
}
impl From<reqwest::Error> for TokenEndpointError {
	fn from(e: reqwest::Error) -> Self {
		Self::Network { source: e }
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_with_source() {
		let store_error = StoreError::Serialize {
			source: serde_json::from_str::<serde_json::Value>("{")
				.expect_err("Truncated JSON should fail to parse."),
		};
		let error = Error::from(store_error);

		assert!(matches!(error, Error::Store(_)));
		assert!(
			StdError::source(&error).is_some(),
			"Canonical error should expose the store error as its source.",
		);
	}

	#[test]
	fn denied_message_carries_the_provider_code() {
		let error = Error::from(AuthorizationError::Denied { code: "access_denied".into() });

		assert_eq!(error.to_string(), "OAuth error: access_denied.");
	}

	#[test]
	fn missing_credentials_hint_names_the_variables() {
		let message = ConfigError::MissingCredentials.to_string();

		assert!(message.contains("BITBUCKET_TOKEN"));
		assert!(message.contains("BITBUCKET_OAUTH_CLIENT_ID"));
	}
}
