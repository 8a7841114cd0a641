//! OAuth 2.0 credential acquisition for Bitbucket Cloud clients—loopback authorization,
//! refresh-with-fallback, and on-disk token persistence in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod flows;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod resolver;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::{env, path::PathBuf, process, time::Duration as StdDuration};
	// self
	use crate::{oauth::Endpoints, provider::OAuthProvider, store::FileStore};

	/// Returns a unique throwaway path for a credential store file.
	///
	/// Uniqueness comes from the process id plus a nanosecond timestamp so parallel test runs
	/// never collide on the same file.
	pub fn temp_store_path(label: &str) -> PathBuf {
		let unique = format!(
			"bitbucket_auth_{label}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	/// Builds an [`OAuthProvider`] aimed at mock endpoints, with the browser launch disabled and
	/// the authorization watchdog shortened so failing tests never wait two minutes.
	pub fn test_oauth_provider(
		endpoints: Endpoints,
		store_path: impl Into<PathBuf>,
		callback_port: u16,
	) -> Result<OAuthProvider> {
		let store = FileStore::at(store_path);
		let provider = OAuthProvider::with_parts(endpoints, store, "client-test", "secret-test")?
			.without_browser()
			.with_callback_port(callback_port)
			.with_authorize_timeout(StdDuration::from_secs(5));

		Ok(provider)
	}
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {bitbucket_auth as _, httpmock as _};
