//! Lazily-authorizing OAuth capability with refresh-with-fallback.
//!
//! The provider exclusively owns its cached credential. [`OAuthProvider::auth_header`] runs the
//! ensure-valid sequence: answer from a fresh cache, else refresh, else run the full
//! authorization-code grant through the loopback listener. Refresh failures of every kind are
//! logged and swallowed as a fallback trigger; only the full grant itself fails fatally. The
//! sequence holds a single async mutex so concurrent callers coalesce onto one in-flight
//! attempt instead of racing independent browser launches on the same fixed port.

// std
use std::{
	sync::atomic::{AtomicU64, Ordering},
	time::Duration,
};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	flows::{self, LoopbackServer},
	oauth::{Endpoints, TokenClient},
	obs::{FlowKind, FlowSpan, flow_debug, flow_warn},
	provider::{AuthProvider, ProviderFuture},
	store::FileStore,
};

/// Thread-safe counters describing provider activity.
#[derive(Debug, Default)]
pub struct ProviderMetrics {
	cache_hits: AtomicU64,
	refresh_attempts: AtomicU64,
	refresh_fallbacks: AtomicU64,
	authorizations: AtomicU64,
}
impl ProviderMetrics {
	/// Returns how many header requests were answered from the fresh cache.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns how many refresh calls were attempted.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns how many refresh failures fell back to full authorization.
	pub fn refresh_fallbacks(&self) -> u64 {
		self.refresh_fallbacks.load(Ordering::Relaxed)
	}

	/// Returns how many full authorization-code grants were started.
	pub fn authorizations(&self) -> u64 {
		self.authorizations.load(Ordering::Relaxed)
	}

	fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	fn record_refresh_fallback(&self) {
		self.refresh_fallbacks.fetch_add(1, Ordering::Relaxed);
	}

	fn record_authorization(&self) {
		self.authorizations.fetch_add(1, Ordering::Relaxed);
	}
}

/// Stateful capability that lazily authorizes, caches, and refreshes a token pair.
pub struct OAuthProvider {
	token_client: TokenClient,
	store: FileStore,
	cached: AsyncMutex<Option<Credential>>,
	metrics: Arc<ProviderMetrics>,
	callback_port: u16,
	authorize_timeout: Duration,
	open_browser: bool,
}
impl OAuthProvider {
	/// Builds a provider for Bitbucket Cloud using the default store path under the home
	/// directory.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
		let store = FileStore::from_home()?;

		Self::with_parts(Endpoints::bitbucket()?, store, client_id, client_secret)
	}

	/// Builds a provider from explicit endpoints and store.
	///
	/// The stored record is read once here; afterwards the in-memory cache is authoritative for
	/// the process lifetime.
	pub fn with_parts(
		endpoints: Endpoints,
		store: FileStore,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self> {
		let cached = store.load()?;

		Ok(Self {
			token_client: TokenClient::new(endpoints, client_id, client_secret),
			store,
			cached: AsyncMutex::new(cached),
			metrics: Arc::default(),
			callback_port: flows::CALLBACK_PORT,
			authorize_timeout: flows::CALLBACK_TIMEOUT,
			open_browser: true,
		})
	}

	/// Overrides the loopback callback port (defaults to 8976).
	pub fn with_callback_port(mut self, port: u16) -> Self {
		self.callback_port = port;

		self
	}

	/// Overrides the authorization watchdog (defaults to 120 seconds).
	pub fn with_authorize_timeout(mut self, window: Duration) -> Self {
		self.authorize_timeout = window;

		self
	}

	/// Disables the best-effort browser launch; the printed URL remains the operator's path.
	pub fn without_browser(mut self) -> Self {
		self.open_browser = false;

		self
	}

	/// Shared activity counters for this provider instance.
	pub fn metrics(&self) -> Arc<ProviderMetrics> {
		self.metrics.clone()
	}

	async fn ensure_valid_token(&self) -> Result<String> {
		// Held across the whole sequence so overlapping callers await the in-flight attempt.
		let mut cached = self.cached.lock().await;
		let now = OffsetDateTime::now_utc();

		if let Some(credential) = cached.as_ref() {
			if credential.is_fresh_at(now) {
				self.metrics.record_cache_hit();

				return Ok(credential.access_token.expose().to_string());
			}
		}
		if let Some(refresh_token) =
			cached.as_ref().map(|credential| credential.refresh_token.expose().to_string())
		{
			self.metrics.record_refresh_attempt();

			let span = FlowSpan::new(FlowKind::Refresh, "ensure_valid_token");

			match span.instrument(self.token_client.refresh(&refresh_token)).await {
				Ok(renewed) => {
					self.store.save(&renewed)?;

					let access = renewed.access_token.expose().to_string();

					*cached = Some(renewed);

					return Ok(access);
				},
				Err(e) => {
					self.metrics.record_refresh_fallback();
					flow_warn!("Token refresh failed: {e}; re-authorizing.");
				},
			}
		}

		let authorized = self.authorize().await?;

		self.store.save(&authorized)?;

		let access = authorized.access_token.expose().to_string();

		*cached = Some(authorized);

		Ok(access)
	}

	/// Runs the full authorization-code grant: bind the listener, emit the authorize URL, await
	/// exactly one callback outcome, then exchange the code.
	async fn authorize(&self) -> Result<Credential> {
		self.metrics.record_authorization();

		let span = FlowSpan::new(FlowKind::Authorization, "authorize");

		span.instrument(async move {
			let redirect_uri = flows::redirect_uri(self.callback_port)?;
			// Bind before anything user-facing so a port collision fails fast.
			let server = LoopbackServer::bind(self.callback_port).await?;
			let authorize_url = self.token_client.authorize_url(&redirect_uri);

			eprintln!("Open this URL to authorize:\n{authorize_url}");

			if self.open_browser {
				// Best-effort side effect; the printed URL remains the fallback.
				if let Err(e) = open::that(authorize_url.as_str()) {
					flow_debug!("Browser launch failed: {e}; use the printed URL.");
				}
			}

			let code = server.await_code(self.authorize_timeout).await?;
			let credential = self.token_client.exchange_code(&code, &redirect_uri).await?;

			Ok(credential)
		})
		.await
	}
}
impl AuthProvider for OAuthProvider {
	fn auth_header(&self) -> ProviderFuture<'_, String> {
		Box::pin(async move { Ok(format!("Bearer {}", self.ensure_valid_token().await?)) })
	}
}
impl Debug for OAuthProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthProvider")
			.field("token_client", &self.token_client)
			.field("store", &self.store)
			.field("callback_port", &self.callback_port)
			.field("authorize_timeout", &self.authorize_timeout)
			.finish()
	}
}
