//! Authorization capabilities handed to API collaborators.

pub mod bearer;
pub mod oauth;

pub use bearer::BearerProvider;
pub use oauth::{OAuthProvider, ProviderMetrics};

// self
use crate::_prelude::*;

/// Boxed future returned by [`AuthProvider`] implementations.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Capability that produces the current `Authorization` header value.
///
/// This is the only operation collaborators observe; implementations may lazily authorize,
/// refresh, and persist behind it. One provider is constructed per process and held for the
/// process's duration.
pub trait AuthProvider
where
	Self: Send + Sync,
{
	/// Returns the full header value, `Bearer <token>`.
	fn auth_header(&self) -> ProviderFuture<'_, String>;
}
