//! Static bearer capability.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	provider::{AuthProvider, ProviderFuture},
};

/// Wraps a caller-supplied static token.
///
/// Purely a closure over its input: header production never fails, performs no I/O, and
/// mutates nothing.
#[derive(Clone, Debug)]
pub struct BearerProvider {
	token: TokenSecret,
}
impl BearerProvider {
	/// Builds the provider from a static token string.
	pub fn new(token: impl Into<String>) -> Self {
		Self { token: TokenSecret::new(token) }
	}
}
impl AuthProvider for BearerProvider {
	fn auth_header(&self) -> ProviderFuture<'_, String> {
		Box::pin(async move { Ok(format!("Bearer {}", self.token.expose())) })
	}
}
