//! Authorization-code flow building blocks: the authorize URL and the loopback listener.

pub mod loopback;

pub use loopback::*;

// self
use crate::_prelude::*;

/// Composes the browser-facing authorize URL for the code grant.
///
/// The query carries exactly `client_id`, `response_type=code`, and `redirect_uri`; the
/// provider's redirect delivers the one-time code back to the loopback listener.
pub fn build_authorize_url(authorize_endpoint: &Url, client_id: &str, redirect_uri: &Url) -> Url {
	let mut url = authorize_endpoint.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("client_id", client_id);
	pairs.append_pair("response_type", "code");
	pairs.append_pair("redirect_uri", redirect_uri.as_str());

	drop(pairs);

	url
}
