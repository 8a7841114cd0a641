//! The single persisted credential record and its freshness rules.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Safety margin subtracted from the expiry instant before a cached access token is presented,
/// guarding against the token expiring mid-flight on the caller's subsequent network request.
pub const REFRESH_MARGIN: Duration = Duration::seconds(60);
// Cap on the endpoint-reported lifetime; anything longer saturates here instead of overflowing
// the datetime range.
const MAX_LIFETIME: Duration = Duration::days(36_500);

/// Token pair persisted on disk and cached in memory by the OAuth provider.
///
/// `expires_at` is the wall-clock instant after which the access token must no longer be
/// presented. It is stamped once at issuance from the token endpoint's `expires_in` and never
/// re-derived; on disk it serializes as integer epoch milliseconds.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Short-lived bearer secret attached to API requests.
	pub access_token: TokenSecret,
	/// Long-lived secret used to renew the pair without repeating user interaction.
	pub refresh_token: TokenSecret,
	/// Absolute expiry instant.
	#[serde(with = "time::serde::timestamp::milliseconds")]
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Stamps a freshly issued pair, deriving the expiry from `now` plus the endpoint-reported
	/// lifetime in seconds.
	///
	/// The expiry is truncated to millisecond precision so the in-memory record compares equal
	/// to its persisted encoding.
	pub fn issue(
		now: OffsetDateTime,
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		expires_in_secs: u64,
	) -> Self {
		let now = now - Duration::nanoseconds((now.unix_timestamp_nanos() % 1_000_000) as i64);
		let lifetime = Duration::seconds(i64::try_from(expires_in_secs).unwrap_or(i64::MAX))
			.min(MAX_LIFETIME);

		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
			expires_at: now + lifetime,
		}
	}

	/// Returns `true` if the access token is still presentable at `instant` with the 60-second
	/// margin applied; fresh records skip refresh and authorization entirely.
	pub fn is_fresh_at(&self, instant: OffsetDateTime) -> bool {
		instant + REFRESH_MARGIN < self.expires_at
	}

	/// Margin-free expiry check, used when a stored record doubles as a plain bearer token
	/// during resolution.
	pub fn is_live_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.expires_at
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
