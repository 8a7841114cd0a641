// self
use crate::_prelude::*;

/// Redacting wrapper for token material so secrets never leak through logs.
///
/// Serde round-trips the plain string; only the formatters redact.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatters_redact_but_serde_round_trips() {
		let secret = TokenSecret::new("very-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");

		let json = serde_json::to_string(&secret).expect("Secret should serialize to JSON.");

		assert_eq!(json, "\"very-secret\"");

		let back: TokenSecret =
			serde_json::from_str(&json).expect("Secret should deserialize from JSON.");

		assert_eq!(back.expose(), "very-secret");
	}
}
