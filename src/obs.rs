//! Optional tracing hooks for provider flows.
//!
//! Enable the `tracing` feature to emit structured spans named `bitbucket_auth.flow` with the
//! `flow` (grant) and `stage` (call site) fields. Without the feature every helper compiles to a
//! no-op.

// self
use crate::_prelude::*;

/// OAuth flows observed by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// `grant_type=refresh_token` renewal.
	Refresh,
	/// Full authorization-code grant through the loopback listener.
	Authorization,
}
impl FlowKind {
	/// Returns a stable label suitable for span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Refresh => "refresh",
			FlowKind::Authorization => "authorization",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used around provider flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("bitbucket_auth.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

macro_rules! flow_warn {
	($($arg:tt)*) => {{
		#[cfg(feature = "tracing")]
		tracing::warn!($($arg)*);
		#[cfg(not(feature = "tracing"))]
		let _ = format_args!($($arg)*);
	}};
}
macro_rules! flow_debug {
	($($arg:tt)*) => {{
		#[cfg(feature = "tracing")]
		tracing::debug!($($arg)*);
		#[cfg(not(feature = "tracing"))]
		let _ = format_args!($($arg)*);
	}};
}
pub(crate) use {flow_debug, flow_warn};
