//! Single-use loopback listener for the redirect leg of the authorization-code grant.
//!
//! The listener and a watchdog timer race to produce exactly one outcome. The serial accept
//! loop returns on the first terminal callback (`code`, `error`, or a parameter-less request),
//! while [`tokio::time::timeout`] bounds the whole wait; whichever side finishes first drops the
//! listener, so a later connection to the port is refused. Requests outside the callback path
//! receive a 404 and do not resolve the pending authorization.

// std
use std::{collections::HashMap, net::Ipv4Addr, time::Duration};
// crates.io
use tokio::{
	io::{AsyncReadExt, AsyncWriteExt},
	net::{TcpListener, TcpStream},
	time::timeout,
};
// self
use crate::{
	_prelude::*,
	error::{AuthorizationError, ConfigError},
	obs::flow_warn,
};

/// Fixed loopback port registered as the OAuth redirect target.
pub const CALLBACK_PORT: u16 = 8976;
/// Callback path the authorize redirect must land on.
pub const CALLBACK_PATH: &str = "/callback";
/// Watchdog applied to the whole authorization wait.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

const MAX_REQUEST_BYTES: usize = 8_192;
const OK: &str = "200 OK";
const BAD_REQUEST: &str = "400 Bad Request";
const NOT_FOUND: &str = "404 Not Found";
const AUTHORIZED_PAGE: &str =
	"<html><body><h1>Authorized</h1><p>You can close this tab.</p></body></html>";
const DENIED_PAGE: &str =
	"<html><body><h1>Authorization failed</h1><p>You can close this tab.</p></body></html>";
const MISSING_CODE_PAGE: &str = "<html><body><h1>Missing code</h1></body></html>";

/// Loopback redirect URI registered with the provider for `port`.
pub fn redirect_uri(port: u16) -> Result<Url, ConfigError> {
	Url::parse(&format!("http://localhost:{port}{CALLBACK_PATH}"))
		.map_err(|e| ConfigError::InvalidRedirect { source: e })
}

/// Terminal outcome delivered by the redirect leg.
#[derive(Clone, Debug, PartialEq, Eq)]
enum CallbackOutcome {
	/// The provider delivered a one-time authorization code.
	Code(String),
	/// The provider delivered an explicit error parameter.
	Denied(String),
	/// The callback carried neither `code` nor `error`.
	MissingParams,
}

/// Ephemeral single-outcome HTTP listener bound to the loopback interface.
#[derive(Debug)]
pub struct LoopbackServer {
	listener: TcpListener,
	port: u16,
}
impl LoopbackServer {
	/// Binds the callback port.
	///
	/// Binding happens before the browser is opened, so a port collision surfaces immediately
	/// as a fatal authorization error.
	pub async fn bind(port: u16) -> Result<Self, AuthorizationError> {
		let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
			.await
			.map_err(|e| AuthorizationError::Bind { port, source: e })?;
		let port = listener
			.local_addr()
			.map_err(|e| AuthorizationError::Bind { port, source: e })?
			.port();

		Ok(Self { listener, port })
	}

	/// Returns the bound port; differs from the requested one only when binding port zero.
	pub fn port(&self) -> u16 {
		self.port
	}

	/// Waits for the first terminal callback, bounded by `window`.
	///
	/// Consumes the listener; the socket closes on every exit path, including the timeout.
	pub async fn await_code(self, window: Duration) -> Result<String, AuthorizationError> {
		let seconds = window.as_secs();

		match timeout(window, self.serve()).await {
			Ok(CallbackOutcome::Code(code)) => Ok(code),
			Ok(CallbackOutcome::Denied(code)) => Err(AuthorizationError::Denied { code }),
			Ok(CallbackOutcome::MissingParams) => Err(AuthorizationError::MissingCode),
			Err(_) => Err(AuthorizationError::Timeout { seconds }),
		}
	}

	async fn serve(self) -> CallbackOutcome {
		loop {
			let (stream, _) = match self.listener.accept().await {
				Ok(connection) => connection,
				Err(e) => {
					flow_warn!("Failed to accept a callback connection: {e}.");

					continue;
				},
			};

			if let Some(outcome) = handle_connection(stream).await {
				return outcome;
			}
		}
	}
}

/// Handles one connection; `None` keeps the listener waiting for the real callback.
async fn handle_connection(mut stream: TcpStream) -> Option<CallbackOutcome> {
	let request = read_request_head(&mut stream).await?;
	let Some(url) = parse_request_url(&request) else {
		respond(&mut stream, NOT_FOUND, "").await;

		return None;
	};

	if url.path() != CALLBACK_PATH {
		respond(&mut stream, NOT_FOUND, "").await;

		return None;
	}

	let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

	if let Some(error) = params.get("error") {
		respond(&mut stream, OK, DENIED_PAGE).await;

		return Some(CallbackOutcome::Denied(error.clone()));
	}

	match params.get("code") {
		Some(code) => {
			respond(&mut stream, OK, AUTHORIZED_PAGE).await;

			Some(CallbackOutcome::Code(code.clone()))
		},
		None => {
			respond(&mut stream, BAD_REQUEST, MISSING_CODE_PAGE).await;

			Some(CallbackOutcome::MissingParams)
		},
	}
}

/// Reads until the request line is complete; a target split across TCP segments must not
/// misparse as a foreign path.
async fn read_request_head(stream: &mut TcpStream) -> Option<String> {
	let mut buffer = Vec::with_capacity(1_024);
	let mut chunk = [0_u8; 1_024];

	while !buffer.windows(2).any(|window| window == b"\r\n") && buffer.len() < MAX_REQUEST_BYTES {
		match stream.read(&mut chunk).await {
			Ok(0) => break,
			Ok(read) => buffer.extend_from_slice(&chunk[..read]),
			Err(e) => {
				// Stray probes must not abort a pending authorization.
				flow_warn!("Failed to read a callback request: {e}.");

				return None;
			},
		}
	}

	Some(String::from_utf8_lossy(&buffer).into_owned())
}

/// Extracts the origin-form request target from the request line and parses it against a dummy
/// loopback base so query parameters come back percent-decoded.
fn parse_request_url(request: &str) -> Option<Url> {
	let target = request_target(request)?;

	if !target.starts_with('/') {
		return None;
	}

	Url::parse(&format!("http://localhost{target}")).ok()
}

fn request_target(request: &str) -> Option<&str> {
	let mut parts = request.lines().next()?.split_whitespace();
	let _method = parts.next()?;

	parts.next()
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
	let response = format!(
		"HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
		body.len(),
	);
	// Best effort; the outcome is already decided by the query parameters.
	let _ = stream.write_all(response.as_bytes()).await;
	let _ = stream.flush().await;
	let _ = stream.shutdown().await;
}
