// std
use std::time::Duration;
// crates.io
use tokio::{io::AsyncWriteExt, net::TcpStream};
// self
use bitbucket_auth::{error::AuthorizationError, flows::LoopbackServer};

const WINDOW: Duration = Duration::from_secs(5);

async fn get(port: u16, path_and_query: &str) -> reqwest::Result<reqwest::Response> {
	reqwest::get(format!("http://127.0.0.1:{port}{path_and_query}")).await
}

async fn assert_port_closed(port: u16) {
	// The listener drops on every exit path; give the OS a beat to tear the socket down.
	tokio::time::sleep(Duration::from_millis(50)).await;

	let result = get(port, "/callback?code=late").await;

	assert!(result.is_err(), "A connection after the terminal outcome should be refused.");
}

#[tokio::test]
async fn code_callback_resolves_once_and_closes_the_listener() {
	let server = LoopbackServer::bind(0).await.expect("Binding an ephemeral port should succeed.");
	let port = server.port();
	let pending = tokio::spawn(server.await_code(WINDOW));
	let response = get(port, "/callback?code=ABC")
		.await
		.expect("The callback request should reach the listener.");

	assert_eq!(response.status().as_u16(), 200);

	let body = response.text().await.expect("The confirmation page should have a body.");

	assert!(body.contains("You can close this tab"));

	let code = pending
		.await
		.expect("The pending authorization task should not panic.")
		.expect("A code callback should resolve the authorization.");

	assert_eq!(code, "ABC");

	assert_port_closed(port).await;
}

#[tokio::test]
async fn error_parameter_fails_with_the_provider_code() {
	let server = LoopbackServer::bind(0).await.expect("Binding an ephemeral port should succeed.");
	let port = server.port();
	let pending = tokio::spawn(server.await_code(WINDOW));
	let response = get(port, "/callback?error=access_denied")
		.await
		.expect("The error callback should reach the listener.");

	assert_eq!(response.status().as_u16(), 200);

	let err = pending
		.await
		.expect("The pending authorization task should not panic.")
		.expect_err("An error parameter should fail the authorization.");

	assert!(matches!(&err, AuthorizationError::Denied { code } if code == "access_denied"));
	assert!(err.to_string().contains("access_denied"));

	assert_port_closed(port).await;
}

#[tokio::test]
async fn parameterless_callback_gets_a_400_and_fails() {
	let server = LoopbackServer::bind(0).await.expect("Binding an ephemeral port should succeed.");
	let port = server.port();
	let pending = tokio::spawn(server.await_code(WINDOW));
	let response =
		get(port, "/callback").await.expect("The bare callback should reach the listener.");

	assert_eq!(response.status().as_u16(), 400);

	let err = pending
		.await
		.expect("The pending authorization task should not panic.")
		.expect_err("A callback without parameters should fail the authorization.");

	assert!(matches!(err, AuthorizationError::MissingCode));

	assert_port_closed(port).await;
}

#[tokio::test]
async fn foreign_paths_get_a_404_and_do_not_resolve() {
	let server = LoopbackServer::bind(0).await.expect("Binding an ephemeral port should succeed.");
	let port = server.port();
	let pending = tokio::spawn(server.await_code(WINDOW));
	let probe = get(port, "/healthz").await.expect("The probe request should reach the listener.");

	assert_eq!(probe.status().as_u16(), 404);

	// The listener must still be waiting for the real callback.
	let response = get(port, "/callback?code=after-probe")
		.await
		.expect("The callback after a probe should reach the listener.");

	assert_eq!(response.status().as_u16(), 200);

	let code = pending
		.await
		.expect("The pending authorization task should not panic.")
		.expect("The authorization should survive foreign-path probes.");

	assert_eq!(code, "after-probe");
}

#[tokio::test]
async fn request_line_split_across_segments_still_resolves() {
	let server = LoopbackServer::bind(0).await.expect("Binding an ephemeral port should succeed.");
	let port = server.port();
	let pending = tokio::spawn(server.await_code(WINDOW));
	let mut stream = TcpStream::connect(("127.0.0.1", port))
		.await
		.expect("Connecting to the listener should succeed.");

	stream
		.write_all(b"GET /callback?code=sp")
		.await
		.expect("Writing the first segment should succeed.");
	stream.flush().await.expect("Flushing the first segment should succeed.");
	tokio::time::sleep(Duration::from_millis(100)).await;
	stream
		.write_all(b"lit-code HTTP/1.1\r\nHost: localhost\r\n\r\n")
		.await
		.expect("Writing the second segment should succeed.");

	let code = pending
		.await
		.expect("The pending authorization task should not panic.")
		.expect("A segmented request line should still deliver the code.");

	assert_eq!(code, "split-code");
}

#[tokio::test]
async fn timeout_fails_distinctly_and_closes_the_listener() {
	let server = LoopbackServer::bind(0).await.expect("Binding an ephemeral port should succeed.");
	let port = server.port();
	let err = server
		.await_code(Duration::from_millis(200))
		.await
		.expect_err("No callback within the window should time out.");

	assert!(matches!(err, AuthorizationError::Timeout { .. }));

	assert_port_closed(port).await;
}

#[tokio::test]
async fn bind_collision_surfaces_immediately() {
	let first = LoopbackServer::bind(0).await.expect("Binding an ephemeral port should succeed.");
	let err = LoopbackServer::bind(first.port())
		.await
		.expect_err("Binding an occupied port should fail.");

	assert!(matches!(err, AuthorizationError::Bind { .. }));
}
