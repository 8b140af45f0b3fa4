//! Error types for the DevTools runtime.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a remote debugging endpoint.
#[derive(Debug, Error)]
pub enum Error {
	/// Failed to open the WebSocket to the endpoint.
	#[error("Failed to connect to {url}: {reason}")]
	ConnectionFailed { url: String, reason: String },

	/// Transport-level error (socket read/write, malformed frame).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// The socket closed while the request was outstanding.
	#[error("Connection closed before a response arrived")]
	TransportClosed,

	/// The connection was disposed while the request was outstanding.
	#[error("Connection disposed")]
	Disposed,

	/// Protocol-level error (unexpected frame shape, bad descriptor).
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// Error returned by the remote endpoint for a specific command.
	#[error("{method} failed ({code}): {message}")]
	Remote {
		/// Method the error answers
		method: String,
		/// Protocol error code
		code: i64,
		/// Human-readable message
		message: String,
		/// Optional extra detail
		data: Option<serde_json::Value>,
	},

	/// No response within the per-call deadline.
	#[error("Timeout after {}ms waiting for {method}", duration.as_millis())]
	Timeout { method: String, duration: Duration },

	/// Channel closed unexpectedly.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// HTTP error during endpoint discovery.
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if this is a per-call timeout.
	///
	/// The connection is still usable after a timeout.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout { .. })
	}

	/// Returns true if the connection itself is gone and must be re-established.
	pub fn is_connection_lost(&self) -> bool {
		matches!(
			self,
			Error::TransportClosed
				| Error::TransportError(_)
				| Error::ChannelClosed
				| Error::Disposed
				| Error::ConnectionFailed { .. }
		)
	}
}
