//! Error types for the automation layer.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for manager and façade operations.
pub type Result<T> = std::result::Result<T, AutomationError>;

/// Failures surfaced to callers of [`CdpManager`](crate::CdpManager) and
/// [`Automation`](crate::Automation).
///
/// The `Display` text is meant to be shown to users as-is.
#[derive(Debug, Error)]
pub enum AutomationError {
	#[error("not connected")]
	NotConnected,

	#[error(
		"no DevTools endpoint on ports {}-{}; is Antigravity running with --remote-debugging-port?",
		ports.start(),
		ports.end()
	)]
	EndpointNotFound { ports: RangeInclusive<u16> },

	#[error("connection manager has been disposed")]
	Disposed,

	#[error(transparent)]
	Runtime(#[from] forloop_runtime::Error),

	/// The evaluated expression threw, or the panel iframe could not be entered.
	#[error("evaluation failed: {message}")]
	Evaluation { message: String },

	/// The page returned `undefined` where a value was required.
	#[error("{function} returned no value")]
	MissingValue { function: String },

	#[error("failed to install page helper: {0}")]
	HelperInstall(String),

	#[error("unexpected result shape: {0}")]
	Decode(#[from] serde_json::Error),

	#[error("invalid config {}: {reason}", path.display())]
	Config { path: PathBuf, reason: String },
}

impl AutomationError {
	/// True when reconnecting could make the failed operation succeed.
	pub fn is_connection_lost(&self) -> bool {
		match self {
			Self::NotConnected => true,
			Self::Runtime(e) => e.is_connection_lost(),
			_ => false,
		}
	}

	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Runtime(e) if e.is_timeout())
	}
}
