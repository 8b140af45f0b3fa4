//! Structured output envelope for all CLI commands.
//!
//! The shell loop reads stdout, so every command prints exactly one envelope:
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "ok": true,
//!   "command": "accept",
//!   "data": { "found": 2, "clicked": 2 },
//!   "timings": { "durationMs": 41 }
//! }
//! ```
//!
//! On failure:
//!
//! ```json
//! {
//!   "ok": false,
//!   "command": "inject",
//!   "error": {
//!     "code": "ENDPOINT_NOT_FOUND",
//!     "message": "no DevTools endpoint on ports 9000-9003; ..."
//!   }
//! }
//! ```


use std::io::{self, Write};
use std::time::{Duration, Instant};

use colored::Colorize;
use serde::{Deserialize, Serialize};

/// Bumped on breaking changes to the envelope.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// JSON envelope (default, for scripts)
	#[default]
	Json,
	/// Human-readable text
	Text,
}

impl std::str::FromStr for OutputFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"json" => Ok(OutputFormat::Json),
			"text" => Ok(OutputFormat::Text),
			_ => Err(format!("unknown format: {s}")),
		}
	}
}

impl std::fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OutputFormat::Json => write!(f, "json"),
			OutputFormat::Text => write!(f, "text"),
		}
	}
}

/// The result envelope every command prints.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub schema_version: Option<u32>,

	pub ok: bool,

	/// Subcommand name (`status`, `inject`, ...)
	pub command: String,

	/// Present on success
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,

	/// Present on failure
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub timings: Option<Timings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,

	pub message: String,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Stable error codes for scripts to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// No debugging endpoint answered in the port range
	EndpointNotFound,
	/// Socket closed, never opened, or manager disposed
	ConnectionError,
	/// A command got no response in time
	Timeout,
	/// The page helper threw or returned nothing usable
	EvalFailed,
	/// The panel refused the operation (no editor, no send button)
	PanelError,
	/// No test command could be inferred
	NotDetected,
	/// Invalid arguments or config
	InvalidInput,
	/// File I/O error
	IoError,
	/// Anything else
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			ErrorCode::EndpointNotFound => "ENDPOINT_NOT_FOUND",
			ErrorCode::ConnectionError => "CONNECTION_ERROR",
			ErrorCode::Timeout => "TIMEOUT",
			ErrorCode::EvalFailed => "EVAL_FAILED",
			ErrorCode::PanelError => "PANEL_ERROR",
			ErrorCode::NotDetected => "NOT_DETECTED",
			ErrorCode::InvalidInput => "INVALID_INPUT",
			ErrorCode::IoError => "IO_ERROR",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		};
		write!(f, "{s}")
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
	pub duration_ms: u64,
}

impl From<Duration> for Timings {
	fn from(duration: Duration) -> Self {
		Self {
			duration_ms: duration.as_millis() as u64,
		}
	}
}

/// Builder for [`CommandResult`].
pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	started: Option<Instant>,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			started: None,
		}
	}

	pub fn started(mut self, started: Instant) -> Self {
		self.started = Some(started);
		self
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(mut self, code: ErrorCode, message: impl Into<String>) -> Self {
		self.error = Some(CommandError {
			code,
			message: message.into(),
			details: None,
		});
		self
	}

	pub fn command_error(mut self, error: CommandError) -> Self {
		self.error = Some(error);
		self
	}

	pub fn build(self) -> CommandResult<T> {
		CommandResult {
			schema_version: Some(SCHEMA_VERSION),
			ok: self.error.is_none(),
			command: self.command,
			data: self.data,
			error: self.error,
			timings: self.started.map(|s| s.elapsed().into()),
		}
	}
}

/// Prints an envelope as JSON, or `text` in text mode.
pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat, text: impl FnOnce(&T) -> String) {
	let stdout = io::stdout();
	let mut out = stdout.lock();
	match format {
		OutputFormat::Json => {
			let json = serde_json::to_string_pretty(result)
				.unwrap_or_else(|e| format!(r#"{{"ok":false,"error":{{"code":"INTERNAL_ERROR","message":"{e}"}}}}"#));
			let _ = writeln!(out, "{json}");
		}
		OutputFormat::Text => {
			if let Some(data) = &result.data {
				let _ = writeln!(out, "{}", text(data));
			}
		}
	}
}

/// Human-readable error on stderr.
pub fn print_error_stderr(error: &CommandError) {
	eprintln!("{} {}: {}", "error".red().bold(), error.code, error.message);
}

/// `yes`/`no` with color, for text output.
pub fn flag(value: bool) -> String {
	if value {
		"yes".green().to_string()
	} else {
		"no".red().to_string()
	}
}
