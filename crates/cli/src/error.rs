use std::path::PathBuf;

use forloop::AutomationError;
use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Automation(#[from] AutomationError),

	/// The panel answered but refused (no editor, no send button).
	#[error("{command} failed: {message}")]
	Panel { command: &'static str, message: String },

	#[error("no test command detected in {}", dir.display())]
	NotDetected { dir: PathBuf },

	#[error("invalid input: {0}")]
	Input(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

fn automation_code(err: &AutomationError) -> ErrorCode {
	match err {
		AutomationError::EndpointNotFound { .. } => ErrorCode::EndpointNotFound,
		AutomationError::NotConnected | AutomationError::Disposed => ErrorCode::ConnectionError,
		AutomationError::Runtime(e) if e.is_timeout() => ErrorCode::Timeout,
		AutomationError::Runtime(e) if e.is_connection_lost() => ErrorCode::ConnectionError,
		AutomationError::Runtime(_) => ErrorCode::InternalError,
		AutomationError::Evaluation { .. }
		| AutomationError::MissingValue { .. }
		| AutomationError::HelperInstall(_)
		| AutomationError::Decode(_) => ErrorCode::EvalFailed,
		AutomationError::Config { .. } => ErrorCode::InvalidInput,
	}
}

impl CliError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::Automation(err) => {
				let details = match err {
					AutomationError::EndpointNotFound { ports } => Some(serde_json::json!({
						"portStart": ports.start(),
						"portEnd": ports.end(),
					})),
					AutomationError::Config { path, .. } => Some(serde_json::json!({ "path": path })),
					_ => None,
				};
				(automation_code(err), details)
			}
			CliError::Panel { command, .. } => (
				ErrorCode::PanelError,
				Some(serde_json::json!({ "operation": command })),
			),
			CliError::NotDetected { dir } => (
				ErrorCode::NotDetected,
				Some(serde_json::json!({ "dir": dir })),
			),
			CliError::Input(_) => (ErrorCode::InvalidInput, None),
			CliError::Io(_) => (ErrorCode::IoError, None),
		};

		CommandError {
			code,
			message: self.to_string(),
			details,
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[test]
	fn endpoint_not_found_carries_range() {
		let err = CliError::from(AutomationError::EndpointNotFound { ports: 9000..=9003 });
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::EndpointNotFound);
		assert_eq!(cmd.details.unwrap()["portEnd"], 9003);
		assert!(cmd.message.contains("remote-debugging-port"));
	}

	#[test]
	fn runtime_errors_are_classified() {
		let timeout = CliError::from(AutomationError::Runtime(forloop_runtime::Error::Timeout {
			method: "Runtime.evaluate".into(),
			duration: Duration::from_secs(10),
		}));
		assert_eq!(timeout.to_command_error().code, ErrorCode::Timeout);

		let closed = CliError::from(AutomationError::Runtime(forloop_runtime::Error::TransportClosed));
		assert_eq!(closed.to_command_error().code, ErrorCode::ConnectionError);

		let threw = CliError::from(AutomationError::Evaluation {
			message: "TypeError".into(),
		});
		assert_eq!(threw.to_command_error().code, ErrorCode::EvalFailed);
	}

	#[test]
	fn io_and_input_codes() {
		let io = CliError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "prompt.md"));
		assert_eq!(io.to_command_error().code, ErrorCode::IoError);
		assert_eq!(CliError::Input("prompt is empty".into()).to_command_error().code, ErrorCode::InvalidInput);
	}

	#[test]
	fn panel_refusal_message() {
		let err = CliError::Panel {
			command: "inject",
			message: "chat input not found".into(),
		};
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::PanelError);
		assert_eq!(cmd.message, "inject failed: chat input not found");
	}
}
