//! [`Automation`]: host-side operations on the agent panel.
//!
//! Each operation evaluates one helper function by value and turns the raw
//! `Runtime.evaluate` result into a typed answer, so nothing above this layer
//! sees protocol shapes.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::classify::{ButtonClass, ButtonFacts};
use crate::error::{AutomationError, Result};
use crate::helper::{self, functions};
use crate::manager::CdpManager;

/// Result of injecting or submitting a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOutcome {
	pub success: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl PromptOutcome {
	pub fn succeeded() -> Self {
		Self {
			success: true,
			error: None,
		}
	}

	pub fn failed(message: impl Into<String>) -> Self {
		Self {
			success: false,
			error: Some(message.into()),
		}
	}
}

/// Counts from one accept sweep. `clicked` can trail `found` when a button
/// detaches mid-sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptSummary {
	pub found: u32,
	pub clicked: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatInputInfo {
	pub found: bool,
	pub tag_name: Option<String>,
	pub is_lexical: bool,
	pub has_iframe_doc: bool,
	pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitButtonInfo {
	pub found: bool,
	pub text: Option<String>,
	pub disabled: bool,
	pub tag_name: Option<String>,
}

/// A button seen by the page helper, with the page's classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedButton {
	pub text: String,
	pub visible: bool,
	pub disabled: bool,
	#[serde(rename = "class")]
	pub class: ButtonClass,
	/// `top` for the workbench document, `panel` for the agent iframe
	pub scope: String,
}

impl ScannedButton {
	pub fn facts(&self) -> ButtonFacts {
		ButtonFacts::new(self.text.clone(), self.visible, self.disabled)
	}
}

/// Panel operations over a shared [`CdpManager`].
#[derive(Clone)]
pub struct Automation {
	manager: Arc<CdpManager>,
}

impl Automation {
	pub fn new(manager: Arc<CdpManager>) -> Self {
		Self { manager }
	}

	pub fn manager(&self) -> &Arc<CdpManager> {
		&self.manager
	}

	/// Calls a helper function and returns its raw value.
	///
	/// When the helper is missing (page reload) it is reinstalled and the call
	/// retried once.
	async fn call_value(&self, function: &str, args: &[Value]) -> Result<Value> {
		let namespace = &self.manager.helper_config().namespace;
		let expression = helper::call_expression(namespace, function, args);

		let mut reinstalled = false;
		loop {
			match self.manager.evaluate(&expression).await? {
				Some(value) if helper::is_missing(&value) => {
					if reinstalled {
						return Err(AutomationError::HelperInstall(format!(
							"{function} still missing after reinstall"
						)));
					}
					tracing::info!(function, "page helper missing, reinstalling");
					self.manager.install_helper().await?;
					reinstalled = true;
				}
				Some(value) => return Ok(value),
				None => {
					return Err(AutomationError::MissingValue {
						function: function.to_string(),
					});
				}
			}
		}
	}

	async fn call<T: DeserializeOwned>(&self, function: &str, args: &[Value]) -> Result<T> {
		let value = self.call_value(function, args).await?;
		Ok(serde_json::from_value(value)?)
	}

	async fn prompt_call(&self, function: &str, args: &[Value]) -> PromptOutcome {
		match self.call::<PromptOutcome>(function, args).await {
			Ok(outcome) => {
				if let Some(error) = &outcome.error {
					tracing::warn!(function, error = %error, "panel refused");
				}
				outcome
			}
			Err(e) => {
				tracing::warn!(function, error = %e, "panel call failed");
				PromptOutcome::failed(e.to_string())
			}
		}
	}

	/// Replaces the editor's content with `text`.
	///
	/// Never fails at the host boundary: every problem, including a missing
	/// connection, comes back as an outcome with `error` set. Success means the
	/// editor's text was read back and contains `text`.
	pub async fn inject_prompt(&self, text: &str) -> PromptOutcome {
		let outcome = self
			.prompt_call(functions::TRY_INJECT_PROMPT, &[json!(text)])
			.await;
		if outcome.success {
			tracing::info!(chars = text.chars().count(), "prompt injected");
		}
		outcome
	}

	/// Clicks the panel's send control.
	pub async fn submit_prompt(&self) -> PromptOutcome {
		let outcome = self.prompt_call(functions::TRY_SUBMIT_PROMPT, &[]).await;
		if outcome.success {
			tracing::info!("prompt submitted");
		}
		outcome
	}

	/// Injects, waits for the editor to settle, then submits.
	pub async fn send_prompt(&self, text: &str) -> PromptOutcome {
		let injected = self.inject_prompt(text).await;
		if !injected.success {
			return injected;
		}
		tokio::time::sleep(self.manager.config().submit_settle()).await;
		self.submit_prompt().await
	}

	/// Clicks every visible, enabled accept button in the workbench and panel.
	pub async fn click_accept_buttons(&self) -> Result<AcceptSummary> {
		let summary: AcceptSummary = self.call(functions::CLICK_ACCEPT_BUTTONS, &[]).await?;
		if summary.found == 0 {
			tracing::debug!("no accept button found");
		} else {
			tracing::info!(found = summary.found, clicked = summary.clicked, "accept sweep");
		}
		Ok(summary)
	}

	pub async fn find_chat_input(&self) -> Result<ChatInputInfo> {
		self.call(functions::DESCRIBE_CHAT_INPUT, &[]).await
	}

	pub async fn find_submit_button(&self) -> Result<SubmitButtonInfo> {
		self.call(functions::DESCRIBE_SUBMIT_BUTTON, &[]).await
	}

	pub async fn scan_buttons(&self) -> Result<Vec<ScannedButton>> {
		self.call(functions::SCAN_BUTTONS, &[]).await
	}

	/// Whether the current helper version is present in the page.
	pub async fn helper_installed(&self) -> Result<bool> {
		let expression = helper::presence_expression(&self.manager.helper_config().namespace);
		Ok(matches!(
			self.manager.evaluate(&expression).await?,
			Some(Value::Bool(true))
		))
	}
}
