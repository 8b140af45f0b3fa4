//! Connection and panel configuration.
//!
//! The port range and timeouts were tuned by hand against one IDE's startup
//! behavior; they are plain settings, not protocol constants.

use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use forloop_runtime::DiscoveryOptions;
use serde::{Deserialize, Serialize};

use crate::error::{AutomationError, Result};

/// Default config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "forloop.json";

/// Settings for discovery, the connection, and the injected helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	/// Host the IDE's debugging server listens on
	pub host: String,
	/// First port probed (inclusive)
	pub port_start: u16,
	/// Last port probed (inclusive)
	pub port_end: u16,
	/// Per-port discovery timeout
	pub probe_timeout_ms: u64,
	/// Default per-command deadline
	pub command_timeout_ms: u64,
	/// Element id of the agent panel iframe
	pub panel_iframe_id: String,
	/// Selector of the rich-text editor root inside the panel
	pub editor_selector: String,
	/// Global the helper installs itself under
	pub namespace: String,
	/// Substring of the main window's title
	pub title_hint: Option<String>,
	/// Substrings of the main window's URL
	pub url_markers: Vec<String>,
	/// Pause between injecting a prompt and clicking submit
	pub submit_settle_ms: u64,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port_start: 9000,
			port_end: 9003,
			probe_timeout_ms: 800,
			command_timeout_ms: 10_000,
			panel_iframe_id: "antigravity.agentPanel".to_string(),
			editor_selector: r#"[data-lexical-editor="true"]"#.to_string(),
			namespace: "__antigravityForLoop".to_string(),
			title_hint: Some("Antigravity".to_string()),
			url_markers: vec!["workbench.html".to_string()],
			submit_settle_ms: 200,
		}
	}
}

impl Config {
	/// Loads a JSON config file; missing keys take their defaults.
	pub fn from_file(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path).map_err(|e| AutomationError::Config {
			path: path.to_path_buf(),
			reason: e.to_string(),
		})?;
		let config: Config = serde_json::from_str(&raw).map_err(|e| AutomationError::Config {
			path: path.to_path_buf(),
			reason: e.to_string(),
		})?;
		config.validate().map_err(|reason| AutomationError::Config {
			path: path.to_path_buf(),
			reason,
		})?;
		Ok(config)
	}

	/// Checks cross-field constraints.
	pub fn validate(&self) -> std::result::Result<(), String> {
		if self.port_start > self.port_end {
			return Err(format!(
				"portStart ({}) is greater than portEnd ({})",
				self.port_start, self.port_end
			));
		}
		if self.namespace.is_empty() || !is_js_identifier(&self.namespace) {
			return Err(format!("namespace {:?} is not a JavaScript identifier", self.namespace));
		}
		if self.command_timeout_ms == 0 {
			return Err("commandTimeoutMs must be positive".to_string());
		}
		Ok(())
	}

	pub fn ports(&self) -> RangeInclusive<u16> {
		self.port_start..=self.port_end
	}

	pub fn command_timeout(&self) -> Duration {
		Duration::from_millis(self.command_timeout_ms)
	}

	pub fn submit_settle(&self) -> Duration {
		Duration::from_millis(self.submit_settle_ms)
	}

	pub fn discovery_options(&self) -> DiscoveryOptions {
		DiscoveryOptions {
			host: self.host.clone(),
			ports: self.ports(),
			probe_timeout: Duration::from_millis(self.probe_timeout_ms),
			title_hint: self.title_hint.clone(),
			url_markers: self.url_markers.clone(),
		}
	}
}

fn is_js_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	chars
		.next()
		.is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
