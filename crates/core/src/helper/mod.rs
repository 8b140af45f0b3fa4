//! The page helper: a script evaluated in the IDE's top-level document.
//!
//! It installs a namespaced global holding the panel heuristics (editor lookup
//! across the iframe boundary, text injection, button classification) so the
//! host can call them by name with `Runtime.evaluate`. Installation is
//! idempotent per helper version; a reload wipes the global and the façade
//! reinstalls on demand.
//!
//! Every function the host calls returns plain data. Element references never
//! cross the protocol boundary.

use serde_json::Value;

use crate::classify::{ACCEPT_WORDS, REJECT_WORDS, SUBMIT_WORDS};
use crate::config::Config;

const TEMPLATE: &str = include_str!("page_helper.js");

/// Version stamped into the installed global; a mismatch forces reinstall.
pub const HELPER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Value a call expression yields when the helper is not installed.
pub const MISSING_SENTINEL: &str = "__forloop_helper_missing__";

/// Page-side functions the host invokes.
pub mod functions {
	pub const FIND_CHAT_INPUT: &str = "findChatInput";
	pub const INJECT_PROMPT: &str = "injectPrompt";
	pub const FIND_SUBMIT_BUTTON: &str = "findSubmitButton";
	pub const SUBMIT_PROMPT: &str = "submitPrompt";
	pub const IS_ACCEPT_BUTTON: &str = "isAcceptButton";
	pub const CLICK_ACCEPT_BUTTONS: &str = "clickAcceptButtons";
	pub const DESCRIBE_CHAT_INPUT: &str = "describeChatInput";
	pub const DESCRIBE_SUBMIT_BUTTON: &str = "describeSubmitButton";
	pub const SCAN_BUTTONS: &str = "scanButtons";
	pub const TRY_INJECT_PROMPT: &str = "tryInjectPrompt";
	pub const TRY_SUBMIT_PROMPT: &str = "trySubmitPrompt";
}

/// Page-specific values baked into the installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperConfig {
	pub namespace: String,
	pub panel_iframe_id: String,
	pub editor_selector: String,
}

impl Default for HelperConfig {
	fn default() -> Self {
		HelperConfig::from(&Config::default())
	}
}

impl From<&Config> for HelperConfig {
	fn from(config: &Config) -> Self {
		Self {
			namespace: config.namespace.clone(),
			panel_iframe_id: config.panel_iframe_id.clone(),
			editor_selector: config.editor_selector.clone(),
		}
	}
}

fn js_string(s: &str) -> String {
	Value::from(s).to_string()
}

fn js_words(words: &[&str]) -> String {
	Value::from(words.to_vec()).to_string()
}

/// Builds the installer expression. Evaluating it yields `true`.
pub fn installer_script(config: &HelperConfig) -> String {
	TEMPLATE
		.replace("__FORLOOP_NAMESPACE__", &js_string(&config.namespace))
		.replace("__FORLOOP_VERSION__", &js_string(HELPER_VERSION))
		.replace("__FORLOOP_IFRAME_ID__", &js_string(&config.panel_iframe_id))
		.replace("__FORLOOP_EDITOR_SELECTOR__", &js_string(&config.editor_selector))
		.replace("__FORLOOP_ACCEPT_WORDS__", &js_words(ACCEPT_WORDS))
		.replace("__FORLOOP_SUBMIT_WORDS__", &js_words(SUBMIT_WORDS))
		.replace("__FORLOOP_REJECT_WORDS__", &js_words(REJECT_WORDS))
}

/// Builds `window[ns].function(args...)`, guarded by a presence check.
///
/// Arguments are written as JSON literals, so strings reach the page exactly
/// as given. Quotes, backticks, and `$` need no further escaping.
pub fn call_expression(namespace: &str, function: &str, args: &[Value]) -> String {
	let args = args.iter().map(Value::to_string).collect::<Vec<_>>().join(", ");
	format!(
		"(() => {{ const ns = window[{ns}]; \
		 if (!ns || ns.version !== {version} || typeof ns[{func}] !== 'function') return {missing}; \
		 return ns[{func}]({args}); }})()",
		ns = js_string(namespace),
		version = js_string(HELPER_VERSION),
		func = js_string(function),
		missing = js_string(MISSING_SENTINEL),
	)
}

/// Expression reporting whether the current helper version is installed.
pub fn presence_expression(namespace: &str) -> String {
	format!(
		"(() => {{ const ns = window[{ns}]; return !!ns && ns.version === {version}; }})()",
		ns = js_string(namespace),
		version = js_string(HELPER_VERSION),
	)
}

/// True if an evaluation result is the missing-helper sentinel.
pub fn is_missing(value: &Value) -> bool {
	value.as_str() == Some(MISSING_SENTINEL)
}
