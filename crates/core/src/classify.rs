//! Button classification policy.
//!
//! The same vocabularies are serialized into the injected helper, so the page
//! and the host always agree on what a button means. Reject words are a hard
//! exclusion: a button with any word starting with one of them ("cancels",
//! "discarding") is never clicked.

use serde::{Deserialize, Serialize};

/// Words that mark a button as accepting the agent's proposal.
pub const ACCEPT_WORDS: &[&str] = &["accept", "apply", "keep", "allow", "approve", "confirm"];

/// Words that mark a button as sending the prompt.
pub const SUBMIT_WORDS: &[&str] = &["submit", "send"];

/// Words that exclude a button from ever being treated as accept.
pub const REJECT_WORDS: &[&str] = &[
	"cancel", "reject", "decline", "deny", "discard", "dismiss", "undo", "revert", "stop",
];

/// Rendered facts about a button, as read from the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonFacts {
	pub text: String,
	pub visible: bool,
	pub disabled: bool,
}

impl ButtonFacts {
	pub fn new(text: impl Into<String>, visible: bool, disabled: bool) -> Self {
		Self {
			text: text.into(),
			visible,
			disabled,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonClass {
	Accept,
	Submit,
	Neutral,
}

impl ButtonClass {
	pub fn as_str(self) -> &'static str {
		match self {
			ButtonClass::Accept => "accept",
			ButtonClass::Submit => "submit",
			ButtonClass::Neutral => "neutral",
		}
	}
}

impl std::fmt::Display for ButtonClass {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Trims, lowercases, and collapses internal whitespace.
pub fn normalize(text: &str) -> String {
	text.split_whitespace()
		.collect::<Vec<_>>()
		.join(" ")
		.to_lowercase()
}

fn words(normalized: &str) -> impl Iterator<Item = &str> {
	normalized
		.split(|c: char| !c.is_alphanumeric())
		.filter(|w| !w.is_empty())
}

/// Exact match, or `word` followed by a non-alphanumeric character.
fn starts_with_word(normalized: &str, word: &str) -> bool {
	match normalized.strip_prefix(word) {
		Some(rest) => rest.chars().next().is_none_or(|c| !c.is_alphanumeric()),
		None => false,
	}
}

/// Classifies a button from its rendered facts.
pub fn classify(facts: &ButtonFacts) -> ButtonClass {
	if !facts.visible || facts.disabled {
		return ButtonClass::Neutral;
	}

	let text = normalize(&facts.text);
	if text.is_empty() {
		return ButtonClass::Neutral;
	}
	if words(&text).any(|w| REJECT_WORDS.iter().any(|r| w.starts_with(r))) {
		return ButtonClass::Neutral;
	}
	if ACCEPT_WORDS.iter().any(|w| starts_with_word(&text, w)) {
		return ButtonClass::Accept;
	}
	if SUBMIT_WORDS.iter().any(|w| starts_with_word(&text, w)) {
		return ButtonClass::Submit;
	}
	ButtonClass::Neutral
}

pub fn is_accept(facts: &ButtonFacts) -> bool {
	classify(facts) == ButtonClass::Accept
}
