//! Command, response and event frames.
//!
//! Every frame is a single JSON object carried in one WebSocket text message.
//! Outbound commands carry a correlation `id`; inbound responses echo it back,
//! inbound events carry only `method` and `params`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound command frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
	/// Correlation id, unique per connection
	pub id: u64,
	/// Domain-qualified method name (e.g. `Runtime.evaluate`)
	pub method: String,
	/// Method parameters as a JSON object
	pub params: Value,
}

/// Inbound response frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
	/// Id of the request this response answers
	pub id: u64,
	/// Success result (mutually exclusive with error)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// Error result (mutually exclusive with result)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
}

/// Protocol-level error carried by a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
	/// JSON-RPC style error code (e.g. -32601 for unknown method)
	pub code: i64,
	/// Human-readable message
	pub message: String,
	/// Optional extra detail (usually a string, but any JSON value is accepted)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

/// Inbound unsolicited event frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
	/// Event name (e.g. `Runtime.consoleAPICalled`)
	pub method: String,
	/// Event payload
	#[serde(default)]
	pub params: Value,
	/// Flattened session the event belongs to, if any
	#[serde(rename = "sessionId", default, skip_serializing_if = "Option::is_none")]
	pub session_id: Option<String>,
}

/// Discriminated union of inbound frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Response message (has `id` field)
	Response(Response),
	/// Event message (no `id` field)
	Event(Event),
	/// Anything else (forward-compatible catch-all)
	Unknown(Value),
}

impl Request {
	pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
		Self {
			id,
			method: method.into(),
			params,
		}
	}
}
