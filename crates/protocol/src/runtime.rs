//! `Runtime.evaluate` parameters and result shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method name of the evaluate-expression primitive.
pub const RUNTIME_EVALUATE: &str = "Runtime.evaluate";

/// Parameters for `Runtime.evaluate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
	/// Expression to evaluate in the page's main world
	pub expression: String,
	/// Return the result serialized as JSON instead of as a remote reference
	pub return_by_value: bool,
	/// Await a returned promise before responding
	#[serde(default)]
	pub await_promise: bool,
	/// Treat the evaluation as initiated by a user gesture
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_gesture: Option<bool>,
}

impl EvaluateParams {
	/// By-value evaluation with no promise awaiting.
	pub fn by_value(expression: impl Into<String>) -> Self {
		Self {
			expression: expression.into(),
			return_by_value: true,
			await_promise: false,
			user_gesture: None,
		}
	}

	pub fn with_user_gesture(mut self) -> Self {
		self.user_gesture = Some(true);
		self
	}
}

/// Mirror object describing a value living in the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
	/// JavaScript `typeof` of the value (`object`, `boolean`, `undefined`, ...)
	#[serde(rename = "type")]
	pub object_type: String,
	/// Refinement of `object` (`null`, `node`, `array`, `error`, ...)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subtype: Option<String>,
	/// Serialized value when evaluated by value; absent for `undefined`
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
	/// Primitive values that JSON cannot carry (`NaN`, `-0`, bigints)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub unserializable_value: Option<String>,
	/// String representation of the object
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

/// Details about an exception thrown during evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
	#[serde(default)]
	pub exception_id: i64,
	/// Short summary, usually `Uncaught`
	#[serde(default)]
	pub text: String,
	#[serde(default)]
	pub line_number: i64,
	#[serde(default)]
	pub column_number: i64,
	/// The thrown value
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
	/// Best available human-readable message for the exception.
	pub fn message(&self) -> String {
		self.exception
			.as_ref()
			.and_then(|e| e.description.as_deref())
			.and_then(|d| d.lines().next())
			.filter(|line| !line.is_empty())
			.map(str::to_string)
			.unwrap_or_else(|| self.text.clone())
	}
}

/// Result of `Runtime.evaluate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
	/// Evaluation result (the thrown value when an exception occurred)
	pub result: RemoteObject,
	/// Present when the expression threw
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exception_details: Option<ExceptionDetails>,
}
