//! Target listing returned by the HTTP discovery endpoint (`GET /json/list`).

use serde::{Deserialize, Serialize};

/// Target type reported for top-level documents.
pub const PAGE_TARGET_TYPE: &str = "page";

/// One entry of the `/json/list` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
	/// Opaque target id
	pub id: String,
	/// Target kind (`page`, `iframe`, `worker`, `service_worker`, ...)
	#[serde(rename = "type")]
	pub target_type: String,
	/// Document title at listing time
	#[serde(default)]
	pub title: String,
	/// Document URL at listing time
	#[serde(default)]
	pub url: String,
	/// Socket URL to attach to this target; absent when another client is attached
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub web_socket_debugger_url: Option<String>,
	/// URL of the built-in DevTools frontend for this target
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub devtools_frontend_url: Option<String>,
}

impl TargetInfo {
	/// Whether this target is a top-level page.
	pub fn is_page(&self) -> bool {
		self.target_type == PAGE_TARGET_TYPE
	}

	/// Whether a socket URL is available for attaching.
	pub fn is_attachable(&self) -> bool {
		self.web_socket_debugger_url
			.as_deref()
			.is_some_and(|url| !url.is_empty())
	}
}
