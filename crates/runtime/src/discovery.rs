//! Endpoint discovery over the DevTools HTTP interface.
//!
//! Probes each port of a small inclusive range with `GET /json/list` and picks
//! the IDE's main window out of the first listing that has an attachable page.
//! Finding nothing is an expected outcome (the IDE is not running, or was
//! started without `--remote-debugging-port`) and is reported as `None`.

use std::ops::RangeInclusive;
use std::time::Duration;

use forloop_protocol::TargetInfo;
use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};

/// Path of the target listing on the DevTools HTTP server.
pub const TARGET_LIST_PATH: &str = "/json/list";

/// Inputs for one discovery pass.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
	/// Host the debugging server listens on
	pub host: String,
	/// Candidate ports, probed in order
	pub ports: RangeInclusive<u16>,
	/// Per-port request timeout
	pub probe_timeout: Duration,
	/// Substring of the main window's title
	pub title_hint: Option<String>,
	/// Substrings identifying the main window's URL
	pub url_markers: Vec<String>,
}

impl Default for DiscoveryOptions {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			ports: 9000..=9003,
			probe_timeout: Duration::from_millis(800),
			title_hint: Some("Antigravity".to_string()),
			url_markers: vec!["workbench.html".to_string()],
		}
	}
}

/// A connectable target chosen by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDescriptor {
	/// Port the target was found on
	pub port: u16,
	/// Socket URL to open
	pub web_socket_debugger_url: String,
	/// Full listing entry
	pub target: TargetInfo,
}

impl TargetDescriptor {
	pub fn id(&self) -> &str {
		&self.target.id
	}

	pub fn title(&self) -> &str {
		&self.target.title
	}
}

/// Result of probing a single port, for diagnostics.
#[derive(Debug)]
pub struct PortProbe {
	pub port: u16,
	pub targets: Result<Vec<TargetInfo>>,
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
	Ok(reqwest::Client::builder()
		.timeout(timeout)
		.no_proxy()
		.build()?)
}

/// Fetches the target listing from one port.
pub async fn probe_port(client: &reqwest::Client, host: &str, port: u16) -> Result<Vec<TargetInfo>> {
	let url = format!("http://{host}:{port}{TARGET_LIST_PATH}");

	let response = client.get(&url).send().await?;
	if !response.status().is_success() {
		return Err(Error::ProtocolError(format!(
			"Unexpected response from port {}: {}",
			port,
			response.status()
		)));
	}

	let body = response.bytes().await?;
	Ok(serde_json::from_slice(&body)?)
}

/// Picks the main-window page out of a target listing.
///
/// Preference order: an attachable page whose URL carries one of the
/// `url_markers` or whose title contains `title_hint`; otherwise the first
/// attachable page.
pub fn select_target<'a>(targets: &'a [TargetInfo], options: &DiscoveryOptions) -> Option<&'a TargetInfo> {
	let mut pages = targets
		.iter()
		.filter(|t| t.is_page() && t.is_attachable() && socket_url_is_valid(t));

	let is_main_window = |t: &&TargetInfo| {
		options
			.url_markers
			.iter()
			.any(|marker| !marker.is_empty() && t.url.contains(marker.as_str()))
			|| options
				.title_hint
				.as_deref()
				.is_some_and(|hint| !hint.is_empty() && t.title.contains(hint))
	};

	pages.clone().find(is_main_window).or_else(|| pages.next())
}

fn socket_url_is_valid(target: &TargetInfo) -> bool {
	target
		.web_socket_debugger_url
		.as_deref()
		.and_then(|raw| Url::parse(raw).ok())
		.is_some_and(|url| matches!(url.scheme(), "ws" | "wss"))
}

/// Probes the configured ports in order and returns the first usable target.
///
/// Never errors: unreachable ports, HTTP failures and unparseable listings are
/// logged and skipped. No retries are made within one call.
pub async fn find_available_endpoint(options: &DiscoveryOptions) -> Option<TargetDescriptor> {
	let client = match http_client(options.probe_timeout) {
		Ok(client) => client,
		Err(e) => {
			tracing::warn!("Failed to create HTTP client: {}", e);
			return None;
		}
	};

	for port in options.ports.clone() {
		let targets = match probe_port(&client, &options.host, port).await {
			Ok(targets) => targets,
			Err(e) => {
				tracing::debug!(port, error = %e, "no DevTools endpoint");
				continue;
			}
		};

		match select_target(&targets, options) {
			Some(target) => {
				tracing::info!(port, id = %target.id, title = %target.title, "found DevTools target");
				return Some(TargetDescriptor {
					port,
					web_socket_debugger_url: target.web_socket_debugger_url.clone().unwrap_or_default(),
					target: target.clone(),
				});
			}
			None => {
				tracing::debug!(port, listed = targets.len(), "endpoint has no attachable page");
			}
		}
	}

	tracing::debug!(
		host = %options.host,
		start = options.ports.start(),
		end = options.ports.end(),
		"no DevTools endpoint in range"
	);
	None
}

/// Probes every port in range and reports each outcome.
pub async fn probe_all(options: &DiscoveryOptions) -> Result<Vec<PortProbe>> {
	let client = http_client(options.probe_timeout)?;
	let mut probes = Vec::new();
	for port in options.ports.clone() {
		let targets = probe_port(&client, &options.host, port).await;
		probes.push(PortProbe { port, targets });
	}
	Ok(probes)
}
