//! [`CdpManager`]: connection lifecycle for one IDE window.
//!
//! The manager runs discovery, opens the socket, installs the page helper, and
//! hands out the correlated command channel. It never reconnects on its own;
//! after the socket drops, callers see [`AutomationError::NotConnected`] and
//! call [`CdpManager::try_connect`] again.

use std::sync::Arc;
use std::time::Duration;

use forloop_protocol::{EvaluateParams, EvaluateResult, RUNTIME_EVALUATE};
use forloop_runtime::{Connection, TargetDescriptor, WebSocketTransport, find_available_endpoint};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{AutomationError, Result};
use crate::helper::{self, HelperConfig};

/// Lifecycle of a [`CdpManager`]. `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
	Disconnected,
	Discovering,
	Connecting,
	Active,
	Disposed,
}

impl std::fmt::Display for ConnectionState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			ConnectionState::Disconnected => "disconnected",
			ConnectionState::Discovering => "discovering",
			ConnectionState::Connecting => "connecting",
			ConnectionState::Active => "active",
			ConnectionState::Disposed => "disposed",
		};
		f.write_str(name)
	}
}

/// Summary of the socket an active manager is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketInfo {
	pub port: u16,
	pub web_socket_debugger_url: String,
	pub target_id: String,
	pub title: String,
	pub url: String,
}

impl From<&TargetDescriptor> for SocketInfo {
	fn from(descriptor: &TargetDescriptor) -> Self {
		Self {
			port: descriptor.port,
			web_socket_debugger_url: descriptor.web_socket_debugger_url.clone(),
			target_id: descriptor.id().to_string(),
			title: descriptor.title().to_string(),
			url: descriptor.target.url.clone(),
		}
	}
}

struct Session {
	connection: Arc<Connection>,
	socket: SocketInfo,
	_run_task: JoinHandle<()>,
}

struct Inner {
	state: ConnectionState,
	session: Option<Session>,
}

impl Inner {
	/// The only place `state` changes. Refuses to leave `Disposed`.
	fn transition(&mut self, next: ConnectionState) -> bool {
		let from = self.state;
		if from == next {
			return true;
		}
		if from == ConnectionState::Disposed {
			tracing::debug!(%next, "ignoring transition out of disposed");
			return false;
		}
		tracing::info!(%from, to = %next, "connection state");
		self.state = next;
		true
	}

	/// Drops a session whose socket has closed underneath us.
	fn observe_closed(&mut self) {
		let closed = self
			.session
			.as_ref()
			.is_some_and(|s| !s.connection.is_open());
		if closed {
			self.session = None;
			if self.state == ConnectionState::Active {
				tracing::warn!("DevTools socket closed");
				self.transition(ConnectionState::Disconnected);
			}
		}
	}
}

/// Owns the connection to the IDE's DevTools endpoint.
pub struct CdpManager {
	config: Config,
	helper: HelperConfig,
	inner: Mutex<Inner>,
	connect_lock: tokio::sync::Mutex<()>,
}

impl CdpManager {
	pub fn new(config: Config) -> Self {
		let helper = HelperConfig::from(&config);
		Self {
			config,
			helper,
			inner: Mutex::new(Inner {
				state: ConnectionState::Disconnected,
				session: None,
			}),
			connect_lock: tokio::sync::Mutex::new(()),
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn state(&self) -> ConnectionState {
		let mut inner = self.inner.lock();
		inner.observe_closed();
		inner.state
	}

	/// Connects if needed, reporting success as a flag.
	///
	/// Returns `true` immediately when already active. Failures are logged and
	/// leave the manager `Disconnected`.
	pub async fn try_connect(&self) -> bool {
		match self.connect().await {
			Ok(_) => true,
			Err(e) => {
				tracing::warn!(error = %e, "connect failed");
				false
			}
		}
	}

	/// Connects if needed: discover, open the socket, install the helper.
	pub async fn connect(&self) -> Result<SocketInfo> {
		let _connecting = self.connect_lock.lock().await;

		{
			let mut inner = self.inner.lock();
			inner.observe_closed();
			match inner.state {
				ConnectionState::Disposed => return Err(AutomationError::Disposed),
				ConnectionState::Active => {
					if let Some(session) = &inner.session {
						return Ok(session.socket.clone());
					}
				}
				_ => {}
			}
			inner.transition(ConnectionState::Discovering);
		}

		let options = self.config.discovery_options();
		let Some(descriptor) = find_available_endpoint(&options).await else {
			self.inner.lock().transition(ConnectionState::Disconnected);
			return Err(AutomationError::EndpointNotFound { ports: options.ports });
		};

		if !self.inner.lock().transition(ConnectionState::Connecting) {
			return Err(AutomationError::Disposed);
		}

		let session = match self.open(&descriptor).await {
			Ok(session) => session,
			Err(e) => {
				self.inner.lock().transition(ConnectionState::Disconnected);
				return Err(e);
			}
		};
		let socket = session.socket.clone();

		{
			let mut inner = self.inner.lock();
			if !inner.transition(ConnectionState::Active) {
				session.connection.dispose();
				return Err(AutomationError::Disposed);
			}
			inner.session = Some(session);
		}

		if let Err(e) = self.install_helper().await {
			let mut inner = self.inner.lock();
			if let Some(session) = inner.session.take() {
				session.connection.dispose();
			}
			inner.transition(ConnectionState::Disconnected);
			return Err(match e {
				AutomationError::HelperInstall(_) | AutomationError::Disposed => e,
				other => AutomationError::HelperInstall(other.to_string()),
			});
		}

		tracing::info!(port = socket.port, target = %socket.target_id, title = %socket.title, "connected");
		Ok(socket)
	}

	async fn open(&self, descriptor: &TargetDescriptor) -> Result<Session> {
		let (transport, message_rx) =
			WebSocketTransport::connect(&descriptor.web_socket_debugger_url).await?;
		let connection = Arc::new(Connection::with_timeout(
			transport.into_transport_parts(message_rx),
			self.config.command_timeout(),
		));

		let runner = Arc::clone(&connection);
		let run_task = tokio::spawn(async move {
			match runner.run().await {
				Ok(()) => tracing::debug!("dispatch loop finished"),
				Err(e) => tracing::warn!(error = %e, "dispatch loop failed"),
			}
		});

		Ok(Session {
			connection,
			socket: SocketInfo::from(descriptor),
			_run_task: run_task,
		})
	}

	fn active_connection(&self) -> Result<Arc<Connection>> {
		let mut inner = self.inner.lock();
		inner.observe_closed();
		match (inner.state, &inner.session) {
			(ConnectionState::Disposed, _) => Err(AutomationError::Disposed),
			(ConnectionState::Active, Some(session)) => Ok(Arc::clone(&session.connection)),
			_ => Err(AutomationError::NotConnected),
		}
	}

	/// Sends a command with the configured deadline. Valid only while active.
	pub async fn send_command(&self, method: &str, params: Value) -> Result<Value> {
		let connection = self.active_connection()?;
		Ok(connection.send_command(method, params).await?)
	}

	pub async fn send_command_with_timeout(
		&self,
		method: &str,
		params: Value,
		timeout: Duration,
	) -> Result<Value> {
		let connection = self.active_connection()?;
		Ok(connection
			.send_command_with_timeout(method, params, timeout)
			.await?)
	}

	/// Evaluates an expression in the page and returns its value by copy.
	///
	/// A thrown exception becomes [`AutomationError::Evaluation`]; `undefined`
	/// comes back as `None`.
	pub async fn evaluate(&self, expression: &str) -> Result<Option<Value>> {
		let params = serde_json::to_value(EvaluateParams::by_value(expression).with_user_gesture())?;
		let raw = self.send_command(RUNTIME_EVALUATE, params).await?;
		let result: EvaluateResult = serde_json::from_value(raw)?;

		if let Some(details) = result.exception_details {
			return Err(AutomationError::Evaluation {
				message: details.message(),
			});
		}
		Ok(result.result.value)
	}

	/// Evaluates the helper installer in the page.
	pub async fn install_helper(&self) -> Result<()> {
		let script = helper::installer_script(&self.helper);
		match self.evaluate(&script).await {
			Ok(Some(Value::Bool(true))) => {
				tracing::debug!(namespace = %self.helper.namespace, "page helper installed");
				Ok(())
			}
			Ok(other) => Err(AutomationError::HelperInstall(format!(
				"installer returned {}",
				other.map_or_else(|| "undefined".to_string(), |v| v.to_string())
			))),
			Err(AutomationError::Evaluation { message }) => Err(AutomationError::HelperInstall(message)),
			Err(e) => Err(e),
		}
	}

	pub fn helper_config(&self) -> &HelperConfig {
		&self.helper
	}

	/// Closes the socket, rejects every in-flight command, and moves to
	/// `Disposed`. Safe to call any number of times.
	pub fn dispose(&self) {
		let mut inner = self.inner.lock();
		if inner.state == ConnectionState::Disposed {
			return;
		}
		if let Some(session) = inner.session.take() {
			let rejected = session.connection.dispose();
			tracing::info!(rejected, port = session.socket.port, "disposed connection");
		}
		inner.transition(ConnectionState::Disposed);
	}

	/// True iff the manager is active and its socket is open.
	pub fn is_connector_active(&self) -> bool {
		let mut inner = self.inner.lock();
		inner.observe_closed();
		inner.state == ConnectionState::Active
			&& inner
				.session
				.as_ref()
				.is_some_and(|s| s.connection.is_open())
	}

	/// The socket in use, or `None` unless active.
	pub fn connected_socket(&self) -> Option<SocketInfo> {
		let mut inner = self.inner.lock();
		inner.observe_closed();
		match (inner.state, &inner.session) {
			(ConnectionState::Active, Some(session)) => Some(session.socket.clone()),
			_ => None,
		}
	}
}

impl Drop for CdpManager {
	fn drop(&mut self) {
		if let Some(session) = self.inner.get_mut().session.take() {
			session.connection.dispose();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn starts_disconnected() {
		let manager = CdpManager::new(Config::default());
		assert_eq!(manager.state(), ConnectionState::Disconnected);
		assert!(!manager.is_connector_active());
		assert!(manager.connected_socket().is_none());
	}

	#[tokio::test]
	async fn commands_need_a_connection() {
		let manager = CdpManager::new(Config::default());
		let err = manager
			.send_command("Runtime.evaluate", serde_json::json!({}))
			.await
			.unwrap_err();
		assert!(matches!(err, AutomationError::NotConnected));
	}

	#[tokio::test]
	async fn disposed_is_terminal() {
		let manager = CdpManager::new(Config::default());
		manager.dispose();
		manager.dispose();
		assert_eq!(manager.state(), ConnectionState::Disposed);
		assert!(!manager.try_connect().await);
		assert!(matches!(manager.connect().await, Err(AutomationError::Disposed)));
		assert!(matches!(
			manager.send_command("Runtime.evaluate", serde_json::json!({})).await,
			Err(AutomationError::Disposed)
		));
	}

	#[test]
	fn transitions_refuse_to_leave_disposed() {
		let mut inner = Inner {
			state: ConnectionState::Active,
			session: None,
		};
		assert!(inner.transition(ConnectionState::Disposed));
		assert!(!inner.transition(ConnectionState::Connecting));
		assert_eq!(inner.state, ConnectionState::Disposed);
	}
}
