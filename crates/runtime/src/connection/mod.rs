//! Request/response correlation on top of the transport.
//!
//! This module implements the command layer of the DevTools protocol:
//! - Generating unique, monotonically increasing request ids
//! - Correlating responses with pending requests purely by id
//! - Dropping events and unmatched frames
//! - Rejecting every outstanding request when the socket closes or the
//!   connection is disposed
//!
//! # Message Flow
//!
//! 1. Caller invokes `send_command()` with a method and params
//! 2. Connection allocates an id and registers a oneshot channel for it
//! 3. The request frame is queued for the writer task
//! 4. Caller awaits the oneshot receiver, bounded by the per-call timeout
//! 5. The dispatch loop receives a frame from the transport
//! 6. A response is matched by id and its result sent through the oneshot channel
//!
//! Responses are never matched by arrival order, so any number of commands may
//! be in flight at once.


use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use forloop_protocol::{ErrorPayload, Message, Request, Response};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};

use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// Default per-call deadline.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// How long `run()` lets the writer flush a close frame after `dispose()`.
const CLOSE_GRACE: Duration = Duration::from_millis(250);

/// A request awaiting its response.
struct PendingCall {
	method: String,
	created_at: Instant,
	responder: oneshot::Sender<Result<Value>>,
}

/// Pending request callbacks keyed by request id.
type CallbackMap = Arc<Mutex<HashMap<u64, PendingCall>>>;

/// Frames queued for the writer task.
enum Outbound {
	Frame(Value),
	Close,
}

/// Why the dispatch loop in [`Connection::run`] stopped.
enum LoopEnd {
	PeerClosed,
	Shutdown,
	WriterStopped(std::result::Result<Result<()>, tokio::task::JoinError>),
}

/// RAII guard removing the callback when a request future is dropped early
/// (timeout or caller cancellation).
struct CancelGuard {
	id: u64,
	callbacks: CallbackMap,
	completed: bool,
}

impl CancelGuard {
	fn new(id: u64, callbacks: CallbackMap) -> Self {
		Self {
			id,
			callbacks,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}

		if let Some(pending) = self.callbacks.lock().remove(&self.id) {
			tracing::debug!(
				id = self.id,
				method = %pending.method,
				elapsed_ms = pending.created_at.elapsed().as_millis() as u64,
				"removed abandoned request"
			);
		}
	}
}

/// Future returned by [`Connection::send_command`] with automatic cleanup.
struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.complete();
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// Correlating connection to one DevTools target.
///
/// Each instance owns its own id counter and pending map; nothing is shared
/// between connections.
pub struct Connection {
	/// Next request id (starts at 1, never reused)
	last_id: AtomicU64,
	/// Pending request callbacks keyed by request id
	callbacks: CallbackMap,
	/// Channel feeding the writer task
	outbound_tx: mpsc::UnboundedSender<Outbound>,
	/// Transport halves and channels, taken once by `run()`
	transport_sender: Mutex<Option<Box<dyn Transport>>>,
	transport_receiver: Mutex<Option<Box<dyn TransportReceiver>>>,
	message_rx: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
	outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<Outbound>>>,
	/// Cleared when the dispatch loop ends or the connection is disposed
	open: AtomicBool,
	disposed: AtomicBool,
	shutdown: watch::Sender<bool>,
	default_timeout: Duration,
}

impl Connection {
	/// Create a new Connection over the given transport halves.
	pub fn new(parts: TransportParts) -> Self {
		Self::with_timeout(parts, DEFAULT_COMMAND_TIMEOUT)
	}

	/// Create a new Connection with a custom default per-call deadline.
	pub fn with_timeout(parts: TransportParts, default_timeout: Duration) -> Self {
		let TransportParts {
			sender,
			receiver,
			message_rx,
		} = parts;

		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let (shutdown, _) = watch::channel(false);

		Self {
			last_id: AtomicU64::new(1),
			callbacks: Arc::new(Mutex::new(HashMap::new())),
			outbound_tx,
			transport_sender: Mutex::new(Some(sender)),
			transport_receiver: Mutex::new(Some(receiver)),
			message_rx: Mutex::new(Some(message_rx)),
			outbound_rx: Mutex::new(Some(outbound_rx)),
			open: AtomicBool::new(true),
			disposed: AtomicBool::new(false),
			shutdown,
			default_timeout,
		}
	}

	/// Whether the transport is still usable.
	pub fn is_open(&self) -> bool {
		self.open.load(Ordering::SeqCst) && !self.disposed.load(Ordering::SeqCst)
	}

	pub fn is_disposed(&self) -> bool {
		self.disposed.load(Ordering::SeqCst)
	}

	/// Number of requests currently awaiting a response.
	pub fn pending_count(&self) -> usize {
		self.callbacks.lock().len()
	}

	pub fn default_timeout(&self) -> Duration {
		self.default_timeout
	}

	/// Sends a command and awaits its response with the default deadline.
	pub async fn send_command(&self, method: &str, params: Value) -> Result<Value> {
		self.send_command_with_timeout(method, params, self.default_timeout)
			.await
	}

	/// Sends a command and awaits its response with an explicit deadline.
	///
	/// A timeout fails only this call; the connection stays usable and a late
	/// response for the abandoned id is dropped.
	pub async fn send_command_with_timeout(
		&self,
		method: &str,
		params: Value,
		timeout: Duration,
	) -> Result<Value> {
		self.ensure_usable()?;

		let id = self.last_id.fetch_add(1, Ordering::SeqCst);
		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().insert(
			id,
			PendingCall {
				method: method.to_string(),
				created_at: Instant::now(),
				responder: tx,
			},
		);
		let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

		// dispose() may have drained the map between the check and the insert.
		self.ensure_usable()?;

		let request = serde_json::to_value(Request::new(id, method, params))?;
		tracing::debug!(id, method, "sending command");

		if self.outbound_tx.send(Outbound::Frame(request)).is_err() {
			tracing::error!(id, method, "outbound channel closed");
			return Err(Error::ChannelClosed);
		}

		match tokio::time::timeout(timeout, ResponseFuture { rx, guard }).await {
			Ok(result) => result,
			Err(_) => {
				tracing::warn!(id, method, timeout_ms = timeout.as_millis() as u64, "command timed out");
				Err(Error::Timeout {
					method: method.to_string(),
					duration: timeout,
				})
			}
		}
	}

	fn ensure_usable(&self) -> Result<()> {
		if self.disposed.load(Ordering::SeqCst) {
			return Err(Error::Disposed);
		}
		if !self.open.load(Ordering::SeqCst) {
			return Err(Error::TransportClosed);
		}
		Ok(())
	}

	/// Runs the read/write loops until the socket closes or `dispose()` is called.
	///
	/// On exit every pending request is rejected: with [`Error::Disposed`] after
	/// `dispose()`, otherwise with [`Error::TransportClosed`].
	pub async fn run(self: &Arc<Self>) -> Result<()> {
		let (receiver, mut sender, mut outbound_rx, mut message_rx) = {
			let receiver = self.transport_receiver.lock().take();
			let sender = self.transport_sender.lock().take();
			let outbound_rx = self.outbound_rx.lock().take();
			let message_rx = self.message_rx.lock().take();
			match (receiver, sender, outbound_rx, message_rx) {
				(Some(r), Some(s), Some(o), Some(m)) => (r, s, o, m),
				_ => {
					return Err(Error::ProtocolError(
						"run() can only be called once".to_string(),
					));
				}
			}
		};

		let mut shutdown_rx = self.shutdown.subscribe();

		if self.is_disposed() {
			let _ = sender.close().await;
			self.finish();
			return Ok(());
		}

		let mut reader_handle = tokio::spawn(receiver.run());

		// Resolves with the write error, or `Ok` once a close frame was queued.
		let mut writer_handle = tokio::spawn(async move {
			while let Some(outbound) = outbound_rx.recv().await {
				match outbound {
					Outbound::Frame(message) => sender.send(message).await?,
					Outbound::Close => {
						if let Err(e) = sender.close().await {
							tracing::debug!("Close frame not delivered: {}", e);
						}
						break;
					}
				}
			}
			Ok::<(), Error>(())
		});

		let end = loop {
			tokio::select! {
				maybe = message_rx.recv() => match maybe {
					Some(value) => self.dispatch_value(value),
					None => break LoopEnd::PeerClosed,
				},
				_ = shutdown_rx.changed() => break LoopEnd::Shutdown,
				written = &mut writer_handle => break LoopEnd::WriterStopped(written),
			}
		};

		self.open.store(false, Ordering::SeqCst);

		match end {
			LoopEnd::PeerClosed => {
				match (&mut reader_handle).await {
					Ok(Ok(())) => tracing::info!("DevTools socket closed"),
					Ok(Err(e)) => tracing::warn!("DevTools transport failed: {}", e),
					Err(e) => tracing::warn!("DevTools reader task aborted: {}", e),
				}
				writer_handle.abort();
			}
			LoopEnd::Shutdown => {
				let _ = tokio::time::timeout(CLOSE_GRACE, &mut writer_handle).await;
				writer_handle.abort();
				reader_handle.abort();
			}
			LoopEnd::WriterStopped(written) => {
				match written {
					Ok(Err(e)) => tracing::warn!("DevTools transport write failed: {}", e),
					Ok(Ok(())) => tracing::debug!("writer stopped"),
					Err(e) => tracing::warn!("DevTools writer task aborted: {}", e),
				}
				reader_handle.abort();
			}
		}

		self.finish();
		Ok(())
	}

	fn finish(&self) {
		let disposed = self.is_disposed();
		let rejected = self.reject_all(|| {
			if disposed {
				Error::Disposed
			} else {
				Error::TransportClosed
			}
		});
		if rejected > 0 {
			tracing::debug!(rejected, disposed, "rejected outstanding commands");
		}
	}

	/// Closes the transport and rejects every pending request with
	/// [`Error::Disposed`].
	///
	/// Safe to call repeatedly; returns the number of requests rejected by
	/// this call.
	pub fn dispose(&self) -> usize {
		if self.disposed.swap(true, Ordering::SeqCst) {
			return 0;
		}

		self.open.store(false, Ordering::SeqCst);
		let _ = self.outbound_tx.send(Outbound::Close);
		self.shutdown.send_replace(true);

		let rejected = self.reject_all(|| Error::Disposed);
		tracing::debug!(rejected, "connection disposed");
		rejected
	}

	fn reject_all(&self, make_error: impl Fn() -> Error) -> usize {
		let drained: Vec<(u64, PendingCall)> = self.callbacks.lock().drain().collect();
		let count = drained.len();
		for (id, pending) in drained {
			tracing::trace!(id, method = %pending.method, "rejecting pending command");
			let _ = pending.responder.send(Err(make_error()));
		}
		count
	}

	fn dispatch_value(&self, value: Value) {
		match serde_json::from_value::<Message>(value) {
			Ok(message) => self.dispatch(message),
			Err(e) => tracing::debug!("Failed to parse frame: {}", e),
		}
	}

	/// Routes one inbound frame.
	fn dispatch(&self, message: Message) {
		match message {
			Message::Response(response) => self.dispatch_response(response),
			Message::Event(event) => {
				tracing::trace!(method = %event.method, "ignoring event");
			}
			Message::Unknown(value) => {
				tracing::debug!(
					"Unknown frame (ignored): {}",
					serde_json::to_string(&value)
						.unwrap_or_else(|_| "<serialization failed>".to_string())
				);
			}
		}
	}

	fn dispatch_response(&self, response: Response) {
		let Some(pending) = self.callbacks.lock().remove(&response.id) else {
			tracing::debug!(id = response.id, "dropping response for unknown request");
			return;
		};

		tracing::debug!(
			id = response.id,
			method = %pending.method,
			elapsed_ms = pending.created_at.elapsed().as_millis() as u64,
			"response received"
		);

		let result = match response.error {
			Some(error) => Err(parse_protocol_error(&pending.method, error)),
			None => Ok(response.result.unwrap_or(Value::Null)),
		};

		let _ = pending.responder.send(result);
	}
}

impl Drop for Connection {
	fn drop(&mut self) {
		self.reject_all(|| Error::ChannelClosed);
	}
}

/// Converts an [`ErrorPayload`] into [`Error::Remote`].
fn parse_protocol_error(method: &str, error: ErrorPayload) -> Error {
	Error::Remote {
		method: method.to_string(),
		code: error.code,
		message: error.message,
		data: error.data,
	}
}
