//! Message transport to a DevTools endpoint.
//!
//! The transport carries one JSON object per WebSocket text message. It is split
//! into two halves so the connection can write and read concurrently:
//!
//! - [`Transport`]: outbound half, writes command frames and closes the socket
//! - [`TransportReceiver`]: inbound half, a read loop that forwards every parsed
//!   frame into an unbounded channel
//!
//! Frames that are not valid JSON are dropped at this layer. Socket errors end the
//! read loop with an error, which the connection treats as a lost transport.


use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::{Error, Result};

/// Outbound half of a transport.
pub trait Transport: Send {
	/// Writes one frame.
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

	/// Sends a close frame and flushes the socket.
	fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Inbound half of a transport.
pub trait TransportReceiver: Send {
	/// Reads frames until the socket closes or errors.
	///
	/// Returns `Ok(())` on a clean close or when the consumer hung up.
	fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// Both halves of a transport plus the channel the receiver feeds.
pub struct TransportParts {
	pub sender: Box<dyn Transport>,
	pub receiver: Box<dyn TransportReceiver>,
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// WebSocket transport over any byte stream.
///
/// Production code uses [`WebSocketTransport::connect`]; tests wrap an in-memory
/// duplex stream with [`WebSocketTransport::new`].
pub struct WebSocketTransport<S> {
	stream: WebSocketStream<S>,
	message_tx: mpsc::UnboundedSender<Value>,
}

/// Outbound half of [`WebSocketTransport`].
pub struct WebSocketTransportSender<S> {
	sink: SplitSink<WebSocketStream<S>, WsMessage>,
}

/// Inbound half of [`WebSocketTransport`].
pub struct WebSocketTransportReceiver<S> {
	stream: SplitStream<WebSocketStream<S>>,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl WebSocketTransport<MaybeTlsStream<TcpStream>> {
	/// Opens a WebSocket to a `webSocketDebuggerUrl`.
	pub async fn connect(url: &str) -> Result<(Self, mpsc::UnboundedReceiver<Value>)> {
		tracing::debug!(url, "opening DevTools socket");

		let (stream, _response) = tokio_tungstenite::connect_async(url)
			.await
			.map_err(|e| Error::ConnectionFailed {
				url: url.to_string(),
				reason: e.to_string(),
			})?;

		Ok(Self::new(stream))
	}
}

impl<S> WebSocketTransport<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	/// Wraps an established WebSocket stream.
	pub fn new(stream: WebSocketStream<S>) -> (Self, mpsc::UnboundedReceiver<Value>) {
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		(Self { stream, message_tx }, message_rx)
	}

	/// Splits into independently owned sender and receiver halves.
	pub fn into_parts(self) -> (WebSocketTransportSender<S>, WebSocketTransportReceiver<S>) {
		let (sink, stream) = self.stream.split();
		(
			WebSocketTransportSender { sink },
			WebSocketTransportReceiver {
				stream,
				message_tx: self.message_tx,
			},
		)
	}

	/// Splits into boxed halves ready for [`Connection::new`](crate::Connection::new).
	pub fn into_transport_parts(self, message_rx: mpsc::UnboundedReceiver<Value>) -> TransportParts {
		let (sender, receiver) = self.into_parts();
		TransportParts {
			sender: Box::new(sender),
			receiver: Box::new(receiver),
			message_rx,
		}
	}
}

impl<S> WebSocketTransportSender<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	pub async fn send(&mut self, message: Value) -> Result<()> {
		let text = serde_json::to_string(&message)?;
		self.sink
			.send(WsMessage::Text(text))
			.await
			.map_err(|e| Error::TransportError(format!("Failed to write frame: {e}")))
	}

	pub async fn close(&mut self) -> Result<()> {
		self.sink
			.close()
			.await
			.map_err(|e| Error::TransportError(format!("Failed to close socket: {e}")))
	}
}

impl<S> Transport for WebSocketTransportSender<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(WebSocketTransportSender::send(self, message))
	}

	fn close(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(WebSocketTransportSender::close(self))
	}
}

impl<S> WebSocketTransportReceiver<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	/// Reads frames until close, error, or consumer hang-up.
	pub async fn run(mut self) -> Result<()> {
		while let Some(frame) = self.stream.next().await {
			let payload = match frame {
				Ok(WsMessage::Text(text)) => text.into_bytes(),
				Ok(WsMessage::Binary(bytes)) => bytes,
				Ok(WsMessage::Close(close)) => {
					tracing::debug!(?close, "DevTools socket closed by peer");
					return Ok(());
				}
				Ok(_) => continue,
				Err(e) => {
					return Err(Error::TransportError(format!("Failed to read frame: {e}")));
				}
			};

			let value = match serde_json::from_slice::<Value>(&payload) {
				Ok(value) => value,
				Err(e) => {
					tracing::debug!(error = %e, len = payload.len(), "dropping malformed frame");
					continue;
				}
			};

			if self.message_tx.send(value).is_err() {
				// Consumer gone; nothing left to deliver to.
				return Ok(());
			}
		}

		Ok(())
	}
}

impl<S> TransportReceiver for WebSocketTransportReceiver<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
		Box::pin(WebSocketTransportReceiver::run(*self))
	}
}
