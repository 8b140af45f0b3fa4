//! forloop runtime - endpoint discovery, transport, and request correlation
//!
//! This crate provides the low-level infrastructure for talking to a remote
//! debugging endpoint over the DevTools protocol:
//!
//! - **Discovery**: Probing a port range for a live `/json/list` endpoint
//! - **Transport**: WebSocket framing split into sender and receiver halves
//! - **Connection**: Id-based request/response correlation, per-call timeouts,
//!   and disposal that rejects everything outstanding
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ forloop      │  CdpManager, injected helper, automation facade
//! └──────┬───────┘
//!        │ send_command(method, params)
//! ┌──────▼───────┐
//! │ runtime      │  This crate
//! │  ┌────────┐  │
//! │  │ Conn   │  │  id correlation
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Trans  │  │  WebSocket frames
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Disco  │  │  HTTP /json/list probing
//! │  └────────┘  │
//! └──────────────┘
//! ```

pub mod connection;
pub mod discovery;
pub mod error;
pub mod transport;

pub use connection::{Connection, DEFAULT_COMMAND_TIMEOUT};
pub use discovery::{
	DiscoveryOptions, PortProbe, TARGET_LIST_PATH, TargetDescriptor, find_available_endpoint,
	probe_all, probe_port, select_target,
};
pub use error::{Error, Result};
pub use transport::{
	Transport, TransportParts, TransportReceiver, WebSocketTransport, WebSocketTransportReceiver,
	WebSocketTransportSender,
};
