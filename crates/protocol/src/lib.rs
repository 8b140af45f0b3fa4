//! Wire types for the Chrome DevTools Protocol subset spoken by forloop.
//!
//! This crate contains the serde-serializable shapes that cross the wire
//! between the host and a remote debugging endpoint:
//!
//! - **Frames**: outbound command requests, inbound responses and events
//! - **Targets**: descriptors returned by the HTTP `/json/list` discovery endpoint
//! - **Runtime**: parameters and results of the `Runtime.evaluate` command
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization/deserialization and trivial accessors
//! - **1:1 with protocol**: Field names follow the DevTools protocol's camelCase names
//! - **Lenient on input**: Unknown fields are ignored so newer endpoints keep working

pub mod message;
pub mod runtime;
pub mod target;

pub use message::*;
pub use runtime::*;
pub use target::*;
