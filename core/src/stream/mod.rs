//! Live activity feed for in-flight agent invocations

pub mod client;
pub mod event;
pub mod transport;

pub use client::{ActivityStreamClient, StreamStatus};
pub use event::{ActivityEvent, EventKind};
pub use transport::{ChannelTransport, EventStream, StreamTransport, WebSocketTransport};
