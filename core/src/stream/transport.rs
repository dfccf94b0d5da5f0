//! Live event channel transports
//!
//! [`StreamTransport`] is the seam between the activity stream client and
//! the wire. [`WebSocketTransport`] talks to the hosted backend;
//! [`ChannelTransport`] keeps everything in-process.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::event::ActivityEvent;
use crate::agent::SessionId;
use crate::error::{Result, StudioError};
use crate::util::{join_url, sanitize_stream_url};

/// Ordered events for one session. Ends when the server closes.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ActivityEvent>> + Send>>;

#[async_trait]
pub trait StreamTransport: Send + Sync + 'static {
    /// Open the channel scoped to `session`.
    async fn open(&self, session: &SessionId) -> Result<EventStream>;
}

/// WebSocket channel at `{url}/{session}`.
pub struct WebSocketTransport {
    url: String,
}

impl WebSocketTransport {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            url: sanitize_stream_url(url, "stream.url")?,
        })
    }

    pub fn session_url(&self, session: &SessionId) -> String {
        join_url(&self.url, &urlencoding::encode(session.as_str()))
    }
}

#[async_trait]
impl StreamTransport for WebSocketTransport {
    async fn open(&self, session: &SessionId) -> Result<EventStream> {
        let url = self.session_url(session);
        crate::debug_log!("Opening activity stream {}", url);

        let (mut socket, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| StudioError::Stream {
                reason: format!("failed to connect to {}: {}", url, e),
            })?;

        Ok(Box::pin(async_stream::try_stream! {
            while let Some(frame) = socket.next().await {
                let frame = frame.map_err(|e| StudioError::Stream {
                    reason: e.to_string(),
                })?;

                match frame {
                    Message::Text(text) => {
                        if let Some(event) = ActivityEvent::from_frame(&text) {
                            yield event;
                        }
                    }
                    Message::Close(_) => break,
                    // ping/pong handled by tungstenite
                    _ => {}
                }
            }
        }))
    }
}

type Feed = Result<ActivityEvent>;

#[derive(Default)]
struct Channel {
    tx: Option<mpsc::UnboundedSender<Feed>>,
    rx: Option<mpsc::UnboundedReceiver<Feed>>,
}

/// In-process transport: one unbounded channel per session, FIFO.
///
/// Producers obtain a sender with [`ChannelTransport::sender`];
/// [`ChannelTransport::close`] plays the part of a server-side close.
#[derive(Default)]
pub struct ChannelTransport {
    channels: Mutex<HashMap<SessionId, Channel>>,
    refuse_open: AtomicBool,
    opens: AtomicUsize,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sender feeding `session`, created on first use.
    pub fn sender(&self, session: &SessionId) -> mpsc::UnboundedSender<Feed> {
        let mut channels = self.channels.lock();
        let channel = channels.entry(session.clone()).or_default();
        match &channel.tx {
            Some(tx) => tx.clone(),
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                channel.tx = Some(tx.clone());
                channel.rx = Some(rx);
                tx
            }
        }
    }

    /// Drop the transport's own sender so the stream ends once every
    /// producer handle is gone.
    pub fn close(&self, session: &SessionId) {
        if let Some(channel) = self.channels.lock().get_mut(session) {
            channel.tx = None;
        }
    }

    /// Make subsequent `open` calls fail.
    pub fn set_refuse_open(&self, refuse: bool) {
        self.refuse_open.store(refuse, Ordering::SeqCst);
    }

    /// Number of successful `open` calls so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamTransport for ChannelTransport {
    async fn open(&self, session: &SessionId) -> Result<EventStream> {
        if self.refuse_open.load(Ordering::SeqCst) {
            return Err(StudioError::Stream {
                reason: format!("channel for {} refused", session),
            });
        }

        let mut rx = {
            let mut channels = self.channels.lock();
            let channel = channels.entry(session.clone()).or_default();
            match channel.rx.take() {
                Some(rx) => rx,
                None => {
                    // Reopening a consumed session starts a new channel
                    let (tx, rx) = mpsc::unbounded_channel();
                    channel.tx = Some(tx);
                    rx
                }
            }
        };
        self.opens.fetch_add(1, Ordering::SeqCst);

        Ok(Box::pin(async_stream::stream! {
            while let Some(item) = rx.recv().await {
                yield item;
            }
        }))
    }
}
