//! Activity Stream Client
//!
//! Holds at most one live channel. State machine:
//!
//! ```text
//! Disconnected --connect--> Connecting --open--> Connected
//!      ^                        |                    |
//!      +---- disconnect() / server close / error ----+
//! ```
//!
//! Errors land in [`StreamStatus::Error`]; nothing is returned to the
//! caller, and there is no automatic reconnect. Every session gets a
//! generation number so events from a torn-down channel are dropped.

use futures::StreamExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::event::ActivityEvent;
use super::transport::StreamTransport;
use crate::agent::SessionId;

const BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl StreamStatus {
    /// Connecting or connected
    pub fn is_live(&self) -> bool {
        matches!(self, StreamStatus::Connecting | StreamStatus::Connected)
    }
}

impl std::fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamStatus::Disconnected => write!(f, "disconnected"),
            StreamStatus::Connecting => write!(f, "connecting"),
            StreamStatus::Connected => write!(f, "connected"),
            StreamStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Default)]
struct StreamState {
    session: Option<SessionId>,
    generation: u64,
    status: StreamStatus,
    events: Vec<ActivityEvent>,
    cancel: Option<CancellationToken>,
    pump: Option<JoinHandle<()>>,
}

impl StreamState {
    fn stop_pump(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

struct Shared {
    state: Mutex<StreamState>,
    status_tx: watch::Sender<StreamStatus>,
    events_tx: broadcast::Sender<ActivityEvent>,
}

impl Shared {
    fn set_status(&self, state: &mut StreamState, status: StreamStatus) {
        state.status = status;
        self.status_tx.send_replace(status);
    }

    /// Apply `status` if `generation` is still current.
    fn transition(&self, generation: u64, status: StreamStatus) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }
        self.set_status(&mut state, status);
        if !status.is_live() {
            state.cancel = None;
            state.pump = None;
        }
        true
    }

    /// Append an event if `generation` is still current and connected.
    fn append(&self, generation: u64, event: ActivityEvent) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation || state.status != StreamStatus::Connected {
            return false;
        }
        state.events.push(event.clone());
        // No subscribers is fine
        let _ = self.events_tx.send(event);
        true
    }
}

/// Live progress feed for one in-flight generation.
///
/// Cloning yields another handle to the same feed. `connect` spawns onto
/// the current tokio runtime.
pub struct ActivityStreamClient<T: StreamTransport> {
    transport: Arc<T>,
    shared: Arc<Shared>,
}

impl<T: StreamTransport> Clone for ActivityStreamClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<T: StreamTransport> ActivityStreamClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_transport(Arc::new(transport))
    }

    pub fn with_transport(transport: Arc<T>) -> Self {
        let (status_tx, _) = watch::channel(StreamStatus::Disconnected);
        let (events_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            transport,
            shared: Arc::new(Shared {
                state: Mutex::new(StreamState::default()),
                status_tx,
                events_tx,
            }),
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Open the channel for `session`.
    ///
    /// A no-op while the same session is connecting or connected. Any other
    /// call tears down the previous channel and clears the event log.
    pub fn connect(&self, session: SessionId) {
        let mut state = self.shared.state.lock();

        if state.session.as_ref() == Some(&session) && state.status.is_live() {
            crate::debug_log!("Activity stream already open for {}", session);
            return;
        }

        state.stop_pump();
        state.generation += 1;
        let generation = state.generation;
        state.session = Some(session.clone());
        state.events.clear();
        self.shared.set_status(&mut state, StreamStatus::Connecting);

        let cancel = CancellationToken::new();
        state.cancel = Some(cancel.clone());
        state.pump = Some(tokio::spawn(pump(
            self.transport.clone(),
            self.shared.clone(),
            session,
            generation,
            cancel,
        )));
    }

    /// Close the channel. Later events for the session are dropped; the
    /// event log stays readable until the next `connect`.
    pub fn disconnect(&self) {
        let mut state = self.shared.state.lock();
        state.stop_pump();
        state.generation += 1;
        if let Some(session) = state.session.take() {
            crate::debug_log!("Activity stream closed for {}", session);
        }
        self.shared.set_status(&mut state, StreamStatus::Disconnected);
    }

    /// Disconnect after `delay`, unless a newer session has started by then.
    pub fn disconnect_after(&self, delay: Duration) -> JoinHandle<()> {
        let generation = self.shared.state.lock().generation;
        let client = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if client.shared.state.lock().generation == generation {
                client.disconnect();
            }
        })
    }

    /// Snapshot of the event log, in arrival order.
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.shared.state.lock().events.clone()
    }

    pub fn status(&self) -> StreamStatus {
        self.shared.state.lock().status
    }

    pub fn is_connected(&self) -> bool {
        self.status() == StreamStatus::Connected
    }

    pub fn session(&self) -> Option<SessionId> {
        self.shared.state.lock().session.clone()
    }

    /// Events appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ActivityEvent> {
        self.shared.events_tx.subscribe()
    }

    pub fn watch_status(&self) -> watch::Receiver<StreamStatus> {
        self.shared.status_tx.subscribe()
    }
}

async fn pump<T: StreamTransport>(
    transport: Arc<T>,
    shared: Arc<Shared>,
    session: SessionId,
    generation: u64,
    cancel: CancellationToken,
) {
    let opened = tokio::select! {
        _ = cancel.cancelled() => return,
        opened = transport.open(&session) => opened,
    };

    let mut stream = match opened {
        Ok(stream) => stream,
        Err(err) => {
            crate::warn_log!("Activity stream for {} failed to open: {}", session, err);
            shared.transition(generation, StreamStatus::Error);
            return;
        }
    };

    if !shared.transition(generation, StreamStatus::Connected) {
        return;
    }
    crate::debug_log!("Activity stream connected for {}", session);

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return,
            next = stream.next() => next,
        };

        match next {
            Some(Ok(event)) => {
                if !shared.append(generation, event) {
                    return;
                }
            }
            Some(Err(err)) => {
                crate::warn_log!("Activity stream for {} dropped: {}", session, err);
                shared.transition(generation, StreamStatus::Error);
                return;
            }
            None => {
                crate::debug_log!("Activity stream for {} closed by server", session);
                shared.transition(generation, StreamStatus::Disconnected);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudioError;
    use crate::stream::event::EventKind;
    use crate::stream::transport::ChannelTransport;

    fn client() -> ActivityStreamClient<ChannelTransport> {
        ActivityStreamClient::new(ChannelTransport::new())
    }

    fn event(message: &str) -> crate::error::Result<ActivityEvent> {
        Ok(ActivityEvent::new(EventKind::Progress, message))
    }

    async fn wait_until<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    /// Give the pump a chance to run without waiting on a condition.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    fn messages(client: &ActivityStreamClient<ChannelTransport>) -> Vec<String> {
        client.events().into_iter().map(|e| e.message).collect()
    }

    #[tokio::test]
    async fn test_connect_delivers_events_in_order() {
        let client = client();
        let session = SessionId::generate("coord");
        assert_eq!(client.status(), StreamStatus::Disconnected);

        client.connect(session.clone());
        assert_eq!(client.status(), StreamStatus::Connecting);
        wait_until(|| client.is_connected()).await;

        let tx = client.transport().sender(&session);
        for message in ["planning", "writing", "rendering"] {
            tx.send(event(message)).unwrap();
        }

        wait_until(|| client.events().len() == 3).await;
        assert_eq!(messages(&client), vec!["planning", "writing", "rendering"]);
        assert_eq!(client.session(), Some(session));
    }

    #[tokio::test]
    async fn test_new_session_resets_log() {
        let client = client();
        let first = SessionId::generate("coord");
        let second = SessionId::generate("coord");

        client.connect(first.clone());
        wait_until(|| client.is_connected()).await;
        client.transport().sender(&first).send(event("old")).unwrap();
        wait_until(|| client.events().len() == 1).await;

        client.connect(second.clone());
        assert!(client.events().is_empty());
        assert_eq!(client.session(), Some(second.clone()));

        // Late traffic on the first session is ignored
        let _ = client.transport().sender(&first).send(event("stale"));
        wait_until(|| client.is_connected()).await;
        settle().await;
        assert!(client.events().is_empty());

        client.transport().sender(&second).send(event("fresh")).unwrap();
        wait_until(|| client.events().len() == 1).await;
        assert_eq!(messages(&client), vec!["fresh"]);
    }

    #[tokio::test]
    async fn test_back_to_back_connects() {
        let client = client();
        let first = SessionId::generate("coord");
        let second = SessionId::generate("coord");

        client.connect(first);
        client.connect(second.clone());

        assert!(client.events().is_empty());
        assert_eq!(client.session(), Some(second));
        wait_until(|| client.is_connected()).await;
    }

    #[tokio::test]
    async fn test_same_session_connect_is_idempotent() {
        let client = client();
        let session = SessionId::generate("coord");

        client.connect(session.clone());
        wait_until(|| client.is_connected()).await;
        client.transport().sender(&session).send(event("once")).unwrap();
        wait_until(|| client.events().len() == 1).await;

        client.connect(session.clone());
        settle().await;

        assert_eq!(client.transport().open_count(), 1);
        assert_eq!(messages(&client), vec!["once"]);
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_drops_later_events() {
        let client = client();
        let session = SessionId::generate("coord");
        let mut status = client.watch_status();

        client.connect(session.clone());
        wait_until(|| client.is_connected()).await;
        let tx = client.transport().sender(&session);
        tx.send(event("kept")).unwrap();
        wait_until(|| client.events().len() == 1).await;

        client.disconnect();
        assert_eq!(client.status(), StreamStatus::Disconnected);
        assert!(!client.is_connected());
        assert!(client.session().is_none());
        assert_eq!(*status.borrow_and_update(), StreamStatus::Disconnected);

        let _ = tx.send(event("dropped"));
        settle().await;
        assert_eq!(messages(&client), vec!["kept"]);
    }

    #[tokio::test]
    async fn test_open_failure_sets_error_without_panicking() {
        let transport = ChannelTransport::new();
        transport.set_refuse_open(true);
        let client = ActivityStreamClient::new(transport);

        client.connect(SessionId::generate("coord"));
        wait_until(|| client.status() == StreamStatus::Error).await;
        assert!(client.events().is_empty());
    }

    #[tokio::test]
    async fn test_stream_error_and_server_close() {
        let client = client();
        let session = SessionId::generate("coord");
        client.connect(session.clone());
        wait_until(|| client.is_connected()).await;

        let tx = client.transport().sender(&session);
        tx.send(event("before")).unwrap();
        tx.send(Err(StudioError::Stream {
            reason: "reset by peer".to_string(),
        }))
        .unwrap();
        wait_until(|| client.status() == StreamStatus::Error).await;
        assert_eq!(messages(&client), vec!["before"]);

        let other = SessionId::generate("coord");
        client.connect(other.clone());
        wait_until(|| client.is_connected()).await;
        client.transport().close(&other);
        wait_until(|| client.status() == StreamStatus::Disconnected).await;
    }

    #[tokio::test]
    async fn test_reconnect_same_session_after_drop() {
        let client = client();
        let session = SessionId::generate("coord");
        client.connect(session.clone());
        wait_until(|| client.is_connected()).await;

        let tx = client.transport().sender(&session);
        tx.send(event("before drop")).unwrap();
        tx.send(Err(StudioError::Stream {
            reason: "reset by peer".to_string(),
        }))
        .unwrap();
        wait_until(|| client.status() == StreamStatus::Error).await;
        assert_eq!(messages(&client), vec!["before drop"]);

        client.connect(session.clone());
        assert!(client.events().is_empty());
        wait_until(|| client.is_connected()).await;
        assert_eq!(client.transport().open_count(), 2);

        client.transport().sender(&session).send(event("again")).unwrap();
        wait_until(|| client.events().len() == 1).await;
        assert_eq!(messages(&client), vec!["again"]);
        assert_eq!(client.session(), Some(session));
    }

    #[tokio::test]
    async fn test_disconnect_after_respects_newer_session() {
        let client = client();
        client.connect(SessionId::generate("coord"));
        wait_until(|| client.is_connected()).await;

        let pending = client.disconnect_after(Duration::from_millis(10));
        let newer = SessionId::generate("coord");
        client.connect(newer.clone());
        pending.await.unwrap();

        assert_eq!(client.session(), Some(newer));
        wait_until(|| client.is_connected()).await;

        client
            .disconnect_after(Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(client.status(), StreamStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_subscribers_see_events() {
        let client = client();
        let session = SessionId::generate("coord");
        let mut feed = client.subscribe();

        client.connect(session.clone());
        wait_until(|| client.is_connected()).await;
        let tx = client.transport().sender(&session);
        tx.send(event("a")).unwrap();
        tx.send(event("b")).unwrap();

        assert_eq!(feed.recv().await.unwrap().message, "a");
        assert_eq!(feed.recv().await.unwrap().message, "b");
    }
}
