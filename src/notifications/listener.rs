use futures_util::{SinkExt, StreamExt};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::log::{Notification, NotificationLog};

/// Appended when the gateway closes the socket.
pub const CLOSED_MESSAGE: &str = "WebSocket connection closed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Disconnected,
    Connecting,
    Authenticated,
}

/// Background task holding the notification WebSocket for one session.
///
/// The socket is authenticated with a single `{"jwt": ...}` frame, then every
/// inbound frame is appended to the log. An error or close appends one
/// failure record and ends the task; there is no reconnect. Calling
/// [`shutdown`](Self::shutdown) or dropping the handle stops the task without
/// touching the log.
#[derive(Debug)]
pub struct NotificationListener {
    state: watch::Receiver<ListenerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl NotificationListener {
    /// Start listening. Must be called from within a tokio runtime.
    pub fn spawn(url: impl Into<String>, token: impl Into<String>, log: NotificationLog) -> Self {
        let (state_tx, state_rx) = watch::channel(ListenerState::Connecting);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run(url.into(), token.into(), log, state_tx, shutdown_rx));
        Self {
            state: state_rx,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// True once the task has exited, for whatever reason.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait until the listener reaches `target`. Returns false if the task
    /// ended in another state.
    pub async fn wait_for(&self, target: ListenerState) -> bool {
        let mut rx = self.state.clone();
        rx.wait_for(|state| *state == target).await.is_ok()
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for NotificationListener {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn run(
    url: String,
    token: String,
    log: NotificationLog,
    state: watch::Sender<ListenerState>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    debug!(%url, "connecting to notifications");

    let connected = tokio::select! {
        result = connect_async(url.as_str()) => result,
        _ = &mut shutdown_rx => {
            state.send_replace(ListenerState::Disconnected);
            return;
        }
    };

    let socket = match connected {
        Ok((socket, _response)) => socket,
        Err(e) => {
            warn!(error = %e, "notification socket failed to connect");
            log.push(Notification::failure(format!("WebSocket Error: {e}")))
                .await;
            state.send_replace(ListenerState::Disconnected);
            return;
        }
    };

    let (mut write, mut read) = socket.split();
    let subscribe = serde_json::json!({ "jwt": token }).to_string();
    if let Err(e) = write.send(Message::text(subscribe)).await {
        warn!(error = %e, "failed to send notification subscription");
        log.push(Notification::failure(format!("WebSocket Error: {e}")))
            .await;
        state.send_replace(ListenerState::Disconnected);
        return;
    }
    state.send_replace(ListenerState::Authenticated);
    info!("notification listener subscribed");

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                // Best-effort close frame
                let _ = write.send(Message::Close(None)).await;
                debug!("notification listener stopped by session");
                break;
            }

            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    log.push(Notification::decode(text.as_str())).await;
                }
                Some(Ok(Message::Binary(bytes))) => {
                    log.push(Notification::decode(&String::from_utf8_lossy(&bytes))).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("notification socket closed by gateway");
                    log.push(Notification::failure(CLOSED_MESSAGE)).await;
                    break;
                }
                Some(Ok(_)) => {
                    // Ping/Pong are answered by tungstenite itself
                }
                Some(Err(e)) => {
                    warn!(error = %e, "notification socket error");
                    log.push(Notification::failure(format!("WebSocket Error: {e}"))).await;
                    break;
                }
            }
        }
    }

    state.send_replace(ListenerState::Disconnected);
}
