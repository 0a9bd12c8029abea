//! WebSocket subscriber for a project's push stream.

use crate::retry::{Backoff, RetryPolicy};

use studio_core::PushMessage;

use futures::StreamExt;
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type PushStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Disconnect {
    /// Socket closed or errored; reconnect
    Remote,
    /// Nobody is listening any more; stop
    ReceiverGone,
}

/// Connects to `{url}/projects/{id}/events` and forwards every message for
/// the project into a channel, reconnecting with backoff.
///
/// Stops when the receiving end is dropped or the retry budget runs out
/// without a single successful connection in between.
#[derive(Debug, Clone)]
pub struct PushChannel {
    project_id: String,
    endpoint: String,
    policy: RetryPolicy,
}

impl PushChannel {
    pub fn new(push_url: &str, project_id: &str, policy: RetryPolicy) -> Self {
        Self {
            project_id: project_id.to_string(),
            endpoint: format!(
                "{}/projects/{}/events",
                push_url.trim_end_matches('/'),
                project_id
            ),
            policy,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn spawn(self, tx: mpsc::Sender<PushMessage>) -> JoinHandle<()> {
        tokio::spawn(self.run(tx))
    }

    pub async fn run(self, tx: mpsc::Sender<PushMessage>) {
        let mut backoff = Backoff::new(self.policy.clone());

        loop {
            if tx.is_closed() {
                return;
            }

            match connect_async(self.endpoint.as_str()).await {
                Ok((stream, _)) => {
                    info!("Push channel connected for {}", self.project_id);
                    backoff.reset();
                    match self.pump(stream, &tx).await {
                        Disconnect::ReceiverGone => return,
                        Disconnect::Remote => {
                            info!("Push channel for {} disconnected", self.project_id)
                        }
                    }
                }
                Err(e) => warn!(
                    "Push channel connect for {} failed (attempt {}): {e}",
                    self.project_id,
                    backoff.attempts() + 1
                ),
            }

            if backoff.is_exhausted() {
                warn!(
                    "Push channel for {} giving up after {} attempts",
                    self.project_id,
                    backoff.attempts() + 1
                );
                return;
            }

            let delay = backoff.next_delay();
            debug!("Reconnecting push channel in {delay:?}");
            tokio::select! {
                _ = sleep(delay) => {}
                _ = tx.closed() => return,
            }
        }
    }

    async fn pump(&self, mut stream: PushStream, tx: &mpsc::Sender<PushMessage>) -> Disconnect {
        loop {
            let frame = tokio::select! {
                frame = stream.next() => frame,
                _ = tx.closed() => return Disconnect::ReceiverGone,
            };

            match frame {
                Some(Ok(Message::Text(text))) => match PushMessage::parse(&text) {
                    Ok(message) if message.is_for(&self.project_id) => {
                        if tx.send(message).await.is_err() {
                            return Disconnect::ReceiverGone;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => debug!("Ignoring push frame: {e}"),
                },
                Some(Ok(Message::Close(_))) | None => return Disconnect::Remote,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Push channel for {} errored: {e}", self.project_id);
                    return Disconnect::Remote;
                }
            }
        }
    }
}
