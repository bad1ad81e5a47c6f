//! Realtime change channel over a Phoenix WebSocket.

use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::error::SyncError;
use super::protocol::{topic_for, PhoenixMessage};
use super::remote::Subscription;
use crate::models::ClassData;
use crate::share::ShareCode;

const JOIN_TIMEOUT: Duration = Duration::from_secs(10);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
const JOIN_REF: &str = "1";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Opens a channel for `code` and returns once the server has confirmed it.
pub(crate) async fn subscribe(ws_url: &str, code: &ShareCode) -> Result<Subscription, SyncError> {
    let (ws_stream, _) = connect_async(ws_url)
        .await
        .map_err(|e| SyncError::Unreachable(e.to_string()))?;
    let (mut sender, mut receiver) = ws_stream.split();

    let topic = topic_for(code);
    send_frame(&mut sender, &PhoenixMessage::join(&topic, code, JOIN_REF)).await?;

    timeout(JOIN_TIMEOUT, wait_for_join(&mut receiver, &topic))
        .await
        .map_err(|_| SyncError::JoinTimeout)??;
    info!("Listening for changes to class {}", code);

    let (updates, updates_rx) = mpsc::unbounded_channel();
    let listener = tokio::spawn(listen(sender, receiver, topic, updates));
    Ok(Subscription::new(code.clone(), updates_rx, Some(listener)))
}

async fn send_frame(sender: &mut WsSink, frame: &PhoenixMessage) -> Result<(), SyncError> {
    let text = frame
        .encode()
        .map_err(|e| SyncError::Channel(e.to_string()))?;
    sender
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| SyncError::Channel(e.to_string()))
}

async fn wait_for_join(receiver: &mut WsSource, topic: &str) -> Result<(), SyncError> {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let frame = PhoenixMessage::decode(text.as_str())
                    .map_err(|e| SyncError::Decode(e.to_string()))?;
                if frame.topic != topic || frame.reference.as_deref() != Some(JOIN_REF) {
                    continue;
                }
                return match frame.reply_status() {
                    Some("ok") => Ok(()),
                    _ => Err(SyncError::Channel(format!(
                        "join rejected: {}",
                        frame.payload
                    ))),
                };
            }
            Ok(Message::Close(_)) => {
                return Err(SyncError::Channel(
                    "server closed connection during join".to_string(),
                ));
            }
            Ok(_) => {}
            Err(e) => return Err(SyncError::Channel(e.to_string())),
        }
    }

    Err(SyncError::Channel(
        "connection closed before join completed".to_string(),
    ))
}

/// Forwards snapshots until the socket closes or the subscription is dropped.
async fn listen(
    mut sender: WsSink,
    mut receiver: WsSource,
    topic: String,
    updates: mpsc::UnboundedSender<ClassData>,
) {
    let mut heartbeat = interval(HEARTBEAT_INTERVAL);
    // First tick completes immediately
    heartbeat.tick().await;
    let mut next_ref: u64 = 2;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                let frame = PhoenixMessage::heartbeat(&next_ref.to_string());
                next_ref += 1;
                if let Err(e) = send_frame(&mut sender, &frame).await {
                    warn!("Heartbeat on {} failed: {}", topic, e);
                    break;
                }
            }
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => match snapshot_from(text.as_str(), &topic) {
                    Ok(Some(snapshot)) => {
                        if updates.send(snapshot).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Ignoring unreadable change on {}: {}", topic, e),
                },
                Some(Ok(Message::Ping(data))) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Change channel {} closed by server", topic);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Change channel {} failed: {}", topic, e);
                    break;
                }
            },
            _ = updates.closed() => {
                let leave = PhoenixMessage::leave(&topic, &next_ref.to_string());
                let _ = send_frame(&mut sender, &leave).await;
                break;
            }
        }
    }

    debug!("Stopped listening on {}", topic);
    let _ = sender.send(Message::Close(None)).await;
}

fn snapshot_from(text: &str, topic: &str) -> Result<Option<ClassData>, SyncError> {
    let frame = PhoenixMessage::decode(text).map_err(|e| SyncError::Decode(e.to_string()))?;
    if frame.topic != topic {
        return Ok(None);
    }
    frame
        .changed_snapshot()
        .map_err(|e| SyncError::Decode(e.to_string()))
}
