//! One client's live link: an inbound loop feeding the hub and an outbound
//! loop draining the connection's private queue.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant};
use tracing::{debug, error, info, warn};

use super::connctx::{ConnCtx, Member, Outbound};
use super::hub::{HubClosed, HubHandle};

#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub queue_capacity: usize,
    pub ping_interval: Duration,
    pub idle_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            ping_interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(75),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Read failed: {0}")]
    Read(axum::Error),
    #[error("Write failed: {0}")]
    Write(axum::Error),
    #[error("No frame received within {0:?}")]
    IdleTimeout(Duration),
    #[error(transparent)]
    HubClosed(#[from] HubClosed),
}

/// Register a freshly upgraded socket with `hub` and run it until either side ends.
pub async fn serve(socket: WebSocket, ctx: ConnCtx, hub: HubHandle, settings: ConnectionSettings) {
    let (member, outbound) = Member::channel(ctx.clone(), settings.queue_capacity);
    // Unregister however this function exits.
    let _guard = hub.unregister_on_drop(ctx.id);

    if let Err(e) = hub.register(member).await {
        error!(conn_id = %ctx.id, "Failed to register connection: {}", e);
        return;
    }

    let (sink, stream) = socket.split();
    let mut write_task = tokio::spawn(write_loop(sink, outbound, settings.ping_interval));
    let mut read_task = tokio::spawn(read_loop(stream, hub.clone(), settings.idle_timeout));

    // Wait for either task to finish (and finish the other)
    let result = tokio::select! {
        r = &mut write_task => { read_task.abort(); r }
        r = &mut read_task => { write_task.abort(); r }
    };

    match result {
        Ok(Ok(())) => info!(
            room = %hub.room_id(),
            conn_id = %ctx.id,
            username = %ctx.username,
            "WebSocket connection closed"
        ),
        Ok(Err(TransportError::IdleTimeout(after))) => warn!(
            room = %hub.room_id(),
            conn_id = %ctx.id,
            "Dropping idle connection after {:?}",
            after
        ),
        Ok(Err(e)) => debug!(room = %hub.room_id(), conn_id = %ctx.id, "WebSocket connection ended: {}", e),
        Err(e) => error!(room = %hub.room_id(), conn_id = %ctx.id, "Connection task failed: {}", e),
    }
}

/// Drain the outbound queue onto the transport in order, pinging while idle.
///
/// A closed queue means the hub dropped this connection: send a close frame and stop.
pub async fn write_loop<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<Outbound>,
    ping_interval: Duration,
) -> Result<(), TransportError>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let mut ping = interval_at(Instant::now() + ping_interval, ping_interval);

    loop {
        tokio::select! {
            msg = outbound.recv() => match msg {
                Some(msg) => sink
                    .send(Message::Text(msg.to_string()))
                    .await
                    .map_err(TransportError::Write)?,
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return Ok(());
                }
            },
            _ = ping.tick() => {
                sink.send(Message::Ping(Vec::new()))
                    .await
                    .map_err(TransportError::Write)?;
            }
        }
    }
}

/// Forward every text frame to the hub until the peer closes, errors or goes quiet.
pub async fn read_loop<R>(
    mut stream: R,
    hub: HubHandle,
    idle_timeout: Duration,
) -> Result<(), TransportError>
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        let frame = match timeout(idle_timeout, stream.next()).await {
            Err(_) => return Err(TransportError::IdleTimeout(idle_timeout)),
            Ok(None) => return Ok(()),
            Ok(Some(Err(e))) => return Err(TransportError::Read(e)),
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            Message::Text(text) => hub.broadcast(text).await?,
            Message::Close(_) => return Ok(()),
            // axum answers pings itself; any frame counts as liveness.
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Binary(bytes) => {
                debug!(room = %hub.room_id(), len = bytes.len(), "Ignoring binary frame");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DocumentStore;
    use crate::ws::hub::{Hub, HubSettings};
    use futures_util::{sink, stream};

    // Sink that appends every frame to `written`.
    fn recording_sink(
        written: &mut Vec<Message>,
    ) -> impl Sink<Message, Error = axum::Error> + '_ {
        sink::unfold(written, |written, msg: Message| async move {
            written.push(msg);
            Ok::<_, axum::Error>(written)
        })
    }

    fn hub() -> (tempfile::TempDir, HubHandle) {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("room.txt"));
        let hub = Hub::spawn("conn-test", store, &HubSettings::default());
        (dir, hub)
    }

    #[tokio::test]
    async fn write_loop_preserves_order_and_closes_when_queue_closes() {
        let (tx, rx) = mpsc::channel::<Outbound>(8);
        for i in 0..5 {
            tx.try_send(format!("m{i}").into()).unwrap();
        }
        drop(tx);

        let mut written: Vec<Message> = Vec::new();
        {
            let sink = recording_sink(&mut written);
            futures_util::pin_mut!(sink);
            write_loop(sink, rx, Duration::from_secs(60)).await.unwrap();
        }

        let texts: Vec<_> = written
            .iter()
            .filter_map(|m| match m {
                Message::Text(t) => Some(t.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["m0", "m1", "m2", "m3", "m4"]);
        assert!(matches!(written.last(), Some(Message::Close(None))));
    }

    #[tokio::test]
    async fn write_loop_pings_an_idle_link() {
        let (tx, rx) = mpsc::channel::<Outbound>(8);
        let mut written: Vec<Message> = Vec::new();
        {
            let sink = recording_sink(&mut written);
            futures_util::pin_mut!(sink);
            let writer = write_loop(sink, rx, Duration::from_millis(20));
            let closer = async {
                tokio::time::sleep(Duration::from_millis(75)).await;
                drop(tx);
            };
            let (result, ()) = tokio::join!(writer, closer);
            result.unwrap();
        }

        assert!(written.iter().any(|m| matches!(m, Message::Ping(_))));
    }

    #[tokio::test]
    async fn read_loop_forwards_text_and_stops_on_close() {
        let (_dir, hub) = hub();
        let (member, mut rx) = Member::channel(ConnCtx::new("alice", None), 16);
        hub.register(member).await.unwrap();

        let frames = stream::iter(vec![
            Ok(Message::Text(r#"{"type":"fontSize","fontSize":20}"#.to_string())),
            Ok(Message::Binary(vec![1, 2, 3])),
            Ok(Message::Pong(Vec::new())),
            Ok(Message::Close(None)),
            Ok(Message::Text("never forwarded".to_string())),
        ]);
        read_loop(frames, hub.clone(), Duration::from_secs(5)).await.unwrap();

        assert_eq!(hub.snapshot().await.unwrap().font_size, 20);
        let mut seen = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            seen.push(msg.to_string());
        }
        assert!(seen.iter().any(|m| m.contains(r#""fontSize":20"#)));
        assert!(!seen.iter().any(|m| m.contains("never forwarded")));
    }

    #[tokio::test]
    async fn read_loop_times_out_on_silence() {
        let (_dir, hub) = hub();
        let silent = stream::pending::<Result<Message, axum::Error>>();

        let err = read_loop(silent, hub, Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::IdleTimeout(_)));
    }

    #[tokio::test]
    async fn read_loop_ends_cleanly_when_stream_ends() {
        let (_dir, hub) = hub();
        let empty = stream::iter(Vec::<Result<Message, axum::Error>>::new());

        assert!(read_loop(empty, hub, Duration::from_secs(1)).await.is_ok());
    }
}
