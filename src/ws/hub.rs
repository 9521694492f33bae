//! Per-room session hub.
//!
//! Every mutation of a room's membership, presence roster, font size and text
//! happens inside one control task that handles events one at a time in
//! arrival order. Connections talk to it through a [`HubHandle`]; the hub only
//! ever talks back through non-blocking enqueues onto their outbound queues.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::db::DocumentStore;
use crate::models::messages::{
    FontSizeMessage, ReceivedMessage, SendMessage, StartTimeMessage, TextMessage, UsersMessage,
};

use super::connctx::{ConnectionId, Member, Outbound};
use super::presence::Presence;

/// Tunables shared by every hub.
#[derive(Debug, Clone)]
pub struct HubSettings {
    pub event_capacity: usize,
    pub default_font_size: i64,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            event_capacity: 1024,
            default_font_size: 16,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Hub for room {0} is closed")]
pub struct HubClosed(pub String);

/// Read-only view of a hub's state.
#[derive(Debug, Clone, Serialize)]
pub struct HubSnapshot {
    pub room_id: String,
    pub members: usize,
    pub users: Vec<String>,
    pub font_size: i64,
    pub start_time: DateTime<Utc>,
    pub text_len: usize,
}

#[derive(Debug)]
enum HubEvent {
    Register(Member),
    Unregister(ConnectionId),
    Broadcast(String),
    Snapshot(oneshot::Sender<HubSnapshot>),
}

/// Cloneable address of a running hub.
#[derive(Debug, Clone)]
pub struct HubHandle {
    room_id: Arc<str>,
    events: mpsc::Sender<HubEvent>,
}

impl HubHandle {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Add a connection; it is greeted before it sees any other traffic.
    pub async fn register(&self, member: Member) -> Result<(), HubClosed> {
        self.send(HubEvent::Register(member)).await
    }

    pub async fn unregister(&self, id: ConnectionId) -> Result<(), HubClosed> {
        self.send(HubEvent::Unregister(id)).await
    }

    /// Fan a raw client frame out to every member, then apply it to hub state.
    pub async fn broadcast(&self, raw: String) -> Result<(), HubClosed> {
        self.send(HubEvent::Broadcast(raw)).await
    }

    pub async fn snapshot(&self) -> Result<HubSnapshot, HubClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(HubEvent::Snapshot(tx)).await?;
        rx.await.map_err(|_| self.closed())
    }

    /// Guard that unregisters `id` when dropped, even if the owning task is aborted.
    pub fn unregister_on_drop(&self, id: ConnectionId) -> UnregisterGuard {
        UnregisterGuard {
            hub: self.clone(),
            id,
        }
    }

    async fn send(&self, event: HubEvent) -> Result<(), HubClosed> {
        self.events.send(event).await.map_err(|_| self.closed())
    }

    fn closed(&self) -> HubClosed {
        HubClosed(self.room_id.to_string())
    }
}

pub struct UnregisterGuard {
    hub: HubHandle,
    id: ConnectionId,
}

impl Drop for UnregisterGuard {
    fn drop(&mut self) {
        match self.hub.events.try_send(HubEvent::Unregister(self.id)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                let events = self.hub.events.clone();
                tokio::spawn(async move {
                    let _ = events.send(event).await;
                });
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

pub struct Hub {
    room_id: String,
    store: DocumentStore,
    members: HashMap<ConnectionId, Member>,
    presence: Presence,
    text: String,
    font_size: i64,
    start_time: DateTime<Utc>,
}

impl Hub {
    /// Start the control task for a room and return its handle.
    ///
    /// The initial text is loaded from `store` inside the task; events sent
    /// meanwhile wait in the channel.
    pub fn spawn(room_id: impl Into<String>, store: DocumentStore, settings: &HubSettings) -> HubHandle {
        let room_id = room_id.into();
        let (tx, rx) = mpsc::channel(settings.event_capacity);
        let hub = Hub {
            room_id: room_id.clone(),
            store,
            members: HashMap::new(),
            presence: Presence::new(),
            text: String::new(),
            font_size: settings.default_font_size,
            start_time: Utc::now(),
        };
        tokio::spawn(hub.run(rx));

        HubHandle {
            room_id: room_id.into(),
            events: tx,
        }
    }

    async fn run(mut self, mut events: mpsc::Receiver<HubEvent>) {
        match self.store.read_or_empty().await {
            Ok(text) => self.text = text,
            Err(e) => error!(room = %self.room_id, "Failed to load document, starting empty: {}", e),
        }
        info!(room = %self.room_id, bytes = self.text.len(), "Hub started");

        while let Some(event) = events.recv().await {
            match event {
                HubEvent::Register(member) => self.register(member),
                HubEvent::Unregister(id) => self.unregister(id),
                HubEvent::Broadcast(raw) => self.broadcast(raw).await,
                HubEvent::Snapshot(reply) => {
                    let _ = reply.send(self.snapshot());
                }
            }
        }

        info!(room = %self.room_id, "Hub stopped");
    }

    fn register(&mut self, member: Member) {
        let id = member.id();
        if self.members.contains_key(&id) {
            warn!(room = %self.room_id, conn_id = %id, "Connection is already registered");
            return;
        }

        let greeting = self.greeting(&member.ctx.session_id);
        if !greeting.iter().all(|msg| member.try_enqueue(msg)) {
            // Dropping the member closes its queue.
            warn!(room = %self.room_id, conn_id = %id, "Outbound queue rejected the greeting, dropping connection");
            return;
        }

        info!(
            room = %self.room_id,
            conn_id = %id,
            username = %member.ctx.username,
            "Connection registered"
        );
        self.presence.join(&member.ctx.username);
        self.members.insert(id, member);
        self.broadcast_roster();
    }

    fn unregister(&mut self, id: ConnectionId) {
        let Some(member) = self.members.remove(&id) else {
            return;
        };
        self.presence.leave(&member.ctx.username);
        info!(
            room = %self.room_id,
            conn_id = %id,
            username = %member.ctx.username,
            "Connection unregistered"
        );
        drop(member);
        self.broadcast_roster();
    }

    async fn broadcast(&mut self, raw: String) {
        let msg: Outbound = Arc::from(raw.as_str());
        let evicted = self.fan_out(&msg);
        if self.evict(evicted) {
            self.broadcast_roster();
        }

        match ReceivedMessage::parse(&raw) {
            Some(ReceivedMessage::Text(update)) => {
                self.text = update.text;
                if let Err(e) = self.store.write(&self.text).await {
                    error!(room = %self.room_id, "Failed to persist document: {}", e);
                }
            }
            Some(ReceivedMessage::FontSize(update)) => {
                self.font_size = update.font_size as i64;
                debug!(room = %self.room_id, font_size = self.font_size, "Font size updated");
            }
            None => debug!(room = %self.room_id, "Ignoring unrecognized message"),
        }
    }

    // The roster is re-sent until a pass evicts nobody.
    fn broadcast_roster(&mut self) {
        loop {
            let roster = SendMessage::Users(UsersMessage {
                users: self.presence.users(),
            });
            let msg: Outbound = Arc::from(roster.to_json());
            let evicted = self.fan_out(&msg);
            if !self.evict(evicted) {
                break;
            }
        }
    }

    /// Enqueue onto every member, removing those whose queue would not take it.
    fn fan_out(&mut self, msg: &Outbound) -> Vec<Member> {
        let stalled: Vec<ConnectionId> = self
            .members
            .values()
            .filter(|member| !member.try_enqueue(msg))
            .map(Member::id)
            .collect();

        stalled
            .into_iter()
            .filter_map(|id| self.members.remove(&id))
            .collect()
    }

    fn evict(&mut self, evicted: Vec<Member>) -> bool {
        let any = !evicted.is_empty();
        for member in evicted {
            self.presence.leave(&member.ctx.username);
            warn!(
                room = %self.room_id,
                conn_id = %member.id(),
                username = %member.ctx.username,
                "Evicting connection with a full outbound queue"
            );
        }
        any
    }

    fn greeting(&self, session_id: &str) -> [Outbound; 3] {
        let text = SendMessage::Text(TextMessage {
            text: self.text.clone(),
            session_id: Some(session_id.to_string()),
        });
        let start_time = SendMessage::StartTime(StartTimeMessage {
            start_time: self.start_time.timestamp(),
        });
        let font_size = SendMessage::FontSize(FontSizeMessage {
            font_size: self.font_size,
        });
        [
            Arc::from(text.to_json()),
            Arc::from(start_time.to_json()),
            Arc::from(font_size.to_json()),
        ]
    }

    fn snapshot(&self) -> HubSnapshot {
        HubSnapshot {
            room_id: self.room_id.clone(),
            members: self.members.len(),
            users: self.presence.users(),
            font_size: self.font_size,
            start_time: self.start_time,
            text_len: self.text.len(),
        }
    }
}
