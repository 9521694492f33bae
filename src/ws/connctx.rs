use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique id of one live link
pub type ConnectionId = Uuid;

/// Outbound payloads are shared between every member they are fanned out to.
pub type Outbound = Arc<str>;

/// Who is on the other end of a connection
#[derive(Clone, Debug)]
pub struct ConnCtx {
    pub id: ConnectionId,
    pub username: String,
    pub session_id: String,
}

impl ConnCtx {
    /// `session_id` falls back to a fresh UUID when the client did not supply one.
    pub fn new(username: impl Into<String>, session_id: Option<String>) -> Self {
        let session_id = session_id
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            session_id,
        }
    }
}

/// A connection as the hub sees it: identity plus the producer side of its outbound queue.
#[derive(Debug)]
pub struct Member {
    pub ctx: ConnCtx,
    pub outbound: mpsc::Sender<Outbound>,
}

impl Member {
    /// Create a member and the receiving end of its bounded outbound queue.
    pub fn channel(ctx: ConnCtx, capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (outbound, rx) = mpsc::channel(capacity);
        (Self { ctx, outbound }, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.ctx.id
    }

    /// Non-blocking enqueue; false when the queue is full or its consumer is gone.
    pub fn try_enqueue(&self, msg: &Outbound) -> bool {
        self.outbound.try_send(msg.clone()).is_ok()
    }
}
