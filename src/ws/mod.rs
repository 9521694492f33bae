pub mod connctx;
pub mod connection;
pub mod hub;
pub mod presence;
pub mod registry;

pub use connctx::{ConnCtx, ConnectionId, Member};
pub use hub::{Hub, HubClosed, HubHandle, HubSettings, HubSnapshot};
pub use registry::{HubRegistry, InvalidRoomId};
