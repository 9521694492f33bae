use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Live state of one open room
#[derive(Serialize, Deserialize, ToSchema)]
pub struct RoomDiagnostics {
    pub room_id: String,
    pub n_conn: u32,
    pub users: Vec<String>,
    pub font_size: i64,
    pub text_len: u64,
}

/// Response for diagnostics information
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DiagnosticsResponse {
    pub n_rooms: u32,
    pub n_conn: u32,
    pub n_users: u32,
    pub rooms: Vec<RoomDiagnostics>,
    pub cpu_usage: f32,
    pub memory_alloc: u64,
    pub memory_total: u64,
    pub memory_free: u64,
}
