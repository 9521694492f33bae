use std::collections::BTreeSet;
use std::sync::{Mutex, OnceLock};

use axum::{extract::State, Json};
use sysinfo::System;
use tracing::{info, warn};

use crate::models::{DiagnosticsResponse, RoomDiagnostics};
use crate::AppState;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Open rooms, live connections and process-wide resource figures
pub async fn diagnostics(State(state): State<AppState>) -> Json<DiagnosticsResponse> {
    let mut rooms = Vec::new();
    let mut online = BTreeSet::new();
    let mut n_conn: u32 = 0;

    for hub in state.registry.rooms() {
        match hub.snapshot().await {
            Ok(snapshot) => {
                n_conn += snapshot.members as u32;
                online.extend(snapshot.users.iter().cloned());
                rooms.push(RoomDiagnostics {
                    room_id: snapshot.room_id,
                    n_conn: snapshot.members as u32,
                    users: snapshot.users,
                    font_size: snapshot.font_size,
                    text_len: snapshot.text_len as u64,
                });
            }
            Err(e) => warn!("Skipping room in diagnostics: {}", e),
        }
    }
    rooms.sort_by(|a, b| a.room_id.cmp(&b.room_id));

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| Mutex::new(System::new_all()));
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0),
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB (Free: {} MB), Conn: {}, Rooms: {}",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        memory_free / 1024 / 1024,
        n_conn,
        rooms.len()
    );

    Json(DiagnosticsResponse {
        n_rooms: rooms.len() as u32,
        n_conn,
        n_users: online.len() as u32,
        rooms,
        cpu_usage,
        memory_alloc,
        memory_total,
        memory_free,
    })
}
