#![cfg_attr(test, allow(clippy::expect_used))]

//! Operator-side state for the Elara Nexus dashboard: persisted connection
//! settings, the shared API client, and the panel controllers that drive it.

pub mod agent_status;
pub mod chat;
pub mod errors;
pub mod kanban;
pub mod liveness;
pub mod memory;
pub mod session;
pub mod settings;
pub mod storage;

#[cfg(not(target_arch = "wasm32"))]
pub use agent_status::StatusMonitor;
pub use agent_status::{
    ActivityState, BackendState, PROBE_INTERVAL, StatusSnapshot, activity_label, probe_backend,
    probe_snapshot,
};
pub use chat::{ChatConversation, ChatSessions, PRIMARY_SESSION_TITLE};
pub use errors::{PanelError, user_facing_message};
pub use kanban::{
    COMPOSER_TARGETS, DEFAULT_BOARD_NAME, KanbanBoard, TaskDraft, TaskEdit, compose_task,
    composer_target, resolve_active_board,
};
pub use liveness::{Generation, Generations};
pub use session::AppSession;
pub use settings::{
    AppSettings, DEFAULT_API_BASE_URL, DEFAULT_API_TOKEN, SETTINGS_KEY, default_settings,
    load_settings, save_settings,
};
#[cfg(target_arch = "wasm32")]
pub use storage::BrowserLocalStorage;
pub use storage::{
    FileStorage, MemoryStorage, SettingsStorage, StorageError, UnavailableStorage,
    default_storage_dir,
};
