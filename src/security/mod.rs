//! Input validation shared by every handler: safe path resolution, fetch
//! URL allow-listing and IPC payload checks.

pub mod ipc;
pub mod path;

pub use ipc::validate_execute_payload;
pub use path::{resolve_safe_path, validate_fetch_url};
