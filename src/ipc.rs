//! JSON-lines request routing for the `nexshell` binary.
//!
//! Each request is one line: `{"channel": "...", "payload": {...}}`. Each
//! response is one line of JSON. Nothing a caller sends can make this
//! module fail; bad requests come back as `IPC error` results.

use serde::Deserialize;
use serde_json::Value;

use crate::backend::Backend;
use crate::exec::CommandResult;

pub const EXECUTE_COMMAND: &str = "nexshell:executeCommand";
pub const GET_HOST_INFO: &str = "nexshell:getHostInfo";
pub const LIST_JOBS: &str = "nexshell:listJobs";

#[derive(Debug, Deserialize)]
pub struct IpcRequest {
    pub channel: String,
    #[serde(default)]
    pub payload: Value,
}

/// Parse and route one request line.
pub fn handle_line(backend: &Backend, line: &str) -> Value {
    match serde_json::from_str::<IpcRequest>(line) {
        Ok(request) => handle_request(backend, &request),
        Err(e) => {
            log::warn!("malformed request: {e}");
            error_response(format!("malformed request: {e}"))
        }
    }
}

pub fn handle_request(backend: &Backend, request: &IpcRequest) -> Value {
    log::debug!("ipc {}", request.channel);
    let response = match request.channel.as_str() {
        EXECUTE_COMMAND => serde_json::to_value(backend.execute_payload(&request.payload)),
        GET_HOST_INFO => serde_json::to_value(backend.host_info()),
        LIST_JOBS => serde_json::to_value(backend.jobs().get_all()),
        other => return error_response(format!("unknown channel '{other}'")),
    };
    response.unwrap_or_else(|e| error_response(format!("could not encode response: {e}")))
}

fn error_response(message: String) -> Value {
    let result = CommandResult::failure(1, format!("IPC error: {message}"));
    serde_json::json!({
        "stdout": result.stdout,
        "stderr": result.stderr,
        "exitCode": result.exit_code,
    })
}
