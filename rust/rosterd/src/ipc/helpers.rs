use crate::db::StoreError;
use crate::ipc::error::{err, ErrorCode};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::json;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, ErrorCode::BadParams, format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .and_then(|s| if s.is_empty() { None } else { Some(s) })
}

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db()
        .ok_or_else(|| err(&req.id, ErrorCode::NoWorkspace, "select a workspace first", None))
}

/// Maps a store failure to an error envelope; `fallback` names the failed operation.
pub fn store_err(req: &Request, fallback: ErrorCode, e: StoreError) -> serde_json::Value {
    match e {
        StoreError::NotFound(id) => err(
            &req.id,
            ErrorCode::NotFound,
            "student not found",
            Some(json!({ "studentId": id })),
        ),
        other => err(&req.id, fallback, other.to_string(), None),
    }
}
