use serde::Serialize;
use serde_json::json;

/// Every failure the daemon reports, serialized as its snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadJson,
    BadParams,
    NoWorkspace,
    NotFound,
    DbOpenFailed,
    DbQueryFailed,
    DbInsertFailed,
    DbUpdateFailed,
    DbDeleteFailed,
    ExportFailed,
    NotImplemented,
}

#[derive(Debug, Serialize)]
struct OkResp<'a> {
    id: &'a str,
    ok: bool,
    result: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ErrObj {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ErrResp<'a> {
    /// Absent only when the request line could not be decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    ok: bool,
    error: ErrObj,
}

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!(OkResp {
        id,
        ok: true,
        result,
    })
}

pub fn err(
    id: &str,
    code: ErrorCode,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    json!(ErrResp {
        id: Some(id),
        ok: false,
        error: ErrObj {
            code,
            message: message.into(),
            details,
        },
    })
}

/// Reply for a line that did not decode as a request.
pub fn bad_json(message: impl Into<String>) -> serde_json::Value {
    json!(ErrResp {
        id: None,
        ok: false,
        error: ErrObj {
            code: ErrorCode::BadJson,
            message: message.into(),
            details: None,
        },
    })
}
