use crate::db;
use crate::ipc::error::{err, ok, ErrorCode};
use crate::ipc::helpers::{db_conn, optional_str, required_str, store_err};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

/// Form-level checks the roster screens apply before saving: a name and at
/// least one subject row. Score contents are left alone.
fn student_fields(req: &Request) -> Result<(String, Option<String>, serde_json::Value), serde_json::Value> {
    let name = required_str(req, "name")?.trim().to_string();
    if name.is_empty() {
        return Err(err(&req.id, ErrorCode::BadParams, "name must not be empty", None));
    }
    let subjects = match req.params.get("subjects").and_then(|v| v.as_array()) {
        Some(items) if !items.is_empty() => serde_json::Value::Array(items.clone()),
        Some(_) => {
            return Err(err(
                &req.id,
                ErrorCode::BadParams,
                "subjects must contain at least one entry",
                None,
            ))
        }
        None => return Err(err(&req.id, ErrorCode::BadParams, "subjects must be an array", None)),
    };
    Ok((name, optional_str(req, "photoRef"), subjects))
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match db::list_students(conn) {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => store_err(req, ErrorCode::DbQueryFailed, e),
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match db::get_student(conn, &student_id) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => store_err(req, ErrorCode::DbQueryFailed, e),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let (name, photo_ref, subjects) = match student_fields(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match db::create_student(conn, &name, photo_ref.as_deref(), &subjects) {
        Ok(student) => {
            tracing::info!(student_id = %student.id, "student created");
            ok(
                &req.id,
                json!({ "studentId": student.id.clone(), "student": student }),
            )
        }
        Err(e) => store_err(req, ErrorCode::DbInsertFailed, e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (name, photo_ref, subjects) = match student_fields(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match db::update_student(conn, &student_id, &name, photo_ref.as_deref(), &subjects) {
        Ok(()) => {
            tracing::info!(student_id = %student_id, "student updated");
            ok(&req.id, json!({ "ok": true }))
        }
        Err(e) => store_err(req, ErrorCode::DbUpdateFailed, e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match db::delete_student(conn, &student_id) {
        Ok(()) => {
            tracing::info!(student_id = %student_id, "student deleted");
            ok(&req.id, json!({ "ok": true }))
        }
        Err(e) => store_err(req, ErrorCode::DbDeleteFailed, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_list(state, req)),
        "students.get" => Some(handle_get(state, req)),
        "students.create" => Some(handle_create(state, req)),
        "students.update" => Some(handle_update(state, req)),
        "students.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
