use crate::db::{self, SnapshotSource};
use crate::export::{self, ReportFormat};
use crate::ipc::error::{err, ok, ErrorCode};
use crate::ipc::helpers::{db_conn, required_str};
use crate::ipc::types::{AppState, Request};
use crate::stats::{self, AggregateResult, StatsConfig};
use rusqlite::Connection;
use serde_json::json;
use std::path::PathBuf;

const THRESHOLD_KEY: &str = "stats.threshold";

fn parse_threshold(req: &Request, v: &serde_json::Value) -> Result<f64, serde_json::Value> {
    v.as_f64().filter(|t| t.is_finite()).ok_or_else(|| {
        err(
            &req.id,
            ErrorCode::BadParams,
            "threshold must be a finite number",
            Some(json!({ "threshold": v })),
        )
    })
}

/// Request param, then the workspace setting, then the compiled default.
fn resolve_config(conn: &Connection, req: &Request) -> Result<StatsConfig, serde_json::Value> {
    if let Some(v) = req.params.get("threshold").filter(|v| !v.is_null()) {
        return Ok(StatsConfig {
            threshold: parse_threshold(req, v)?,
        });
    }
    stored_config(conn).map_err(|e| err(&req.id, ErrorCode::DbQueryFailed, e.to_string(), None))
}

fn stored_config(conn: &Connection) -> anyhow::Result<StatsConfig> {
    match db::settings_get_json(conn, THRESHOLD_KEY)? {
        Some(v) => match v.as_f64().filter(|t| t.is_finite()) {
            Some(threshold) => Ok(StatsConfig { threshold }),
            None => {
                tracing::warn!(setting = THRESHOLD_KEY, value = %v, "ignoring invalid stored threshold");
                Ok(StatsConfig::default())
            }
        },
        None => Ok(StatsConfig::default()),
    }
}

fn run_aggregate(state: &AppState, req: &Request) -> Result<AggregateResult, serde_json::Value> {
    let conn = db_conn(state, req)?;
    let config = resolve_config(conn, req)?;
    let snapshot = conn
        .snapshot()
        .map_err(|e| err(&req.id, ErrorCode::DbQueryFailed, e.to_string(), None))?;
    Ok(stats::aggregate(&snapshot, &config))
}

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match stored_config(conn) {
        Ok(config) => ok(&req.id, json!({ "threshold": config.threshold })),
        Err(e) => err(&req.id, ErrorCode::DbQueryFailed, e.to_string(), None),
    }
}

fn handle_config_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let Some(raw) = req.params.get("threshold") else {
        return err(&req.id, ErrorCode::BadParams, "missing threshold", None);
    };
    let threshold = match parse_threshold(req, raw) {
        Ok(t) => t,
        Err(e) => return e,
    };
    if let Err(e) = db::settings_set_json(conn, THRESHOLD_KEY, &json!(threshold)) {
        return err(&req.id, ErrorCode::DbUpdateFailed, e.to_string(), None);
    }
    tracing::info!(threshold, "classification threshold updated");
    ok(&req.id, json!({ "threshold": threshold }))
}

fn handle_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    match run_aggregate(state, req) {
        Ok(result) => {
            let chart = stats::chart_series(&result);
            ok(&req.id, json!({ "result": result, "chart": chart }))
        }
        Err(e) => e,
    }
}

fn handle_report(state: &mut AppState, req: &Request) -> serde_json::Value {
    match run_aggregate(state, req) {
        Ok(result) => {
            let lines = stats::render_report(&result);
            let sha256 = export::report_digest(&lines);
            ok(&req.id, json!({ "lines": lines, "sha256": sha256 }))
        }
        Err(e) => e,
    }
}

fn handle_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match required_str(req, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };
    let format = match req.params.get("format").and_then(|v| v.as_str()) {
        None => ReportFormat::Text,
        Some(raw) => match ReportFormat::parse(raw) {
            Ok(f) => f,
            Err(e) => return err(&req.id, ErrorCode::BadParams, e.to_string(), None),
        },
    };
    let result = match run_aggregate(state, req) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let lines = stats::render_report(&result);
    match export::export_report(&lines, &out_path, format) {
        Ok(summary) => {
            tracing::info!(path = %out_path.display(), format = summary.format.as_str(), "report exported");
            ok(
                &req.id,
                json!({
                    "path": out_path.to_string_lossy(),
                    "format": summary.format.as_str(),
                    "lineCount": summary.line_count,
                    "sha256": summary.sha256,
                }),
            )
        }
        Err(e) => {
            tracing::warn!(path = %out_path.display(), error = %e, "report export failed");
            err(&req.id, ErrorCode::ExportFailed, format!("{e:#}"), None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.config.get" => Some(handle_config_get(state, req)),
        "stats.config.update" => Some(handle_config_update(state, req)),
        "stats.compute" => Some(handle_compute(state, req)),
        "stats.report" => Some(handle_report(state, req)),
        "stats.export" => Some(handle_export(state, req)),
        _ => None,
    }
}
