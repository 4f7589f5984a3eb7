use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, now_ts, parse_opt_string, require_session, required_str};
use crate::ipc::types::{AppState, Request};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::params;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

const STATUS_PENDING: &str = "pending";
const STATUS_COMPLETED: &str = "completed";

fn validate_status_filter(raw: &str) -> bool {
    matches!(raw, STATUS_PENDING | STATUS_COMPLETED)
}

fn task_to_json(row: &rusqlite::Row<'_>) -> rusqlite::Result<JsonValue> {
    Ok(json!({
        "id": row.get::<_, String>(0)?,
        "title": row.get::<_, String>(1)?,
        "description": row.get::<_, String>(2)?,
        "status": row.get::<_, String>(3)?,
        "dueDate": row.get::<_, Option<String>>(4)?,
        "dueTime": row.get::<_, Option<String>>(5)?,
        "createdAt": row.get::<_, Option<String>>(6)?,
    }))
}

const TASK_COLUMNS: &str = "id, title, description, status, due_date, due_time, created_at";

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let status_filter = match parse_opt_string(req.params.get("statusFilter")) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", format!("statusFilter {}", m), None),
    };
    if let Some(ref s) = status_filter {
        if !validate_status_filter(s) {
            return err(
                &req.id,
                "bad_params",
                format!("statusFilter must be one of: pending, completed, got {}", s),
                None,
            );
        }
    }

    let sql = if status_filter.is_some() {
        format!(
            "SELECT {} FROM tasks WHERE user_id = ? AND status = ?
             ORDER BY due_date IS NULL, due_date, rowid",
            TASK_COLUMNS
        )
    } else {
        format!(
            "SELECT {} FROM tasks WHERE user_id = ?
             ORDER BY due_date IS NULL, due_date, rowid",
            TASK_COLUMNS
        )
    };
    let mut stmt = match conn.prepare(&sql) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = if let Some(status) = status_filter {
        stmt.query_map(params![session.user_id, status], task_to_json)
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    } else {
        stmt.query_map(params![session.user_id], task_to_json)
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    };
    match rows {
        Ok(tasks) => ok(&req.id, json!({ "tasks": tasks })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let Some(input) = req.params.get("input").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "missing input", None);
    };
    let title = match input.get("title").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "input.title is required", None),
    };
    if title.is_empty() {
        return err(&req.id, "bad_params", "input.title must not be empty", None);
    }
    let description = match parse_opt_string(input.get("description")) {
        Ok(v) => v.unwrap_or_default(),
        Err(m) => return err(&req.id, "bad_params", format!("input.description {}", m), None),
    };
    let due_date = match parse_opt_string(input.get("dueDate")) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", format!("input.dueDate {}", m), None),
    };
    if let Some(ref raw) = due_date {
        if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_err() {
            return err(
                &req.id,
                "bad_params",
                format!("input.dueDate must be YYYY-MM-DD, got {}", raw),
                None,
            );
        }
    }
    let due_time = match parse_opt_string(input.get("dueTime")) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", format!("input.dueTime {}", m), None),
    };
    if let Some(ref raw) = due_time {
        if due_date.is_none() {
            return err(
                &req.id,
                "bad_params",
                "input.dueTime requires input.dueDate",
                None,
            );
        }
        if NaiveTime::parse_from_str(raw, "%H:%M").is_err() {
            return err(
                &req.id,
                "bad_params",
                format!("input.dueTime must be HH:MM, got {}", raw),
                None,
            );
        }
    }

    let task_id = Uuid::new_v4().to_string();
    if let Err(e) = conn.execute(
        "INSERT INTO tasks(id, user_id, title, description, status, due_date, due_time, created_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            task_id,
            session.user_id,
            title,
            description,
            STATUS_PENDING,
            due_date,
            due_time,
            now_ts()
        ],
    ) {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "taskId": task_id }))
}

fn handle_complete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let task_id = match required_str(req, "taskId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match conn.execute(
        "UPDATE tasks SET status = ? WHERE user_id = ? AND id = ?",
        params![STATUS_COMPLETED, session.user_id, task_id],
    ) {
        Ok(0) => err(&req.id, "not_found", "task not found", None),
        Ok(_) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let task_id = match required_str(req, "taskId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match conn.execute(
        "DELETE FROM tasks WHERE user_id = ? AND id = ?",
        params![session.user_id, task_id],
    ) {
        Ok(0) => err(&req.id, "not_found", "task not found", None),
        Ok(_) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "db_delete_failed", e.to_string(), None),
    }
}

// Printable task report: the shell renders it, this side only assembles the
// model (counts plus rows grouped by status).
fn handle_report(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };

    let sql = format!(
        "SELECT {} FROM tasks WHERE user_id = ?
         ORDER BY due_date IS NULL, due_date, rowid",
        TASK_COLUMNS
    );
    let mut stmt = match conn.prepare(&sql) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let tasks = match stmt
        .query_map(params![session.user_id], task_to_json)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let total = tasks.len();
    let (completed, pending): (Vec<JsonValue>, Vec<JsonValue>) = tasks
        .into_iter()
        .partition(|t| t.get("status").and_then(|v| v.as_str()) == Some(STATUS_COMPLETED));
    let percent = if total > 0 {
        (completed.len() * 100 / total) as i64
    } else {
        0
    };

    ok(
        &req.id,
        json!({
            "owner": session.name,
            "generatedAt": now_ts(),
            "totalTasks": total,
            "completedTasks": completed.len(),
            "percentComplete": percent,
            "pending": pending,
            "completed": completed,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "tasks.list" => Some(handle_list(state, req)),
        "tasks.create" => Some(handle_create(state, req)),
        "tasks.complete" => Some(handle_complete(state, req)),
        "tasks.delete" => Some(handle_delete(state, req)),
        "tasks.report" => Some(handle_report(state, req)),
        _ => None,
    }
}
