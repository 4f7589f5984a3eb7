use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, now_ts, require_session, required_str};
use crate::ipc::types::{AppState, Request};
use rusqlite::{params, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let mut stmt = match conn.prepare(
        "SELECT id, label, checked FROM checklist_items WHERE user_id = ? ORDER BY rowid",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    match stmt
        .query_map(params![session.user_id], |r| {
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "label": r.get::<_, String>(1)?,
                "checked": r.get::<_, i64>(2)? != 0,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    {
        Ok(items) => ok(&req.id, json!({ "items": items })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
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
    let label = match input.get("label").and_then(|v| v.as_str()).map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => return err(&req.id, "bad_params", "input.label must not be empty", None),
    };

    let item_id = Uuid::new_v4().to_string();
    if let Err(e) = conn.execute(
        "INSERT INTO checklist_items(id, user_id, label, checked, created_at) VALUES(?, ?, ?, 0, ?)",
        params![item_id, session.user_id, label, now_ts()],
    ) {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }
    ok(
        &req.id,
        json!({ "item": { "id": item_id, "label": label, "checked": false } }),
    )
}

fn handle_toggle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let item_id = match required_str(req, "itemId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    if let Err(e) = conn.execute(
        "UPDATE checklist_items SET checked = 1 - checked WHERE user_id = ? AND id = ?",
        params![session.user_id, item_id],
    ) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    let row = match conn
        .query_row(
            "SELECT checked FROM checklist_items WHERE user_id = ? AND id = ?",
            params![session.user_id, item_id],
            |r| r.get::<_, i64>(0),
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    match row {
        Some(checked) => ok(&req.id, json!({ "id": item_id, "checked": checked != 0 })),
        None => err(&req.id, "not_found", "checklist item not found", None),
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
    let item_id = match required_str(req, "itemId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match conn.execute(
        "DELETE FROM checklist_items WHERE user_id = ? AND id = ?",
        params![session.user_id, item_id],
    ) {
        Ok(0) => err(&req.id, "not_found", "checklist item not found", None),
        Ok(_) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "db_delete_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "checklist.list" => Some(handle_list(state, req)),
        "checklist.add" => Some(handle_add(state, req)),
        "checklist.toggle" => Some(handle_toggle(state, req)),
        "checklist.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
