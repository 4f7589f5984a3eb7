use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, now_ts, require_session, required_str};
use crate::ipc::types::{AppState, Request};
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

fn note_to_json(row: &rusqlite::Row<'_>) -> rusqlite::Result<JsonValue> {
    Ok(json!({
        "id": row.get::<_, String>(0)?,
        "title": row.get::<_, String>(1)?,
        "content": row.get::<_, String>(2)?,
        "createdAt": row.get::<_, Option<String>>(3)?,
    }))
}

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
        "SELECT id, title, content, created_at FROM notes WHERE user_id = ? ORDER BY rowid",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    match stmt
        .query_map(params![session.user_id], note_to_json)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    {
        Ok(notes) => ok(&req.id, json!({ "notes": notes })),
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
    let title = match input.get("title").and_then(|v| v.as_str()).map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => return err(&req.id, "bad_params", "input.title must not be empty", None),
    };
    let content = match input.get("content").and_then(|v| v.as_str()).map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => return err(&req.id, "bad_params", "input.content must not be empty", None),
    };

    let note_id = Uuid::new_v4().to_string();
    if let Err(e) = conn.execute(
        "INSERT INTO notes(id, user_id, title, content, created_at) VALUES(?, ?, ?, ?, ?)",
        params![note_id, session.user_id, title, content, now_ts()],
    ) {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "noteId": note_id }))
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let note_id = match required_str(req, "noteId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "missing patch", None);
    };

    let exists = match conn
        .query_row(
            "SELECT 1 FROM notes WHERE user_id = ? AND id = ?",
            params![session.user_id, note_id],
            |_r| Ok(()),
        )
        .optional()
    {
        Ok(v) => v.is_some(),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if !exists {
        return err(&req.id, "not_found", "note not found", None);
    }

    let mut fields: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    for (k, v) in patch {
        match k.as_str() {
            "title" => {
                let Some(s) = v.as_str().map(str::trim) else {
                    return err(&req.id, "bad_params", "patch.title must be string", None);
                };
                if s.is_empty() {
                    return err(&req.id, "bad_params", "patch.title must not be empty", None);
                }
                fields.push("title = ?".to_string());
                values.push(Value::Text(s.to_string()));
            }
            "content" => {
                let Some(s) = v.as_str().map(str::trim) else {
                    return err(&req.id, "bad_params", "patch.content must be string", None);
                };
                if s.is_empty() {
                    return err(&req.id, "bad_params", "patch.content must not be empty", None);
                }
                fields.push("content = ?".to_string());
                values.push(Value::Text(s.to_string()));
            }
            _ => return err(&req.id, "bad_params", format!("unknown patch field: {}", k), None),
        }
    }
    if fields.is_empty() {
        return ok(&req.id, json!({ "ok": true }));
    }
    values.push(Value::Text(session.user_id));
    values.push(Value::Text(note_id));
    let sql = format!(
        "UPDATE notes SET {} WHERE user_id = ? AND id = ?",
        fields.join(", ")
    );
    if let Err(e) = conn.execute(&sql, params_from_iter(values)) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "ok": true }))
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
    let note_id = match required_str(req, "noteId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match conn.execute(
        "DELETE FROM notes WHERE user_id = ? AND id = ?",
        params![session.user_id, note_id],
    ) {
        Ok(0) => err(&req.id, "not_found", "note not found", None),
        Ok(_) => ok(&req.id, json!({ "ok": true })),
        Err(e) => err(&req.id, "db_delete_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "notes.list" => Some(handle_list(state, req)),
        "notes.create" => Some(handle_create(state, req)),
        "notes.update" => Some(handle_update(state, req)),
        "notes.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
