use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::db_conn;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

pub const DEFAULT_LANGUAGE: &str = "pt";
const SUPPORTED_LANGUAGES: [&str; 3] = ["pt", "en", "es"];

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match db::open_db(&path) {
        Ok(conn) => {
            state.workspace = Some(path.clone());
            state.db = Some(conn);
            // Switching workspaces drops whoever was logged in; accounts
            // live inside the workspace database.
            state.session = None;
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn current_language(conn: &rusqlite::Connection) -> String {
    db::settings_get_json(conn, "app.language")
        .ok()
        .flatten()
        .and_then(|v| v.as_str().map(|s| s.to_string()))
        .filter(|s| SUPPORTED_LANGUAGES.contains(&s.as_str()))
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

fn handle_language_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    ok(&req.id, json!({ "language": current_language(conn) }))
}

fn handle_language_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let lang = match req.params.get("lang").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_ascii_lowercase(),
        None => return err(&req.id, "bad_params", "missing lang", None),
    };
    if !SUPPORTED_LANGUAGES.contains(&lang.as_str()) {
        return err(
            &req.id,
            "bad_params",
            format!("unsupported language: {}", lang),
            None,
        );
    }
    if let Err(e) = db::settings_set_json(conn, "app.language", &json!(lang)) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "language": lang }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "language.get" => Some(handle_language_get(state, req)),
        "language.set" => Some(handle_language_set(state, req)),
        _ => None,
    }
}
