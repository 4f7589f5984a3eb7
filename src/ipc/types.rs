use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// The user currently logged in on this sidecar. One process serves one UI
/// shell, so the session is plain in-memory state rather than a cookie.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub name: String,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub session: Option<Session>,
}
