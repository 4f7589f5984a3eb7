use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, now_ts, required_str};
use crate::ipc::types::{AppState, Request, Session};
use rusqlite::{params, OptionalExtension};
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

// Stored as "salt$hexdigest" where digest = SHA-256(salt + password).
fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{}${:x}", salt, hasher.finalize())
}

fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, digest)) = stored.split_once('$') else {
        return false;
    };
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize()) == digest
}

fn handle_register(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let email = match required_str(req, "email") {
        Ok(v) => v.to_ascii_lowercase(),
        Err(e) => return e,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let taken = match conn
        .query_row("SELECT 1 FROM users WHERE email = ?", [&email], |_r| Ok(()))
        .optional()
    {
        Ok(v) => v.is_some(),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if taken {
        return err(&req.id, "email_taken", "email is already registered", None);
    }

    let user_id = Uuid::new_v4().to_string();
    if let Err(e) = conn.execute(
        "INSERT INTO users(id, name, email, password_hash, created_at) VALUES(?, ?, ?, ?, ?)",
        params![user_id, name, email, hash_password(&password), now_ts()],
    ) {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "userId": user_id }))
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let email = match required_str(req, "email") {
        Ok(v) => v.to_ascii_lowercase(),
        Err(e) => return e,
    };
    let password = match required_str(req, "password") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };

    let row = match conn
        .query_row(
            "SELECT id, name, password_hash FROM users WHERE email = ?",
            [&email],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            },
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    match row {
        Some((user_id, name, stored)) if verify_password(&password, &stored) => {
            state.session = Some(Session {
                user_id: user_id.clone(),
                name: name.clone(),
            });
            ok(&req.id, json!({ "userId": user_id, "name": name }))
        }
        _ => err(&req.id, "invalid_credentials", "wrong email or password", None),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session = None;
    ok(&req.id, json!({ "ok": true }))
}

fn handle_session(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user = state
        .session
        .as_ref()
        .map(|s| json!({ "userId": s.user_id, "name": s.name }))
        .unwrap_or(serde_json::Value::Null);
    ok(&req.id, json!({ "user": user }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.register" => Some(handle_register(state, req)),
        "auth.login" => Some(handle_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "auth.session" => Some(handle_session(state, req)),
        _ => None,
    }
}
