use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, require_session};
use crate::ipc::types::{AppState, Request};
use chrono::{Datelike, Local};
use rusqlite::params;
use serde_json::{json, Value as JsonValue};

fn task_row_to_json(row: &rusqlite::Row<'_>) -> rusqlite::Result<JsonValue> {
    Ok(json!({
        "id": row.get::<_, String>(0)?,
        "title": row.get::<_, String>(1)?,
        "status": row.get::<_, String>(2)?,
        "dueDate": row.get::<_, Option<String>>(3)?,
        "dueTime": row.get::<_, Option<String>>(4)?,
    }))
}

fn handle_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };

    let counts = conn.query_row(
        "SELECT COUNT(*),
                COUNT(CASE WHEN status = 'completed' THEN 1 END)
         FROM tasks WHERE user_id = ?",
        params![session.user_id],
        |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?)),
    );
    let (total_tasks, completed_tasks) = match counts {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let percent = if total_tasks > 0 {
        completed_tasks * 100 / total_tasks
    } else {
        0
    };

    let mut recent_stmt = match conn.prepare(
        "SELECT id, title, status, due_date, due_time FROM tasks
         WHERE user_id = ? AND status != 'completed'
         ORDER BY due_date IS NULL, due_date, rowid
         LIMIT 5",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let recent = match recent_stmt
        .query_map(params![session.user_id], task_row_to_json)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let notes_count: i64 = match conn.query_row(
        "SELECT COUNT(*) FROM notes WHERE user_id = ?",
        params![session.user_id],
        |r| r.get(0),
    ) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    let today = Local::now().date_naive();
    let today_key = today.format("%Y-%m-%d").to_string();
    let mut upcoming_stmt = match conn.prepare(
        "SELECT id, title, status, due_date, due_time FROM tasks
         WHERE user_id = ? AND due_date >= ?
         ORDER BY due_date, rowid
         LIMIT 5",
    ) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let upcoming = match upcoming_stmt
        .query_map(params![session.user_id, today_key], task_row_to_json)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    ok(
        &req.id,
        json!({
            "totalTasks": total_tasks,
            "completedTasks": completed_tasks,
            "percentComplete": percent,
            "recentTasks": recent,
            "notesCount": notes_count,
            "upcomingTasks": upcoming,
            "today": { "year": today.year(), "month": today.month() },
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.summary" => Some(handle_summary(state, req)),
        _ => None,
    }
}
