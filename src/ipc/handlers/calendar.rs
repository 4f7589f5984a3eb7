use crate::calendar::{self, CalendarContext, WeekStart};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, now_ts, parse_opt_i64, parse_opt_string, require_session, required_str};
use crate::ipc::types::{AppState, Request};
use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use rusqlite::{params, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

fn handle_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };

    let year = match parse_opt_i64(req.params.get("year")) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", format!("year {}", m), None),
    };
    let month = match parse_opt_i64(req.params.get("month")) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", format!("month {}", m), None),
    };
    let today = Local::now().date_naive();
    // No explicit month requested: show the current one.
    let (year, month) = match (year, month) {
        (None, None) => (today.year() as i64, today.month() as i64),
        (Some(y), Some(m)) => (y, m),
        _ => return err(&req.id, "bad_params", "year and month go together", None),
    };

    let week_start = match parse_opt_string(req.params.get("weekStart")) {
        Ok(None) => WeekStart::default(),
        Ok(Some(raw)) => match WeekStart::parse(&raw) {
            Some(ws) => ws,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("weekStart must be one of: monday, sunday, got {}", raw),
                    None,
                )
            }
        },
        Err(m) => return err(&req.id, "bad_params", format!("weekStart {}", m), None),
    };

    if !(1..=12).contains(&month) || i32::try_from(year).is_err() {
        // Refuse rather than clamp; the shell retries with the normalized
        // current month carried in details.
        return err(
            &req.id,
            "invalid_month",
            format!("no such month: {}-{}", year, month),
            Some(json!({ "year": today.year(), "month": today.month() })),
        );
    }

    let lang = super::core::current_language(conn);
    let ctx = CalendarContext {
        conn,
        user_id: &session.user_id,
    };
    match calendar::build_month_view(&ctx, year as i32, month as u32, week_start, &lang) {
        Ok(view) => {
            let mut result = match serde_json::to_value(&view) {
                Ok(v) => v,
                Err(e) => return err(&req.id, "internal", e.to_string(), None),
            };
            result["today"] = json!({
                "year": today.year(),
                "month": today.month(),
                "day": today.day(),
            });
            ok(&req.id, result)
        }
        Err(e) if e.code == "invalid_month" => err(
            &req.id,
            "invalid_month",
            e.message,
            Some(json!({ "year": today.year(), "month": today.month() })),
        ),
        Err(e) => err(&req.id, &e.code, e.message, None),
    }
}

fn handle_event_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };

    let year = match req.params.get("year").and_then(|v| v.as_i64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing year", None),
    };
    let month = match req.params.get("month").and_then(|v| v.as_i64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing month", None),
    };
    let day = match req.params.get("day").and_then(|v| v.as_i64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing day", None),
    };
    let date = i32::try_from(year)
        .ok()
        .zip(u32::try_from(month).ok())
        .zip(u32::try_from(day).ok())
        .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d));
    let Some(date) = date else {
        return err(
            &req.id,
            "invalid_date",
            format!("no such date: {}-{}-{}", year, month, day),
            None,
        );
    };

    let Some(input) = req.params.get("input").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "missing input", None);
    };
    let title = match input.get("title").and_then(|v| v.as_str()).map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => return err(&req.id, "bad_params", "input.title must not be empty", None),
    };
    let time = match parse_opt_string(input.get("time")) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", format!("input.time {}", m), None),
    };
    if let Some(ref raw) = time {
        if NaiveTime::parse_from_str(raw, "%H:%M").is_err() {
            return err(
                &req.id,
                "bad_params",
                format!("input.time must be HH:MM, got {}", raw),
                None,
            );
        }
    }

    let event_id = Uuid::new_v4().to_string();
    if let Err(e) = conn.execute(
        "INSERT INTO events(id, user_id, title, date, time, created_at) VALUES(?, ?, ?, ?, ?, ?)",
        params![
            event_id,
            session.user_id,
            title,
            date.format("%Y-%m-%d").to_string(),
            time,
            now_ts()
        ],
    ) {
        return err(&req.id, "db_insert_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "eventId": event_id }))
}

fn handle_event_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let session = match require_session(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let event_id = match required_str(req, "eventId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    // Read the date first so the caller knows which month view to return to.
    let date = match conn
        .query_row(
            "SELECT date FROM events WHERE user_id = ? AND id = ?",
            params![session.user_id, event_id],
            |r| r.get::<_, String>(0),
        )
        .optional()
    {
        Ok(Some(v)) => v,
        Ok(None) => return err(&req.id, "not_found", "event not found", None),
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if let Err(e) = conn.execute(
        "DELETE FROM events WHERE user_id = ? AND id = ?",
        params![session.user_id, event_id],
    ) {
        return err(&req.id, "db_delete_failed", e.to_string(), None);
    }

    let target = NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok();
    ok(
        &req.id,
        json!({
            "ok": true,
            "year": target.map(|d| d.year()),
            "month": target.map(|d| d.month()),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calendar.view" => Some(handle_view(state, req)),
        "events.create" => Some(handle_event_create(state, req)),
        "events.delete" => Some(handle_event_delete(state, req)),
        _ => None,
    }
}
