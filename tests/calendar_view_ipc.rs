
use serde_json::json;
use test_support::{login_fresh_user, request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn month_view_merges_tasks_and_events_half_open() {
    let workspace = temp_dir("planit-calendar-view");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = login_fresh_user(&mut stdin, &mut reader, &workspace, "cal@example.com");

    // Inside the February 2024 window.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "tasks.create",
        json!({ "input": { "title": "File taxes", "dueDate": "2024-02-29" } }),
    );
    // First instant past the window; must not leak back in.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "tasks.create",
        json!({ "input": { "title": "March kickoff", "dueDate": "2024-03-01" } }),
    );
    // No due date, never on the calendar.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "tasks.create",
        json!({ "input": { "title": "Tidy garage" } }),
    );
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "events.create",
        json!({ "year": 2024, "month": 2, "day": 29, "input": { "title": "Leap party", "time": "20:00" } }),
    );
    let event_id = created
        .get("eventId")
        .and_then(|v| v.as_str())
        .expect("eventId")
        .to_string();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "events.create",
        json!({ "year": 2024, "month": 1, "day": 31, "input": { "title": "January only" } }),
    );

    let view = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "calendar.view",
        json!({ "year": 2024, "month": 2 }),
    );

    let grid = view.get("grid").and_then(|v| v.as_array()).cloned().expect("grid");
    assert_eq!(grid.len() % 7, 0);
    let in_month: Vec<i64> = grid.iter().filter_map(|c| c.as_i64()).collect();
    assert_eq!(in_month.len(), 29);
    assert_eq!(in_month.first(), Some(&1));
    assert_eq!(in_month.last(), Some(&29));
    // 2024-02-01 is a Thursday; Monday-first layout pads three cells.
    assert!(grid[..3].iter().all(|c| c.is_null()));
    assert_eq!(grid[3].as_i64(), Some(1));

    let agenda = view.get("agenda").and_then(|v| v.as_object()).expect("agenda");
    assert_eq!(agenda.len(), 1, "only day 29 has entries: {:?}", agenda);
    let day29 = agenda.get("29").and_then(|v| v.as_array()).expect("day 29");
    assert_eq!(day29.len(), 2);
    assert_eq!(day29[0]["type"], "task");
    assert_eq!(day29[0]["title"], "File taxes");
    assert!(day29[0].get("id").is_none());
    assert_eq!(day29[1]["type"], "event");
    assert_eq!(day29[1]["title"], "Leap party");
    assert_eq!(day29[1]["time"], "20:00");
    assert_eq!(day29[1]["id"], event_id.as_str());

    assert_eq!(view["prev"], json!({ "year": 2024, "month": 1 }));
    assert_eq!(view["next"], json!({ "year": 2024, "month": 3 }));

    // Identical request, unchanged store: identical view.
    let again = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "calendar.view",
        json!({ "year": 2024, "month": 2 }),
    );
    assert_eq!(again.get("grid"), view.get("grid"));
    assert_eq!(again.get("agenda"), view.get("agenda"));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn navigation_carries_across_year_boundary() {
    let workspace = temp_dir("planit-calendar-nav");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = login_fresh_user(&mut stdin, &mut reader, &workspace, "nav@example.com");

    let december = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "calendar.view",
        json!({ "year": 2024, "month": 12 }),
    );
    assert_eq!(december["next"], json!({ "year": 2025, "month": 1 }));
    assert_eq!(december["prev"], json!({ "year": 2024, "month": 11 }));

    let january = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "calendar.view",
        json!({ "year": 2025, "month": 1 }),
    );
    assert_eq!(january["prev"], json!({ "year": 2024, "month": 12 }));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn invalid_month_is_refused_with_redirect_target() {
    let workspace = temp_dir("planit-calendar-invalid");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = login_fresh_user(&mut stdin, &mut reader, &workspace, "invalid@example.com");

    let e = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "calendar.view",
        json!({ "year": 2024, "month": 13 }),
    );
    assert_eq!(e.get("code").and_then(|v| v.as_str()), Some("invalid_month"));
    let details = e.get("details").expect("details");
    assert!(details.get("year").and_then(|v| v.as_i64()).is_some());
    let month = details.get("month").and_then(|v| v.as_i64()).expect("month");
    assert!((1..=12).contains(&month));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "calendar.view",
        json!({ "year": 2024, "month": 0 }),
    );
    assert_eq!(e.get("code").and_then(|v| v.as_str()), Some("invalid_month"));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "events.create",
        json!({ "year": 2023, "month": 2, "day": 29, "input": { "title": "Ghost day" } }),
    );
    assert_eq!(e.get("code").and_then(|v| v.as_str()), Some("invalid_date"));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn week_start_and_language_are_applied() {
    let workspace = temp_dir("planit-calendar-prefs");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = login_fresh_user(&mut stdin, &mut reader, &workspace, "prefs@example.com");

    // Portuguese is the out-of-the-box language.
    let view = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "calendar.view",
        json!({ "year": 2024, "month": 2 }),
    );
    assert_eq!(view.get("monthName").and_then(|v| v.as_str()), Some("Fevereiro"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "language.set",
        json!({ "lang": "es" }),
    );
    let view = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "calendar.view",
        json!({ "year": 2024, "month": 2, "weekStart": "sunday" }),
    );
    assert_eq!(view.get("monthName").and_then(|v| v.as_str()), Some("Febrero"));
    // Sunday-first layout pads four cells before Thursday the 1st.
    let grid = view.get("grid").and_then(|v| v.as_array()).cloned().expect("grid");
    assert!(grid[..4].iter().all(|c| c.is_null()));
    assert_eq!(grid[4].as_i64(), Some(1));

    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "language.set",
        json!({ "lang": "fr" }),
    );
    assert_eq!(e.get("code").and_then(|v| v.as_str()), Some("bad_params"));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn event_delete_returns_owning_month() {
    let workspace = temp_dir("planit-calendar-event-delete");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = login_fresh_user(&mut stdin, &mut reader, &workspace, "evdel@example.com");

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "events.create",
        json!({ "year": 2025, "month": 7, "day": 4, "input": { "title": "Fireworks" } }),
    );
    let event_id = created
        .get("eventId")
        .and_then(|v| v.as_str())
        .expect("eventId")
        .to_string();

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "events.delete",
        json!({ "eventId": event_id }),
    );
    assert_eq!(deleted.get("year").and_then(|v| v.as_i64()), Some(2025));
    assert_eq!(deleted.get("month").and_then(|v| v.as_i64()), Some(7));

    let view = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "calendar.view",
        json!({ "year": 2025, "month": 7 }),
    );
    assert_eq!(
        view.get("agenda").and_then(|v| v.as_object()).map(|m| m.len()),
        Some(0)
    );

    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "events.delete",
        json!({ "eventId": event_id }),
    );
    assert_eq!(e.get("code").and_then(|v| v.as_str()), Some("not_found"));

    let _ = std::fs::remove_dir_all(workspace);
}
