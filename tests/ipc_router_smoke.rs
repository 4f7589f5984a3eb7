
use serde_json::json;
use test_support::{login_fresh_user, request, request_ok, spawn_sidecar, temp_dir};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("planit-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health.get("version").and_then(|v| v.as_str()).is_some());

    let _ = login_fresh_user(&mut stdin, &mut reader, &workspace, "smoke@example.com");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "tasks.create",
        json!({ "input": { "title": "Water plants" } }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "notes.create",
        json!({ "input": { "title": "Groceries", "content": "milk, bread" } }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "checklist.add",
        json!({ "input": { "label": "pack passport" } }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "calendar.view",
        json!({ "year": 2026, "month": 3 }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "6", "dashboard.summary", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "language.set",
        json!({ "lang": "en" }),
    );
    let bundle = workspace.join("smoke.planitbackup.zip");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "backup.export",
        json!({ "outPath": bundle.to_string_lossy() }),
    );

    let unknown = request(
        &mut stdin,
        &mut reader,
        "9",
        "no.such.method",
        json!({}),
    );
    assert_eq!(unknown.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        unknown
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
