
use serde_json::json;
use test_support::{login_fresh_user, request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn notes_crud_roundtrip() {
    let workspace = temp_dir("planit-notes");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = login_fresh_user(&mut stdin, &mut reader, &workspace, "notes@example.com");

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "notes.create",
        json!({ "input": { "title": "Trip ideas", "content": "Porto, Ouro Preto" } }),
    );
    let note_id = created
        .get("noteId")
        .and_then(|v| v.as_str())
        .expect("noteId")
        .to_string();

    let e = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "notes.create",
        json!({ "input": { "title": "  ", "content": "body" } }),
    );
    assert_eq!(e.get("code").and_then(|v| v.as_str()), Some("bad_params"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "notes.update",
        json!({ "noteId": note_id, "patch": { "content": "Porto only" } }),
    );
    let e = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "notes.update",
        json!({ "noteId": note_id, "patch": { "color": "red" } }),
    );
    assert_eq!(e.get("code").and_then(|v| v.as_str()), Some("bad_params"));

    let listed = request_ok(&mut stdin, &mut reader, "5", "notes.list", json!({}));
    let notes = listed.get("notes").and_then(|v| v.as_array()).cloned().unwrap_or_default();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].get("title").and_then(|v| v.as_str()), Some("Trip ideas"));
    assert_eq!(notes[0].get("content").and_then(|v| v.as_str()), Some("Porto only"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "notes.delete",
        json!({ "noteId": note_id }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "7", "notes.list", json!({}));
    assert_eq!(
        listed.get("notes").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(0)
    );

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn rows_are_invisible_across_owners() {
    let workspace = temp_dir("planit-ownership");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = login_fresh_user(&mut stdin, &mut reader, &workspace, "first@example.com");
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "notes.create",
        json!({ "input": { "title": "Mine", "content": "private" } }),
    );
    let note_id = created
        .get("noteId")
        .and_then(|v| v.as_str())
        .expect("noteId")
        .to_string();

    // Second account on the same workspace sees nothing of the first.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "auth.register",
        json!({ "name": "Second", "email": "second@example.com", "password": "pw" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.login",
        json!({ "email": "second@example.com", "password": "pw" }),
    );

    let listed = request_ok(&mut stdin, &mut reader, "4", "notes.list", json!({}));
    assert_eq!(
        listed.get("notes").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(0)
    );
    let e = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "notes.update",
        json!({ "noteId": note_id, "patch": { "title": "Hijacked" } }),
    );
    assert_eq!(e.get("code").and_then(|v| v.as_str()), Some("not_found"));
    let e = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "notes.delete",
        json!({ "noteId": note_id }),
    );
    assert_eq!(e.get("code").and_then(|v| v.as_str()), Some("not_found"));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn checklist_add_toggle_delete() {
    let workspace = temp_dir("planit-checklist");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = login_fresh_user(&mut stdin, &mut reader, &workspace, "check@example.com");

    let added = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "checklist.add",
        json!({ "input": { "label": "book flights" } }),
    );
    let item = added.get("item").cloned().expect("item");
    let item_id = item.get("id").and_then(|v| v.as_str()).expect("id").to_string();
    assert_eq!(item.get("checked").and_then(|v| v.as_bool()), Some(false));

    let toggled = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "checklist.toggle",
        json!({ "itemId": item_id }),
    );
    assert_eq!(toggled.get("checked").and_then(|v| v.as_bool()), Some(true));
    let toggled = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "checklist.toggle",
        json!({ "itemId": item_id }),
    );
    assert_eq!(toggled.get("checked").and_then(|v| v.as_bool()), Some(false));

    let listed = request_ok(&mut stdin, &mut reader, "4", "checklist.list", json!({}));
    let items = listed.get("items").and_then(|v| v.as_array()).cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get("label").and_then(|v| v.as_str()), Some("book flights"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "checklist.delete",
        json!({ "itemId": item_id }),
    );
    let e = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "checklist.toggle",
        json!({ "itemId": item_id }),
    );
    assert_eq!(e.get("code").and_then(|v| v.as_str()), Some("not_found"));

    let _ = std::fs::remove_dir_all(workspace);
}
