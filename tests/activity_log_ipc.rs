use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_quizbankd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn quizbankd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

#[test]
fn admin_actions_leave_an_audit_trail() {
    let workspace = temp_dir("quizbank-activity");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let fresh = request_ok(&mut stdin, &mut reader, "2", "activity.list", json!({}));
    assert_eq!(fresh.get("total").and_then(|v| v.as_u64()), Some(0));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "bank.import",
        json!({ "text": "Q1?,a,b,c,d,A" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "setup.update",
        json!({ "section": "exam", "patch": { "live": true } }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "bank.reset",
        json!({ "confirm": true }),
    );
    // A declined reset is a no-op and must not be logged.
    let _ = request_ok(&mut stdin, &mut reader, "6", "bank.reset", json!({}));

    let listed = request_ok(&mut stdin, &mut reader, "7", "activity.list", json!({}));
    let entries = listed
        .get("entries")
        .and_then(|v| v.as_array())
        .cloned()
        .expect("entries array");
    assert_eq!(entries.len(), 3);

    let actions: Vec<&str> = entries
        .iter()
        .map(|e| e.get("action").and_then(|v| v.as_str()).expect("action"))
        .collect();
    assert_eq!(actions[0], "BANK_RESET");
    assert!(actions.contains(&"BANK_IMPORT"));
    assert!(actions.contains(&"SETTINGS_UPDATE"));

    let import_entry = entries
        .iter()
        .find(|e| e.get("action").and_then(|v| v.as_str()) == Some("BANK_IMPORT"))
        .expect("import entry");
    assert_eq!(
        import_entry.get("details").and_then(|v| v.as_str()),
        Some("Imported 1 questions (bank total 1)")
    );
    assert!(import_entry.get("id").and_then(|v| v.as_str()).is_some());
    assert!(import_entry.get("at").and_then(|v| v.as_str()).is_some());

    let limited = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "activity.list",
        json!({ "limit": 1 }),
    );
    assert_eq!(limited.get("total").and_then(|v| v.as_u64()), Some(1));

    let invalid = request(
        &mut stdin,
        &mut reader,
        "9",
        "activity.list",
        json!({ "limit": 0 }),
    );
    assert_eq!(invalid.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        invalid.pointer("/error/code").and_then(|v| v.as_str()),
        Some("bad_params")
    );
}
