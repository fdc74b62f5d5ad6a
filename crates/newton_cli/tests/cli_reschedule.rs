use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("newton-{nanos}-{file_name}"))
}

fn write_store(path: &Path, tasks: serde_json::Value) {
    let content = serde_json::json!({
        "schema_version": 1,
        "entries": { "newton_tasks": tasks.to_string() }
    });
    std::fs::write(path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
}

fn stored_record(store_path: &Path, key: &str) -> serde_json::Value {
    let content = std::fs::read_to_string(store_path).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&content).unwrap();
    let raw = stored["entries"][key].as_str().unwrap_or("[]").to_string();
    serde_json::from_str(&raw).unwrap()
}

fn run(store_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_newton"))
        .args(args)
        .env("NEWTON_STORE_PATH", store_path)
        .env("NEWTON_CONFIG_PATH", store_path.with_extension("config.json"))
        .output()
        .expect("failed to run newton")
}

fn seed(path: &Path) {
    write_store(
        path,
        serde_json::json!([
            {
                "id": "task-1",
                "dayId": "2025-12-20",
                "title": "demo",
                "createdAt": "2025-12-20T00:00:00Z"
            }
        ]),
    );
}

#[test]
fn reschedule_plain_text_output_includes_days() {
    let store_path = temp_path("cli-reschedule-plain.json");
    seed(&store_path);

    let output = run(&store_path, &["reschedule", "task-1", "2025-12-22"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Rescheduled task: demo (task-1) from 2025-12-20 to 2025-12-22"));
}

#[test]
fn reschedule_updates_task_and_logs_days() {
    let store_path = temp_path("cli-reschedule.json");
    seed(&store_path);

    let output = run(&store_path, &["reschedule", "task-1", "2025-12-22"]);
    assert!(output.status.success());

    let tasks = stored_record(&store_path, "newton_tasks");
    let log = stored_record(&store_path, "newton_change_log");
    std::fs::remove_file(&store_path).ok();

    assert_eq!(tasks[0]["dayId"], "2025-12-22");
    assert_eq!(log.as_array().unwrap().len(), 1);
    assert_eq!(log[0]["action"], "rescheduled");
    assert_eq!(log[0]["metadata"]["fromDay"], "2025-12-20");
    assert_eq!(log[0]["metadata"]["toDay"], "2025-12-22");
}

#[test]
fn reschedule_to_same_day_changes_nothing() {
    let store_path = temp_path("cli-reschedule-same.json");
    seed(&store_path);
    let before = std::fs::read_to_string(&store_path).unwrap();

    let output = run(&store_path, &["reschedule", "task-1", "2025-12-20"]);
    let after = std::fs::read_to_string(&store_path).unwrap();
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("task is already on 2025-12-20"));
    assert_eq!(before, after);
}

#[test]
fn reschedule_rejects_unknown_id() {
    let store_path = temp_path("cli-reschedule-missing.json");
    seed(&store_path);

    let output = run(&store_path, &["reschedule", "task-2", "2025-12-22"]);
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - task not found"));
}
