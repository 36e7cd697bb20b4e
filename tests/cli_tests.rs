use std::process::Command;

fn probe() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sengoku-probe"));
    cmd.env_remove("SENGOKU_CONFIG")
        .env_remove("RUST_LOG")
        .env_remove("SENGOKU_STATIC_DIR")
        .env_remove("SENGOKU_STATIC_PREFIX")
        .env_remove("SENGOKU_LOG_ASYNC")
        .env("SENGOKU_LOG_LEVEL", "error")
        .env("SENGOKU_TEMPLATES_DIR", "demos/templates");
    cmd
}

#[test]
fn test_probe_home() {
    let out = probe().args(["--path", "/home"]).output().expect("run probe");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("200 OK"));
    assert!(stdout.contains("Hello from the HOME page"));
}

#[test]
fn test_probe_typed_route() {
    let out = probe().args(["--path", "/sub/10/3"]).output().expect("run probe");
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("10 - 3 = 7"));
}

#[test]
fn test_probe_not_found_exits_nonzero() {
    let out = probe().args(["--path", "/a/b/c"]).output().expect("run probe");
    assert!(!out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("404 Not Found"));
    assert!(stdout.contains("Not found."));
}

#[test]
fn test_probe_method_not_allowed() {
    let out = probe()
        .args(["--method", "get", "--path", "/echo"])
        .output()
        .expect("run probe");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("405"));
}

#[test]
fn test_probe_resource_post() {
    let out = probe()
        .args(["--method", "post", "--path", "/book", "--body", "Dune"])
        .output()
        .expect("run probe");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("201 Created"));
    assert!(stdout.contains("created: Dune"));
}

#[test]
fn test_probe_lists_routes() {
    let out = probe().arg("--routes").output().expect("run probe");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("/sub/{a:d}/{b:d}"));
    assert!(stdout.contains("/book"));
}

#[test]
fn test_probe_config_file_serves_static_and_templates() {
    let out = probe()
        .args(["--config", "demos/sengoku.toml", "--path", "/static/css/main.css"])
        .output()
        .expect("run probe");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("content-type: text/css"));
    assert!(stdout.contains("chocolate"));

    let out = probe()
        .args(["--config", "demos/sengoku.toml", "--path", "/html"])
        .output()
        .expect("run probe");
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("<h1>Hello, probe</h1>"));
}

#[test]
fn test_probe_prints_metrics_snapshot() {
    let out = probe()
        .args(["--path", "/about", "--metrics"])
        .output()
        .expect("run probe");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let last = stdout.lines().last().unwrap();
    let snapshot: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!(snapshot["started"], 1);
    assert_eq!(snapshot["completed"], 1);
    assert_eq!(snapshot["server_errors"], 0);
}

#[test]
fn test_probe_logs_to_stderr_at_default_level() {
    let out = probe()
        .env_remove("SENGOKU_LOG_LEVEL")
        .args(["--path", "/home"])
        .output()
        .expect("run probe");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("200 OK"), "stdout was: {stdout}");
    assert!(!stdout.contains("Application built"));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Application built"));
}

#[test]
fn test_probe_async_logging_keeps_metrics_last() {
    let out = probe()
        .env_remove("SENGOKU_LOG_LEVEL")
        .env("SENGOKU_LOG_ASYNC", "true")
        .args(["--path", "/about", "--metrics"])
        .output()
        .expect("run probe");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("200 OK"));
    let snapshot: serde_json::Value =
        serde_json::from_str(stdout.lines().last().unwrap()).unwrap();
    assert_eq!(snapshot["completed"], 1);
}

#[test]
fn test_probe_rejects_root_static_prefix() {
    let out = probe()
        .env("SENGOKU_STATIC_DIR", "demos/static")
        .env("SENGOKU_STATIC_PREFIX", "/")
        .args(["--path", "/home"])
        .output()
        .expect("run probe");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("names no path segment"));
}
