use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn make_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before UNIX_EPOCH")
        .as_nanos();
    let pid = std::process::id();
    let dir = std::env::temp_dir().join(format!("cmdtree-integ-{prefix}-{pid}-{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn cmdtree() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cmdtree"))
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn assert_success(out: &Output, what: &str) {
    assert!(
        out.status.success(),
        "{what} failed:\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        out.status,
        stdout(out),
        stderr(out),
    );
}

const SUB_COMMANDS: &str = r#"{
  "schemaVersion": 1,
  "settings": { "appName": "dotnet testhost.dll" },
  "app": {
    "name": "App",
    "commands": [
      { "name": "Do1", "params": [ { "name": "Opt1" }, { "name": "Arg1", "positional": true } ] }
    ],
    "subcommands": [
      {
        "name": "Second",
        "commands": [
          { "name": "Do2", "params": [ { "name": "Opt2" }, { "name": "Arg2", "positional": true } ] }
        ],
        "subcommands": [
          {
            "name": "Third",
            "commands": [
              {
                "name": "Do3",
                "params": [
                  { "name": "Opt3", "required": true },
                  { "name": "Arg3", "positional": true, "required": true }
                ],
                "exitCode": 3
              }
            ]
          }
        ]
      }
    ]
  }
}"#;

fn write_manifest(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("cmdtree.json");
    fs::write(&path, json).expect("failed to write manifest");
    path
}

#[test]
fn help_works() {
    let out = cmdtree()
        .arg("--help")
        .output()
        .expect("failed to run cmdtree --help");
    assert_success(&out, "cmdtree --help");
    let text = stdout(&out);
    assert!(
        text.contains("cmdtree") && text.contains("init") && text.contains("check"),
        "unexpected help output:\n{text}"
    );
}

#[test]
fn init_then_check_succeeds() {
    let dir = make_temp_dir("init-check");

    let out = cmdtree()
        .arg("init")
        .arg(&dir)
        .arg("--name")
        .arg("demo")
        .output()
        .expect("failed to run cmdtree init");
    assert_success(&out, "cmdtree init");
    assert!(dir.join("cmdtree.json").is_file(), "cmdtree.json not created");

    let out = cmdtree()
        .arg("init")
        .arg(&dir)
        .output()
        .expect("failed to run cmdtree init");
    assert!(!out.status.success(), "second init must refuse to overwrite");

    let out = cmdtree()
        .current_dir(&dir)
        .arg("check")
        .output()
        .expect("failed to run cmdtree check");
    assert_success(&out, "cmdtree check");
    assert!(stderr(&out).contains("OK: 'demo' declares"), "{}", stderr(&out));

    let out = cmdtree()
        .current_dir(&dir)
        .args(["run", "--", "--version"])
        .output()
        .expect("failed to run cmdtree run");
    assert_success(&out, "cmdtree run -- --version");
    assert_eq!(stdout(&out), "demo\n0.1.0\n");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn check_reports_configuration_errors() {
    let dir = make_temp_dir("check-invalid");
    let manifest = write_manifest(
        &dir,
        r#"{ "app": { "name": "App", "commands": [ { "name": "run", "params": [
             { "name": "host", "short": "h" } ] } ] } }"#,
    );

    let out = cmdtree()
        .arg("check")
        .arg("--manifest")
        .arg(&manifest)
        .arg("--json")
        .output()
        .expect("failed to run cmdtree check");
    assert_eq!(out.status.code(), Some(1));
    let report: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("check --json prints JSON");
    assert_eq!(report["ok"], false);
    assert!(
        report["error"]
            .as_str()
            .unwrap_or_default()
            .contains("reserved for help"),
        "{report}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn tree_prints_outline() {
    let dir = make_temp_dir("tree");
    let manifest = write_manifest(&dir, SUB_COMMANDS);

    let out = cmdtree()
        .arg("tree")
        .arg("-m")
        .arg(&manifest)
        .output()
        .expect("failed to run cmdtree tree");
    assert_success(&out, "cmdtree tree");
    assert_eq!(
        stdout(&out),
        "App\n  Do1  [--Opt1 <STRING>] [<Arg1>]\n  Second\n    Do2  [--Opt2 <STRING>] [<Arg2>]\n    Third\n      Do3  --Opt3 <STRING> <Arg3>\n"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn run_executes_third_level_command() {
    let dir = make_temp_dir("run-third");
    let manifest = write_manifest(&dir, SUB_COMMANDS);

    let out = cmdtree()
        .arg("run")
        .arg("-m")
        .arg(&manifest)
        .args(["--", "Second", "Third", "Do3", "--Opt3", "1111", "somearg"])
        .output()
        .expect("failed to run cmdtree run");
    assert_eq!(out.status.code(), Some(3), "stderr:\n{}", stderr(&out));
    assert_eq!(
        stdout(&out),
        "{\"command\":\"Second Third Do3\",\"args\":{\"Opt3\":\"1111\",\"Arg3\":\"somearg\"}}\n"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn run_shows_help_at_every_level() {
    let dir = make_temp_dir("run-help");
    let manifest = write_manifest(&dir, SUB_COMMANDS);

    let out = cmdtree()
        .arg("run")
        .arg("-m")
        .arg(&manifest)
        .args(["--", "Second", "-h"])
        .output()
        .expect("failed to run cmdtree run");
    assert_success(&out, "cmdtree run -- Second -h");
    assert!(
        stdout(&out).starts_with("Usage: dotnet testhost.dll Second [command]\n"),
        "{}",
        stdout(&out)
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn run_reports_missing_arguments_together() {
    let dir = make_temp_dir("run-missing");
    let manifest = write_manifest(&dir, SUB_COMMANDS);

    let out = cmdtree()
        .arg("run")
        .arg("-m")
        .arg(&manifest)
        .args(["--", "Second", "Third", "Do3"])
        .output()
        .expect("failed to run cmdtree run");
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).is_empty());
    assert!(
        stderr(&out)
            .contains("Required option '--Opt3' is missing\nRequired operand 'Arg3' is missing\n"),
        "{}",
        stderr(&out)
    );

    let _ = fs::remove_dir_all(&dir);
}
