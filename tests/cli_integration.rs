// CLI integration tests for `feed` and `exec` flows.
use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_cmdring");
    Command::new(exe)
}

fn parse_json_lines(output: &[u8]) -> Vec<Value> {
    let text = std::str::from_utf8(output).expect("utf8");
    text.lines()
        .map(|line| serde_json::from_str(line).expect("valid json"))
        .collect()
}

fn run_with_stdin(args: &[&str], stdin: &[u8]) -> std::process::Output {
    let mut child = cmd()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin)
        .expect("write stdin");
    child.wait_with_output().expect("wait")
}

#[test]
fn feed_prints_last_records_only() {
    // Two-byte chunks turn each line into its own write.
    let output = run_with_stdin(
        &["--capacity", "2", "feed", "--chunk-size", "2"],
        b"1\n2\n3\nunterminated",
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(output.stdout, b"2\n3\n");
}

#[test]
fn feed_default_chunk_commits_small_input_as_one_record() {
    let output = run_with_stdin(&["--capacity", "1", "feed"], b"a\nb\n");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(output.stdout, b"a\nb\n");

    let explicit = run_with_stdin(
        &["--capacity", "1", "feed", "--chunk-size", "4096"],
        b"a\nb\n",
    );
    assert!(explicit.status.success());
    assert_eq!(explicit.stdout, output.stdout);

    let unterminated = run_with_stdin(&["feed"], b"a\nb");
    assert!(unterminated.status.success());
    assert!(unterminated.stdout.is_empty());
}

#[test]
fn zero_chunk_size_is_usage() {
    let output = cmd()
        .args(["feed", "--chunk-size", "0"])
        .stdin(Stdio::null())
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(2));
    let lines = parse_json_lines(&output.stderr);
    assert_eq!(lines.last().expect("error")["error"]["kind"], "Usage");
}

#[test]
fn feed_chunked_commits_only_on_trailing_newline() {
    let temp = tempfile::tempdir().expect("tempdir");
    let input = temp.path().join("input.txt");
    fs::write(&input, b"ab\ncd\n").expect("write input");

    // Chunks "ab\nc" and "d\n": the first does not end in a newline.
    let output = cmd()
        .args(["feed", "--chunk-size", "4", input.to_str().unwrap()])
        .output()
        .expect("feed");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"ab\ncd\n");

    let temp_script = temp.path().join("check.txt");
    fs::write(&temp_script, "write ab\\nc\nwrite d\\n\nstats\n").expect("write script");
    let output = cmd()
        .args(["exec", temp_script.to_str().unwrap()])
        .output()
        .expect("exec");
    let lines = parse_json_lines(&output.stdout);
    assert_eq!(lines[2]["live_records"], 1);
    assert_eq!(lines[2]["stream_len"], 6);
}

#[test]
fn exec_reports_each_operation() {
    let temp = tempfile::tempdir().expect("tempdir");
    let script = temp.path().join("script.txt");
    fs::write(
        &script,
        "\
# three commands
write a\\n
write bb\\n
write ccc\\n
seekto 1 0
read 3
seek end 0
read 10
seek set 10
dump
",
    )
    .expect("write script");

    let output = cmd()
        .args(["exec", script.to_str().unwrap()])
        .output()
        .expect("exec");
    assert!(output.status.success());
    let lines = parse_json_lines(&output.stdout);
    assert_eq!(lines.len(), 9);

    assert_eq!(lines[0]["op"], "write");
    assert_eq!(lines[0]["line"], 2);
    assert_eq!(lines[0]["consumed"], 2);

    assert_eq!(lines[3]["op"], "seekto");
    assert_eq!(lines[3]["position"], 2);
    assert_eq!(lines[3]["record"], 1);

    assert_eq!(lines[4]["data"], "bb\n");
    assert_eq!(lines[4]["position"], 5);

    assert_eq!(lines[5]["position"], 9);
    assert_eq!(lines[6]["len"], 0);

    let error = &lines[7]["error"];
    assert_eq!(error["kind"], "InvalidArgument");
    assert_eq!(error["errno"], libc::EINVAL);

    let records: Vec<&str> = lines[8]["records"]
        .as_array()
        .expect("records")
        .iter()
        .map(|value| value.as_str().expect("str"))
        .collect();
    assert_eq!(records, vec!["a\n", "bb\n", "ccc\n"]);
}

#[test]
fn exec_reads_script_from_stdin() {
    let output = run_with_stdin(
        &["--capacity", "2", "exec"],
        b"write x\\n\nwrite y\\n\nwrite z\\n\nseekto 2 0\nstats\n",
    );
    assert!(output.status.success());
    let lines = parse_json_lines(&output.stdout);
    assert_eq!(lines[3]["error"]["kind"], "InvalidArgument");
    assert_eq!(lines[4]["capacity"], 2);
    assert_eq!(lines[4]["live_records"], 2);
    assert_eq!(lines[4]["stream_len"], 4);
}

#[test]
fn script_syntax_error_is_usage() {
    let output = run_with_stdin(&["exec"], b"write ok\\n\nseek nowhere 3\n");
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let lines = parse_json_lines(&output.stderr);
    let error = &lines.last().expect("error line")["error"];
    assert_eq!(error["kind"], "Usage");
    assert!(error["message"].as_str().unwrap().contains("line 2"));
}

#[test]
fn config_file_sets_capacity_and_flag_overrides() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = temp.path().join("device.json");
    fs::write(&config, r#"{"capacity": 1}"#).expect("write config");

    let output = run_with_stdin(
        &["--config", config.to_str().unwrap(), "feed", "--chunk-size", "2"],
        b"a\nb\n",
    );
    assert!(output.status.success());
    assert_eq!(output.stdout, b"b\n");

    let output = run_with_stdin(
        &[
            "--config",
            config.to_str().unwrap(),
            "--capacity",
            "5",
            "feed",
            "--chunk-size",
            "2",
        ],
        b"a\nb\n",
    );
    assert!(output.status.success());
    assert_eq!(output.stdout, b"a\nb\n");
}

#[test]
fn zero_capacity_is_rejected() {
    let output = cmd()
        .args(["--capacity", "0", "exec"])
        .stdin(Stdio::null())
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(2));
    let lines = parse_json_lines(&output.stderr);
    assert_eq!(lines.last().expect("error")["error"]["kind"], "Usage");
}

#[test]
fn unallocatable_capacity_is_structured_error() {
    let output = cmd()
        .args(["--capacity", &usize::MAX.to_string(), "exec"])
        .stdin(Stdio::null())
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(3));
    let lines = parse_json_lines(&output.stderr);
    assert_eq!(lines.last().expect("error")["error"]["kind"], "OutOfMemory");
}
