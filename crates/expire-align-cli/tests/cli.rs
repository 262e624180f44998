use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("expire-align").unwrap()
}

// ── next ────────────────────────────────────────────────────────────────────

#[test]
fn test_next_minute_text() {
    cmd()
        .args(["next", "--interval", "10", "--unit", "minute", "--at", "2026-03-15T14:23:41Z"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("2026-03-15T14:30:00+00:00\t"));
}

#[test]
fn test_next_wraps_to_next_hour() {
    cmd()
        .args(["next", "-i", "10", "-u", "m", "--at", "2026-03-15T14:55:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("2026-03-15T15:00:00+00:00"));
}

#[test]
fn test_next_count_chains_expiries_json() {
    let output = cmd()
        .args([
            "next", "--interval", "5", "--unit", "hour", "--at", "2026-03-15T14:25:48Z", "-n", "3", "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let times: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["expire_at_utc"].as_str().unwrap())
        .collect();
    assert_eq!(
        times,
        vec![
            "2026-03-15T15:00:00+00:00",
            "2026-03-15T20:00:00+00:00",
            "2026-03-16T00:00:00+00:00",
        ]
    );
}

#[test]
fn test_next_in_named_timezone() {
    // 08:15 UTC is 13:45 in Kolkata; a 6-hour grid lands on 18:00 local.
    cmd()
        .args([
            "next", "--interval", "6", "--unit", "hour", "--at", "2026-03-15T08:15:00Z", "--tz", "Asia/Kolkata",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("2026-03-15T18:00:00+05:30"));
}

#[test]
fn test_next_in_dst_zone_on_spring_forward_day() {
    // 05:30 UTC is 00:30 EST; the 5-hour grid lands on 05:00 EDT.
    cmd()
        .args([
            "next", "--interval", "5", "--unit", "hour", "--at", "2026-03-08T05:30:00Z", "--tz", "America/New_York",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("2026-03-08T05:00:00-04:00"));
}

#[test]
fn test_next_daily_grid_in_dst_zone_hits_local_midnight() {
    let output = cmd()
        .args([
            "next", "-i", "24", "-u", "hour", "--at", "2026-03-08T05:30:00Z", "--tz", "America/New_York", "-n", "2",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let local: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["expire_at"].as_str().unwrap())
        .collect();
    assert_eq!(local, vec!["2026-03-09T00:00:00-04:00", "2026-03-10T00:00:00-04:00"]);
}

#[test]
fn test_next_in_dst_zone_on_fall_back_day() {
    // 04:30 UTC is 00:30 EDT; 05:00 that day is already EST.
    cmd()
        .args([
            "next", "--interval", "5", "--unit", "hour", "--at", "2026-11-01T04:30:00Z", "--tz", "America/New_York",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("2026-11-01T05:00:00-05:00"));
}

#[test]
fn test_next_accepts_interval_beyond_u32() {
    cmd()
        .args(["next", "--interval", "5000000000", "--unit", "minute", "--at", "2026-03-15T14:23:41Z"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("2026-03-15T15:00:00+00:00"));
}

#[test]
fn test_next_rejects_zero_interval() {
    cmd()
        .args(["next", "--interval", "0", "--unit", "minute"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval must be greater than 0"));
}

#[test]
fn test_next_rejects_negative_interval() {
    cmd()
        .args(["next", "--interval", "-5", "--unit", "second"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval must be greater than 0"));
}

#[test]
fn test_next_rejects_unknown_unit() {
    cmd()
        .args(["next", "--interval", "5", "--unit", "day"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown interval type"));
}

#[test]
fn test_next_rejects_bad_timezone() {
    cmd()
        .args(["next", "--interval", "5", "--unit", "minute", "--tz", "Mars/Olympus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid timezone"));
}

#[test]
fn test_next_rejects_bad_reference_time() {
    cmd()
        .args(["next", "--interval", "5", "--unit", "minute", "--at", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid reference time"));
}

// ── grid ────────────────────────────────────────────────────────────────────

#[test]
fn test_grid_text() {
    cmd()
        .args(["grid", "--interval", "17", "--unit", "second"])
        .assert()
        .success()
        .stdout("0,17,34,51\n");
}

#[test]
fn test_grid_json() {
    let output = cmd()
        .args(["grid", "--interval", "5", "--unit", "hour", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["interval_type"], "hour");
    assert_eq!(parsed["boundaries"], serde_json::json!([0, 5, 10, 15, 20]));
}

#[test]
fn test_grid_rejects_zero_interval() {
    cmd()
        .args(["grid", "--interval", "0", "--unit", "hour"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval must be greater than 0"));
}
