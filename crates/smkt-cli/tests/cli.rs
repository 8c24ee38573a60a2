use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const CASE: &str = r#"function mpc = market3
%% MATPOWER Case Format : Version 2
mpc.version = '2';
mpc.baseMVA = 100;

%% bus data
mpc.bus = [
	1	3	0	0	0	0	1	1	0	135	1	1.05	0.95;
	2	1	0	0	0	0	1	1	0	135	1	1.05	0.95;
];

%% generator data
%	bus	Pg	Qg	Qmax	Qmin	Vg	mBase	status	Pmax	Pmin
mpc.gen = [
	1	0	0	30	-30	1	100	1	100	0;
	2	0	0	0	0	1	100	1	0	-50;
	2	0	0	20	-20	1	100	1	80	10;
];

%% generator cost data
mpc.gencost = [
	2	1500	0	3	0.11	5	150;
	1	0	0	2	-50	-2000	0	0;
	1	3000	100	3	10	200	40	900	80	2100;
];
"#;

const SUBMISSIONS: &str = r#"{
  "offers": {
    "P": {
      "qty": [[60.0, 20.0], [0.0, 0.0], [30.0, 0.0]],
      "prc": [[12.0, 18.0], [0.0, 0.0], [25.0, 0.0]]
    }
  },
  "bids": {
    "P": { "qty": [[20.0]], "prc": [[30.0]] }
  }
}"#;

/// Unit 0 offers 150 against a Pmax of 100
const OFFER_ABOVE_PMAX: &str = r#"{
  "offers": { "P": { "qty": [[150.0], [0.0], [0.0]], "prc": [[10.0], [0.0], [0.0]] } }
}"#;

fn write_inputs(dir: &Path, submissions: &str) -> (PathBuf, PathBuf) {
    let case = dir.join("market3.m");
    let sub = dir.join("offers.json");
    fs::write(&case, CASE).unwrap();
    fs::write(&sub, submissions).unwrap();
    (case, sub)
}

fn smkt() -> Command {
    Command::cargo_bin("smkt").unwrap()
}

#[test]
fn smkt_clear_writes_case_and_report() {
    let dir = tempdir().unwrap();
    let (case, sub) = write_inputs(dir.path(), SUBMISSIONS);
    let out = dir.path().join("cleared.m");
    let report = dir.path().join("report.json");

    smkt()
        .args([
            "clear",
            case.to_str().unwrap(),
            "-s",
            sub.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("UNIT"))
        .stdout(predicate::str::contains("3 units, 0 shut down"));

    let cleared = smkt_io::parse_case_file(&out).unwrap();
    assert_eq!(cleared.gen[0].pmax, 80.0);
    assert_eq!(cleared.gen[1].pmin, -20.0);
    assert_eq!(cleared.gen[2].pmax, 30.0);
    assert!(fs::read_to_string(&out).unwrap().contains("mpc.bus = ["));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["units"], 3);
    assert_eq!(value["outcomes"][1]["is_load"], true);
}

#[test]
fn smkt_clear_strict_rejects_warnings() {
    let dir = tempdir().unwrap();
    let (case, sub) = write_inputs(dir.path(), OFFER_ABOVE_PMAX);
    let out = dir.path().join("cleared.m");

    smkt()
        .args([
            "clear",
            case.to_str().unwrap(),
            "-s",
            sub.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--strict",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rejected in strict mode"));
    assert!(!out.exists());
}

#[test]
fn smkt_clear_no_strict_overrides_config() {
    let dir = tempdir().unwrap();
    let (case, sub) = write_inputs(dir.path(), OFFER_ABOVE_PMAX);
    let config = dir.path().join("smkt.toml");
    fs::write(&config, "[clearing]\nstrict = true\n").unwrap();

    let run = |flag: Option<&str>| {
        let mut cmd = smkt();
        cmd.args(["--config", config.to_str().unwrap(), "clear"]);
        cmd.args([case.to_str().unwrap(), "-s", sub.to_str().unwrap()]);
        if let Some(flag) = flag {
            cmd.arg(flag);
        }
        cmd.assert()
    };

    run(None)
        .failure()
        .stderr(predicate::str::contains("rejected in strict mode"));
    run(Some("--no-strict"))
        .success()
        .stdout(predicate::str::contains("bound_violation"));
}

#[test]
fn smkt_clear_uses_config_limits() {
    let dir = tempdir().unwrap();
    let (case, sub) = write_inputs(dir.path(), SUBMISSIONS);
    let config = dir.path().join("smkt.toml");
    fs::write(
        &config,
        r#"
[limits.p]
max_offer = 15.0

[logging]
level = "warn"
"#,
    )
    .unwrap();

    let output = smkt()
        .args([
            "--config",
            config.to_str().unwrap(),
            "clear",
            case.to_str().unwrap(),
            "-s",
            sub.to_str().unwrap(),
            "--format",
            "json",
            "--serial",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["outcomes"][0]["state"], "active_only");
    assert_eq!(value["outcomes"][0]["p_points"], 2);
    assert_eq!(value["outcomes"][2]["state"], "shut_down");
    assert_eq!(value["shut_down"], 1);
}

#[test]
fn smkt_inspect_lists_units() {
    let dir = tempdir().unwrap();
    let (case, _) = write_inputs(dir.path(), SUBMISSIONS);

    smkt()
        .args(["inspect", case.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("MODEL"))
        .stdout(predicate::str::contains("load"))
        .stdout(predicate::str::contains("Total: 3 units, 3 cost rows"));
}

#[test]
fn smkt_inspect_json() {
    let dir = tempdir().unwrap();
    let (case, _) = write_inputs(dir.path(), SUBMISSIONS);

    let output = smkt()
        .args(["inspect", case.to_str().unwrap(), "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["model"], "poly");
    assert_eq!(value[1]["role"], "load");
    assert_eq!(value[2]["breakpoints"][2][0], 80.0);
}

#[test]
fn smkt_clear_missing_case() {
    let dir = tempdir().unwrap();
    smkt()
        .args([
            "clear",
            dir.path().join("nope.m").to_str().unwrap(),
            "-s",
            dir.path().join("offers.json").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading case file"));
}
