use std::fs;
use std::process::Command;

fn viz_bin() -> &'static str {
    env!("CARGO_BIN_EXE_evm-viz")
}

fn write_temp_text(prefix: &str, text: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    let file_name = format!("{}_{}.json", prefix, std::process::id());
    path.push(file_name);
    fs::write(&path, text).expect("write temp text file");
    path
}

fn run(args: &[&str]) -> (bool, String, String) {
    let out = Command::new(viz_bin()).args(args).output().expect("run evm-viz");
    (
        out.status.success(),
        String::from_utf8_lossy(&out.stdout).into_owned(),
        String::from_utf8_lossy(&out.stderr).into_owned(),
    )
}

#[test]
fn list_shows_built_ins() {
    let (ok, stdout, _) = run(&["list"]);
    assert!(ok);
    assert!(stdout.contains("Simple Ethereum Transfer (11 steps)"), "stdout={stdout}");
    assert!(stdout.contains("ERC-20 Token Transfer"), "stdout={stdout}");
}

#[test]
fn show_initial_step_is_empty() {
    let (ok, stdout, _) = run(&["show", "Simple Ethereum Transfer"]);
    assert!(ok);
    assert!(stdout.contains("step: 0/10"), "stdout={stdout}");
    assert!(stdout.contains("opcode: -"));
    assert!(stdout.contains("stack size: 0"));
    assert!(stdout.contains("memory: 0x (0 bytes)"));
    assert!(stdout.contains("gas remaining: 21000"));
}

#[test]
fn show_sstore_step() {
    let (ok, stdout, _) = run(&["show", "simple ethereum transfer", "--step", "6"]);
    assert!(ok);
    assert!(stdout.contains("opcode: SSTORE"), "stdout={stdout}");
    assert!(stdout.contains("gas used: 5014"));
    assert!(stdout.contains(
        "storage 0x0 = 0x0000000000000000000000000000000000000000000000000000000000000060"
    ));
}

#[test]
fn show_final_step_applies_legacy_world_state() {
    let (ok, stdout, _) = run(&["show", "Simple Ethereum Transfer", "--step", "10"]);
    assert!(ok);
    assert!(stdout.contains("gas used: 21000"), "stdout={stdout}");
    assert!(stdout.contains(
        "account 0x742d35Cc6634C0532925a3b844Bc454e4438f44e balance=9.990 nonce=6"
    ));
    assert!(stdout.contains("account 0x1234567890123456789012345678901234567890 balance=5.100 nonce=0"));
}

#[test]
fn show_json_is_parseable() {
    let (ok, stdout, _) = run(&["show", "Simple Ethereum Transfer", "--step", "3", "--json"]);
    assert!(ok);
    let v: serde_json::Value = serde_json::from_str(&stdout).expect("json output");
    assert_eq!(v["current_step"], 3);
    assert_eq!(v["snapshot"]["current_opcode"], "MSTORE");
    assert_eq!(v["is_running"], false);
}

#[test]
fn show_out_of_range_step_fails() {
    let (ok, _, stderr) = run(&["show", "Simple Ethereum Transfer", "--step", "11"]);
    assert!(!ok);
    assert!(stderr.contains("out of range"), "stderr={stderr}");
}

#[test]
fn show_rejects_bad_sender() {
    let (ok, _, stderr) = run(&["show", "Simple Ethereum Transfer", "--from", "742d"]);
    assert!(!ok);
    assert!(stderr.contains("From address must be a valid Ethereum address"), "stderr={stderr}");
}

#[test]
fn custom_gas_limit_resets_remaining() {
    let (ok, stdout, _) = run(&["show", "Simple Ethereum Transfer", "--gas-limit", "50000"]);
    assert!(ok);
    assert!(stdout.contains("gas remaining: 50000"), "stdout={stdout}");
}

#[test]
fn unknown_scenario_fails() {
    let (ok, _, stderr) = run(&["show", "No Such Scenario"]);
    assert!(!ok);
    assert!(stderr.contains("unknown scenario"), "stderr={stderr}");
}

#[test]
fn exported_scenario_loads_from_file() {
    let mut path = std::env::temp_dir();
    path.push(format!("evm_viz_export_{}.json", std::process::id()));
    let out = path.display().to_string();
    let (ok, _, _) = run(&["export", "ERC-20 Token Transfer", "--out", &out]);
    assert!(ok);

    let arg = format!("@{out}");
    let (ok, stdout, _) = run(&["show", &arg, "--step", "5"]);
    assert!(ok);
    assert!(stdout.contains("opcode: LOG3"), "stdout={stdout}");
    assert!(stdout.contains("account 0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), "stdout={stdout}");
}

#[test]
fn malformed_file_is_reported() {
    let path = write_temp_text("evm_viz_bad", "{ \"name\": ");
    let arg = format!("@{}", path.display());
    let (ok, _, stderr) = run(&["show", &arg]);
    assert!(!ok);
    assert!(stderr.contains("malformed scenario"), "stderr={stderr}");
}

#[test]
fn play_runs_to_the_end() {
    let (ok, stdout, _) = run(&["play", "Simple Ethereum Transfer", "--interval", "20"]);
    assert!(ok);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 11, "stdout={stdout}");
    assert!(lines[0].starts_with("step=00/10"));
    assert!(lines[10].starts_with("step=10/10"));
    assert!(lines[6].contains("op=SSTORE"));
}

#[test]
fn play_rejects_unknown_speed() {
    let (ok, _, stderr) = run(&["play", "Simple Ethereum Transfer", "--speed", "warp"]);
    assert!(!ok);
    assert!(stderr.contains("unknown speed 'warp'"), "stderr={stderr}");
}

#[test]
fn disasm_transaction_data() {
    let (ok, stdout, _) = run(&["disasm", "Simple Ethereum Transfer"]);
    assert!(ok);
    assert!(stdout.starts_with("0000: PUSH1 0x80\n0002: PUSH1 0x40\n0004: MSTORE"), "stdout={stdout}");
    assert!(stdout.contains("CALLVALUE"));
}

#[test]
fn gas_profile_lists_sstore_first() {
    let (ok, stdout, _) = run(&["gas", "Simple Ethereum Transfer"]);
    assert!(ok);
    let first = stdout.lines().next().unwrap_or_default();
    assert!(first.starts_with("SSTORE"), "stdout={stdout}");
    assert!(first.contains("5000 gas"));
}
