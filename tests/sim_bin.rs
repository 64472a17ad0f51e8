use std::process::Command;

fn run_sim(seeds: [&str; 2]) -> serde_json::Value {
    let output = Command::new("cargo")
        .args(["run", "--quiet", "--bin", "sim", "--", seeds[0], seeds[1]])
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("failed to run sim binary");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("non utf8 output");
    serde_json::from_str(stdout.trim()).expect("invalid json")
}

#[test]
fn sim_binary_reports_a_finished_match() {
    let v = run_sim(["1", "2"]);
    let winner = v["winner"].as_str().expect("winner is a string");
    assert!(winner == "player1" || winner == "player2");
    assert_eq!(v[winner]["hits"], 17);
    assert!(v[winner]["shots"].as_u64().unwrap() >= 17);
}

#[test]
fn sim_binary_rejects_bad_arguments() {
    let output = Command::new("cargo")
        .args(["run", "--quiet", "--bin", "sim", "--", "1"])
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("failed to run sim binary");
    assert!(!output.status.success());
}
