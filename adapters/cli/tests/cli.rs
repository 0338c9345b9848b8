use std::process::{Command, Output};

fn horde_dash(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_horde-dash"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run horde-dash")
}

#[test]
fn short_session_prints_a_summary() {
    let output = horde_dash(&["--seconds", "2", "--seed", "1"]);

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("score="), "{stdout}");
    assert!(stdout.contains("outcome="), "{stdout}");
}

#[test]
fn same_seed_prints_the_same_summary() {
    let first = horde_dash(&["--seconds", "2", "--seed", "1"]);
    let second = horde_dash(&["--seconds", "2", "--seed", "1"]);

    assert!(first.status.success() && second.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn missing_config_file_fails_with_its_path() {
    let output = horde_dash(&["--config", "/definitely/not/here.toml", "--seconds", "1"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("here.toml"));
}
