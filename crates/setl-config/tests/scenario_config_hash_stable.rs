use std::io::Write;

use setl_config::load_layered_config;

const SETTLEMENT_KEY: &str = "QAYR3BKOWKO7ITYDLBWNERKMW56MLCQYGMOIT6I2F744W4VH2TAUQZ4P";

fn write_yaml(dir: &tempfile::TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn scenario_config_hash_stable() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_yaml(
        &dir,
        "base.yaml",
        &format!(
            "SETTLEMENT_ACC_ID: {SETTLEMENT_KEY}\nVALIDATOR_NAMES:\n  {SETTLEMENT_KEY}: core-testnet1\n"
        ),
    );
    // Same document with keys written in the opposite order.
    let reordered = write_yaml(
        &dir,
        "reordered.yaml",
        &format!(
            "VALIDATOR_NAMES:\n  {SETTLEMENT_KEY}: core-testnet1\nSETTLEMENT_ACC_ID: {SETTLEMENT_KEY}\n"
        ),
    );

    let first = load_layered_config(&[base.as_str()]).unwrap();
    let second = load_layered_config(&[base.as_str()]).unwrap();
    let shuffled = load_layered_config(&[reordered.as_str()]).unwrap();

    // Canonicalization makes the hash independent of load run and of key
    // order in the source file.
    assert_eq!(first.config_hash, second.config_hash);
    assert_eq!(first.config_hash, shuffled.config_hash);
    assert_eq!(first.canonical_json, shuffled.canonical_json);

    assert_eq!(
        first.config.settlement_acc_id.as_ref().unwrap().as_str(),
        SETTLEMENT_KEY
    );
    assert_eq!(
        first.config.validator_names.get(SETTLEMENT_KEY).unwrap(),
        "core-testnet1"
    );
}

#[test]
fn scenario_layered_override_changes_hash() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_yaml(
        &dir,
        "base.yaml",
        &format!("SETTLEMENT_ACC_ID: {SETTLEMENT_KEY}\n"),
    );
    let override_key = "QB72TLJLZ4VUGTCJAWRGP7RZ47DPT6OPWYCFB6MF3NGSJINBAO4ZNDSA";
    let overlay = write_yaml(
        &dir,
        "overlay.yaml",
        &format!("SETTLEMENT_ACC_ID: {override_key}\n"),
    );

    let plain = load_layered_config(&[base.as_str()]).unwrap();
    let layered = load_layered_config(&[base.as_str(), overlay.as_str()]).unwrap();

    // Later files win, and the hash tracks the effective document.
    assert_eq!(
        layered.config.settlement_acc_id.as_ref().unwrap().as_str(),
        override_key
    );
    assert_ne!(plain.config_hash, layered.config_hash);
}
