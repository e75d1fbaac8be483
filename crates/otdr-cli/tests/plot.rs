use assert_cmd::cargo::cargo_bin_cmd;
use std::{fs, path::PathBuf};
use tempfile::tempdir;

#[test]
fn plot_writes_png_with_config_size() {
    let temp = tempdir().unwrap();
    let out = temp.path().join("trace.png");
    let mut cmd = cargo_bin_cmd!("otdr");
    cmd.args([
        "plot",
        "--input",
        &sample_path("test_data/sample_trace.json"),
        "--config",
        &sample_path("test_data/otdr.toml"),
        "--out",
        out.to_str().unwrap(),
    ]);
    cmd.assert().success();

    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    // IHDR width and height, big-endian
    assert_eq!(u32::from_be_bytes(bytes[16..20].try_into().unwrap()), 640);
    assert_eq!(u32::from_be_bytes(bytes[20..24].try_into().unwrap()), 400);
}

fn sample_path(relative: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join(relative)
        .to_string_lossy()
        .to_string()
}
