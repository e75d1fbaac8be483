use crate::records::SorRecord;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse a decoder JSON document into a record set.
pub fn parse_sor_json(text: &str) -> Result<SorRecord> {
    serde_json::from_str(text).context("decoding trace JSON")
}

/// Read a decoder JSON document from disk.
pub fn read_sor_json(path: &Path) -> Result<SorRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_sor_json(&text).with_context(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn workspace_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .and_then(|p| p.parent())
            .expect("workspace root")
            .to_path_buf()
    }

    #[test]
    fn reads_sample_trace() {
        let record = read_sor_json(&workspace_root().join("test_data/sample_trace.json")).unwrap();
        let blocks = record.require().unwrap();
        assert_eq!(blocks.fixed.group_index, 147000);
        assert_eq!(blocks.data_points.scale_factors[0].data.len(), 24);
        assert_eq!(blocks.key_events.key_events.len(), 2);
    }

    #[test]
    fn read_reports_path_and_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"fixed_parameters\": 3}").unwrap();
        let err = read_sor_json(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
        assert!(format!("{err:#}").contains("decoding trace JSON"));
    }

    #[test]
    fn reports_malformed_json() {
        let err = parse_sor_json("{\"fixed_parameters\": 3}").unwrap_err();
        assert!(err.to_string().contains("decoding trace JSON"));
    }
}
