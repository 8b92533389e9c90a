//! Optional JSON override for the IMTL set scenarios run against, loaded
//! the same way `validate_targets` loads its per-class target files: a
//! plain `serde::Deserialize` record read with `serde_json` and
//! `anyhow::Context` for the error path.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use hazard_core::ImtlSet;

#[derive(Debug, Deserialize)]
struct ImtlEntry {
    imt: String,
    levels: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ImtlSpec {
    imtls: Vec<ImtlEntry>,
}

/// Reads a JSON file shaped like `{"imtls": [{"imt": "PGA", "levels": [...] }]}`
/// into an [`ImtlSet`].
pub fn load_imtls(path: &Path) -> Result<ImtlSet> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let spec: ImtlSpec =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(ImtlSet::new(spec.imtls.into_iter().map(|e| (e.imt, e.levels)).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_parses_into_contiguous_ranges() {
        let json = r#"{"imtls": [{"imt": "PGA", "levels": [0.01, 0.1]}, {"imt": "SA(0.2)", "levels": [0.05]}]}"#;
        let spec: ImtlSpec = serde_json::from_str(json).unwrap();
        let imtls = ImtlSet::new(spec.imtls.into_iter().map(|e| (e.imt, e.levels)).collect());
        assert_eq!(imtls.len(), 3);
        assert_eq!(imtls.range_for("PGA"), 0..2);
        assert_eq!(imtls.range_for("SA(0.2)"), 2..3);
    }

    #[test]
    fn missing_file_is_a_contextualised_error() {
        let err = load_imtls(Path::new("/nonexistent/hazard-harness-config.json")).unwrap_err();
        assert!(err.to_string().contains("reading"));
    }
}
