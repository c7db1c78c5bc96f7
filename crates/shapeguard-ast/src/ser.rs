//! JSON serialization for specs
//!
//! Shape specs (and anything built from them, such as signatures) are plain
//! serde data; this module fixes the JSON layout and adds file helpers.

use crate::dim::ShapeSpec;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Serialization error
#[derive(Error, Debug)]
pub enum SerError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SerError>;

// ============ Shape specs ============

/// Serialize a shape spec to pretty JSON
pub fn spec_to_json(spec: &ShapeSpec) -> Result<String> {
    Ok(serde_json::to_string_pretty(spec)?)
}

/// Deserialize a shape spec from JSON
pub fn spec_from_json(json: &str) -> Result<ShapeSpec> {
    Ok(serde_json::from_str(json)?)
}

// ============ Generic ============

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Compact JSON (no whitespace)
pub fn to_json_compact<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    Ok(serde_json::from_str(json)?)
}

// ============ File I/O ============

/// Write any serializable value to a JSON file
pub fn write_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Read a JSON file
pub fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::DimSpec;
    use crate::expr::SizeExpr;
    use pretty_assertions::assert_eq;

    fn sample() -> ShapeSpec {
        ShapeSpec::new(vec![
            DimSpec::Wildcard,
            DimSpec::fixed(3),
            DimSpec::range(0.0, f64::INFINITY),
            DimSpec::expr(SizeExpr::var("X") + SizeExpr::int(2)),
            DimSpec::range_from(SizeExpr::var("X")),
        ])
    }

    #[test]
    fn test_json_spec() {
        let spec = sample();
        let json = spec_to_json(&spec).unwrap();
        assert!(json.contains("SymbolicEqual"));
        assert!(json.contains("PosInf"));

        let parsed = spec_from_json(&json).unwrap();
        assert_eq!(spec, parsed);
    }

    #[test]
    fn test_json_any_rank() {
        let json = to_json_compact(&ShapeSpec::any_rank()).unwrap();
        assert_eq!(json, "\"AnyRank\"");
        let parsed: ShapeSpec = from_json(&json).unwrap();
        assert!(parsed.is_any_rank());
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("shapeguard-ser-{}.json", std::process::id()));
        write_file(&sample(), &path).unwrap();
        let back: ShapeSpec = read_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(back, sample());
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(spec_from_json("{"), Err(SerError::Json(_))));
    }
}
