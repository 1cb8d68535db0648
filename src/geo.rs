//! Department boundaries for the choropleth map
//!
//! The GeoJSON file is optional. When it is missing or unusable the map tab
//! falls back to a bar chart, so loading never fails hard.

use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur when reading a boundary file
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Failed to read GeoJSON: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse GeoJSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("GeoJSON is not a FeatureCollection")]
    NotFeatureCollection,
}

/// A validated GeoJSON FeatureCollection, kept verbatim for serving
#[derive(Debug, Clone)]
pub struct Boundaries {
    body: String,
    features: usize,
    unnamed: usize,
}

impl Boundaries {
    /// Parse and validate GeoJSON text
    ///
    /// `feature_id_key` is the dotted path (e.g. `properties.NOMBRE_DPT`)
    /// the map matches department names against; features lacking it are
    /// counted so they can be reported.
    pub fn parse(body: String, feature_id_key: &str) -> Result<Self, GeoError> {
        let value: Value = serde_json::from_str(&body)?;
        if value.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
            return Err(GeoError::NotFeatureCollection);
        }
        let features = value
            .get("features")
            .and_then(Value::as_array)
            .ok_or(GeoError::NotFeatureCollection)?;

        let unnamed = features
            .iter()
            .filter(|feature| lookup_path(feature, feature_id_key).is_none())
            .count();

        Ok(Self {
            features: features.len(),
            unnamed,
            body,
        })
    }

    pub fn from_file(path: &Path, feature_id_key: &str) -> Result<Self, GeoError> {
        let body = fs::read_to_string(path)?;
        Self::parse(body, feature_id_key)
    }

    /// Raw GeoJSON text
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn feature_count(&self) -> usize {
        self.features
    }

    /// Features without a value at the feature id key
    pub fn unnamed_count(&self) -> usize {
        self.unnamed
    }
}

/// Load the boundary file if there is one
///
/// Read or parse failures are logged and treated like a missing file.
pub fn load_boundaries(path: Option<&Path>, feature_id_key: &str) -> Option<Boundaries> {
    let Some(path) = path else {
        warn!("No GeoJSON boundary file found; the map tab will show a bar chart");
        return None;
    };

    match Boundaries::from_file(path, feature_id_key) {
        Ok(boundaries) => {
            info!(
                "Loaded {} department boundaries from {}",
                boundaries.feature_count(),
                path.display()
            );
            if boundaries.unnamed_count() > 0 {
                warn!(
                    "{} features have no '{}'",
                    boundaries.unnamed_count(),
                    feature_id_key
                );
            }
            Some(boundaries)
        }
        Err(e) => {
            warn!("Ignoring {}: {}", path.display(), e);
            None
        }
    }
}

/// Follow a dotted path through nested JSON objects
fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, key| current.get(key))
        .filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"NOMBRE_DPT": "ANTIOQUIA"}, "geometry": null},
            {"type": "Feature", "properties": {"NOMBRE_DPT": "CALDAS"}, "geometry": null},
            {"type": "Feature", "properties": {}, "geometry": null}
        ]
    }"#;

    #[test]
    fn test_parse_feature_collection() {
        let boundaries = Boundaries::parse(SAMPLE.to_string(), "properties.NOMBRE_DPT").unwrap();
        assert_eq!(boundaries.feature_count(), 3);
        assert_eq!(boundaries.unnamed_count(), 1);
        assert_eq!(boundaries.body(), SAMPLE);
    }

    #[test]
    fn test_rejects_other_geojson() {
        let point = r#"{"type": "Point", "coordinates": [0, 0]}"#;
        let result = Boundaries::parse(point.to_string(), "properties.NOMBRE_DPT");
        assert!(matches!(result, Err(GeoError::NotFeatureCollection)));

        let broken = Boundaries::parse("{".to_string(), "properties.NOMBRE_DPT");
        assert!(matches!(broken, Err(GeoError::ParseError(_))));
    }

    #[test]
    fn test_missing_or_invalid_file_falls_back() {
        assert!(load_boundaries(None, "properties.NOMBRE_DPT").is_none());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("col.geojson");
        fs::write(&path, "not json").unwrap();
        assert!(load_boundaries(Some(&path), "properties.NOMBRE_DPT").is_none());

        fs::write(&path, SAMPLE).unwrap();
        assert!(load_boundaries(Some(&path), "properties.NOMBRE_DPT").is_some());
    }

    #[test]
    fn test_lookup_path() {
        let value: Value = serde_json::from_str(r#"{"a": {"b": "x", "c": null}}"#).unwrap();
        assert_eq!(lookup_path(&value, "a.b").and_then(Value::as_str), Some("x"));
        assert!(lookup_path(&value, "a.c").is_none());
        assert!(lookup_path(&value, "a.d").is_none());
    }
}
