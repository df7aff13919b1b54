//! Feature assembly
//!
//! Wraps geometry and the remaining record fields into GeoJSON `Feature`
//! objects and collections, and attaches the optional `crs`, `bbox` and
//! global properties blocks.

use serde_json::{json, Map, Value};

use crate::conversion::builder::{remove_path, Geometry};
use crate::conversion::resolver::{ConversionSettings, ResolvedSpec};
use crate::error::{ConversionError, ConversionErrorKind, ConversionResult};

/// Build one `Feature` from a record and its geometry
pub fn build_feature(record: &Value, geometry: &Geometry, spec: &ResolvedSpec) -> Value {
    json!({
        "type": "Feature",
        "geometry": geometry.to_value(),
        "properties": feature_properties(record, spec),
    })
}

/// Record fields that are neither geometry sources nor excluded
pub fn feature_properties(record: &Value, spec: &ResolvedSpec) -> Map<String, Value> {
    let mut properties: Map<String, Value> = record
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .filter(|(key, _)| !spec.is_reserved(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default();

    for path in spec.settings.exclude.iter().filter(|p| p.contains('.')) {
        remove_path(&mut properties, path);
    }

    if let Some(extra) = &spec.settings.extra {
        for (key, value) in extra.iter().filter(|(key, _)| !spec.is_reserved(key)) {
            properties.insert(key.clone(), value.clone());
        }
    }

    properties
}

/// Wrap features into a `FeatureCollection`
pub fn build_collection(features: Vec<Value>) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Check a CRS object
///
/// `name` CRSs need `properties.name`; `link` CRSs need `properties.href` and
/// `properties.type`. Anything else is rejected.
pub fn validate_crs(crs: &Value) -> ConversionResult<()> {
    let properties = crs.get("properties");
    let has = |key: &str| properties.and_then(|p| p.get(key)).map_or(false, is_truthy);

    match crs.get("type").and_then(Value::as_str) {
        Some("name") if has("name") => Ok(()),
        Some("name") => Err(invalid_crs(r#"properties must contain "name" key"#)),
        Some("link") if has("href") && has("type") => Ok(()),
        Some("link") => Err(invalid_crs(r#"properties must contain "href" and "type" keys"#)),
        _ => Err(invalid_crs(r#"type attribute must be "name" or "link""#)),
    }
}

fn invalid_crs(message: &str) -> ConversionError {
    ConversionError::conversion(ConversionErrorKind::invalid_crs(message))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Attach `crs`, `bbox` and `extraGlobal` to a feature or collection
///
/// A malformed CRS always fails, whatever the error policy says. Falsy
/// `crs` and `bbox` values (`false`, `0`, `""`) are skipped.
pub fn add_optional_properties(
    geojson: &mut Value,
    settings: &ConversionSettings,
) -> ConversionResult<()> {
    let Some(target) = geojson.as_object_mut() else {
        return Ok(());
    };

    if let Some(crs) = settings.crs.as_ref().filter(|crs| is_truthy(crs)) {
        validate_crs(crs)?;
        if settings.is_postgres {
            attach_geometry_crs(target, crs);
        } else {
            target.insert("crs".to_string(), crs.clone());
        }
    }

    if let Some(bbox) = settings.bbox.as_ref().filter(|bbox| is_truthy(bbox)) {
        target.insert("bbox".to_string(), bbox.clone());
    }

    if let Some(extra) = &settings.extra_global {
        let properties = target
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()));
        if !properties.is_object() {
            *properties = Value::Object(Map::new());
        }
        if let Some(properties) = properties.as_object_mut() {
            for (key, value) in extra {
                properties.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(())
}

/// Postgres-style placement: `geometry.crs` on the feature, or on every
/// feature of a collection
fn attach_geometry_crs(target: &mut Map<String, Value>, crs: &Value) {
    let mut placed = 0usize;
    if let Some(Value::Object(geometry)) = target.get_mut("geometry") {
        geometry.insert("crs".to_string(), crs.clone());
        placed += 1;
    }
    if let Some(Value::Array(features)) = target.get_mut("features") {
        for feature in features {
            if let Some(Value::Object(geometry)) = feature.get_mut("geometry") {
                geometry.insert("crs".to_string(), crs.clone());
                placed += 1;
            }
        }
    }
    if placed == 0 {
        log::warn!("No geometry to attach the CRS to");
    }
}
