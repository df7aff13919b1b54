//! Unit tests for geometry location strategies through the public converter API
//!
//! Tests cover:
//! - Coordinate order for flat and dot-path locators
//! - Strategy priority when several locators could match
//! - Field exclusivity in feature properties
//! - CRS validation and placement
//! - Idempotent default merging

use assert_matches::assert_matches;
use geosniff::conversion::{to_geo, ConversionSpec, GeoConverter, GeometryKind};
use geosniff::error::ConversionErrorKind;
use serde_json::{json, Value};

fn feature_geometry(record: Value, spec: &ConversionSpec) -> Value {
    to_geo(&record, spec).unwrap().geojson["geometry"].clone()
}

#[cfg(test)]
mod coordinate_order_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_output_is_always_lng_lat() {
        let records = [
            json!({"lat": 41.8, "lng": -87.6}),
            json!({"lat": "-33.9", "lng": "151.2"}),
            json!({"lat": 0, "lng": 180}),
        ];

        for record in records {
            let geometry = feature_geometry(record.clone(), &ConversionSpec::point("lat", "lng"));
            let lat: f64 = record["lat"].to_string().trim_matches('"').parse().unwrap();
            let lng: f64 = record["lng"].to_string().trim_matches('"').parse().unwrap();
            assert_eq!(geometry["coordinates"][0].as_f64(), Some(lng));
            assert_eq!(geometry["coordinates"][1].as_f64(), Some(lat));
        }
    }

    #[test]
    fn test_field_order_in_record_does_not_matter() {
        let spec = ConversionSpec::point("y", "x");
        let geometry = feature_geometry(json!({"x": 5, "y": 6}), &spec);
        assert_eq!(geometry["coordinates"], json!([5, 6]));
    }

    #[test]
    fn test_dot_path_pair_and_triple() {
        let pair = ConversionSpec::new().with_locator(GeometryKind::Point, json!(["loc.lat", "loc.lng"]));
        let geometry = feature_geometry(json!({"loc": {"lat": 1.25, "lng": 2.75}}), &pair);
        assert_eq!(geometry["coordinates"], json!([2.75, 1.25]));

        let triple = ConversionSpec::new()
            .with_locator(GeometryKind::Point, json!(["loc.lat", "loc.lng", "loc.alt"]));
        let geometry = feature_geometry(json!({"loc": {"lat": 1, "lng": 2, "alt": 3}}), &triple);
        assert_eq!(geometry["coordinates"], json!([2, 1, 3]));
    }
}

#[cfg(test)]
mod priority_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flat_field_beats_dot_path_of_same_name() {
        // A key literally named "a.b" is a flat field, not a path
        let spec = ConversionSpec::new().with_locator(GeometryKind::Point, json!(["a.lat", "a.lng"]));
        let record = json!({"a.lat": 1, "a.lng": 2, "a": {"lat": 10, "lng": 20}});
        assert_eq!(feature_geometry(record, &spec)["coordinates"], json!([2, 1]));
    }

    #[test]
    fn test_literal_geojson_field_is_verbatim() {
        let shape = json!({"type": "MultiPoint", "coordinates": [[1, 2], [3, 4]]});
        let spec = ConversionSpec::new().with_locator(GeometryKind::GeoJson, json!("shape"));
        let result = to_geo(&json!({"shape": shape.clone(), "id": 1}), &spec).unwrap();
        assert_eq!(result.geojson["geometry"], shape);
        assert_eq!(result.geojson["properties"], json!({"id": 1}));
    }

    #[test]
    fn test_composite_polygon_concatenates_points() {
        let spec = ConversionSpec::new().with_locator(
            GeometryKind::Polygon,
            json!({"corner1": ["lat", "lng"], "corner2": ["lat", "lng"]}),
        );
        let record = json!({
            "corner1": {"lat": 1, "lng": 2},
            "corner2": {"lat": 3, "lng": 4},
            "label": "box"
        });
        let result = to_geo(&record, &spec).unwrap();
        assert_eq!(
            result.geojson["geometry"],
            json!({"type": "Polygon", "coordinates": [[2, 1], [4, 3]]})
        );
        assert_eq!(result.geojson["properties"], json!({"label": "box"}));
    }

    #[test]
    fn test_unresolved_path_record_is_dropped_even_when_throwing() {
        let spec = ConversionSpec::new()
            .with_locator(GeometryKind::Point, json!(["pos.lat", "pos.lng"]))
            .with_throw_on_invalid_geometry(true);
        let records = json!([{"pos": {"lat": 1, "lng": 2}}, {"pos": {"lat": 1}}]);
        let result = to_geo(&records, &spec).unwrap();
        assert_eq!(result.metadata.feature_count, 1);
        assert_eq!(result.metadata.dropped_count, 1);
    }
}

#[cfg(test)]
mod properties_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_geometry_fields_and_excludes_never_leak() {
        let spec = ConversionSpec::point("lat", "lng")
            .with_exclude(["secret"])
            .with_extra(json!({"lat": "overridden", "secret": "z"}));
        let records = json!([
            {"lat": 1, "lng": 2, "secret": "x", "name": "a"},
            {"lat": 3, "lng": 4, "secret": "y", "name": "b"}
        ]);
        let result = to_geo(&records, &spec).unwrap();
        for feature in result.geojson["features"].as_array().unwrap() {
            let properties = feature["properties"].as_object().unwrap();
            for key in ["lat", "lng", "secret"] {
                assert!(!properties.contains_key(key), "{} leaked", key);
            }
            assert!(properties.contains_key("name"));
        }
    }

    #[test]
    fn test_extra_and_extra_global() {
        let spec = ConversionSpec::point("lat", "lng")
            .with_extra(json!({"source": "survey"}))
            .with_extra_global(json!({"dataset": "cities"}));
        let result = to_geo(&json!([{"lat": 1, "lng": 2}]), &spec).unwrap();
        assert_eq!(result.geojson["features"][0]["properties"], json!({"source": "survey"}));
        assert_eq!(result.geojson["properties"], json!({"dataset": "cities"}));
    }

    #[test]
    fn test_keep_invalid_geometries() {
        let spec = ConversionSpec::point("lat", "lng").with_remove_invalid_geometries(false);
        let result = to_geo(&json!([{"lat": 1, "lng": 2}, {"name": "x"}]), &spec).unwrap();
        let features = result.geojson["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[1]["geometry"], Value::Null);
    }
}

#[cfg(test)]
mod crs_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn convert_with_crs(crs: Value) -> Result<Value, ConversionErrorKind> {
        let spec = ConversionSpec::point("lat", "lng").with_crs(crs);
        to_geo(&json!([{"lat": 1, "lng": 2}]), &spec)
            .map(|result| result.geojson)
            .map_err(|e| e.kind().cloned().unwrap())
    }

    #[test]
    fn test_valid_crs_is_attached() {
        let crs = json!({"type": "name", "properties": {"name": "EPSG:4326"}});
        assert_eq!(convert_with_crs(crs.clone()).unwrap()["crs"], crs);

        let link = json!({"type": "link", "properties": {"href": "http://example.com/crs", "type": "proj4"}});
        assert!(convert_with_crs(link).is_ok());
    }

    #[test]
    fn test_invalid_crs_always_fails() {
        let invalid = [
            json!({"type": "name"}),
            json!({"type": "name", "properties": {}}),
            json!({"type": "link", "properties": {"href": "http://example.com/crs"}}),
            json!({"type": "epsg", "properties": {"code": 4326}}),
        ];
        for crs in invalid {
            assert_matches!(convert_with_crs(crs), Err(ConversionErrorKind::InvalidCrs { .. }));
        }
    }

    #[test]
    fn test_postgres_crs_goes_under_geometry() {
        let crs = json!({"type": "name", "properties": {"name": "EPSG:4326"}});
        let spec = ConversionSpec::point("lat", "lng").with_crs(crs.clone()).with_postgres(true);
        let result = to_geo(&json!({"lat": 1, "lng": 2}), &spec).unwrap();
        assert_eq!(result.geojson["geometry"]["crs"], crs);
        assert!(result.geojson.get("crs").is_none());
    }
}

#[cfg(test)]
mod defaults_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_defaults_is_idempotent() {
        let defaults = ConversionSpec::converter_defaults();
        let specs = [
            ConversionSpec::point("lat", "lng"),
            ConversionSpec::loader_default(),
            ConversionSpec::point("lat", "lng").with_throw_on_invalid_geometry(true),
            ConversionSpec::new().with_setting("exclude", Value::Null),
        ];
        for spec in specs {
            let once = spec.apply_defaults(&defaults);
            assert_eq!(once.apply_defaults(&defaults), once);
        }
    }

    #[test]
    fn test_explicit_settings_win_over_defaults() {
        let spec = ConversionSpec::point("lat", "lng").with_throw_on_invalid_geometry(true);
        let merged = spec.apply_defaults(&ConversionSpec::converter_defaults());
        assert_eq!(merged.get("doThrows"), Some(&json!({"invalidGeometry": true})));
        assert_eq!(merged.get("exclude"), Some(&json!([])));
    }

    #[test]
    fn test_caller_spec_is_untouched_across_calls() {
        let converter = GeoConverter::new();
        let spec = ConversionSpec::point("lat", "lng");
        let before = spec.clone();

        converter.to_geo(&json!({"lat": 1, "lng": 2}), &spec).unwrap();
        let second = ConversionSpec::point("y", "x");
        let result = converter.to_geo(&json!({"lat": 1, "lng": 2, "y": 3, "x": 4}), &second).unwrap();

        assert_eq!(spec, before);
        // lat/lng from the first call must not be excluded in the second
        assert_eq!(result.geojson["properties"], json!({"lat": 1, "lng": 2}));
    }

    #[test]
    fn test_missing_geometry_is_invalid_specification() {
        let err = to_geo(&json!({}), &ConversionSpec::new().with_exclude(["a"])).unwrap_err();
        assert_matches!(err.kind(), Some(ConversionErrorKind::InvalidSpecification { .. }));
    }
}
