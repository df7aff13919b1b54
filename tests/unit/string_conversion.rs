//! Unit tests for text-to-GeoJSON loading
//!
//! Tests cover:
//! - JSON text, including garbled notebook output
//! - CSV and XML text
//! - Plain text fallback
//! - Error handling for bad specifications

use geosniff::conversion::{ConversionConfig, ConversionSpec};
use geosniff::error::ConversionErrorKind;
use geosniff::{load_text, load_value, LoadedOutput};
use serde_json::json;

fn lat_lng_config() -> ConversionConfig {
    ConversionConfig::new().with_spec(ConversionSpec::point("lat", "lng"))
}

#[cfg(test)]
mod string_conversion_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Test JSON array text conversion
    #[test]
    fn test_json_array_text() {
        let text = r#"[{"lat": 41.8, "lng": -87.6, "name": "Chicago"}]"#;
        let output = load_text(text, &lat_lng_config()).unwrap();

        let LoadedOutput::GeoJson(geojson) = output else {
            panic!("expected GeoJSON, got {:?}", output);
        };
        assert_eq!(geojson["type"], "FeatureCollection");
        assert_eq!(geojson["features"][0]["geometry"]["coordinates"], json!([-87.6, 41.8]));
        assert_eq!(geojson["features"][0]["properties"], json!({"name": "Chicago"}));
    }

    /// Test Python-style quoted output with stringified nested objects
    #[test]
    fn test_garbled_json_text() {
        let text = r#"'{"name": "HQ", "pos": "{\\"lat\\": 1.5, \\"lng\\": 2.5}"}'"#;
        let config = ConversionConfig::new().with_spec(
            ConversionSpec::new().with_locator(
                geosniff::GeometryKind::Point,
                json!(["pos.lat", "pos.lng"]),
            ),
        );
        let output = load_text(text, &config).unwrap();

        let LoadedOutput::GeoJson(geojson) = output else {
            panic!("expected GeoJSON, got {:?}", output);
        };
        assert_eq!(geojson["type"], "Feature");
        assert_eq!(geojson["geometry"]["coordinates"], json!([2.5, 1.5]));
    }

    /// Test CSV text conversion; cell strings are coerced to numbers
    #[test]
    fn test_csv_text() {
        let text = "name,lat,lng\nChicago,41.8,-87.6\nNYC,40.7,-74.0\n";
        let output = load_text(text, &lat_lng_config()).unwrap();

        let geojson = output.as_value().unwrap();
        let features = geojson["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[1]["geometry"]["coordinates"], json!([-74, 40.7]));
        assert_eq!(features[1]["properties"], json!({"name": "NYC"}));
    }

    /// Test XML text conversion through nested paths
    #[test]
    fn test_xml_text() {
        let text = r#"<?xml version="1.0" encoding="UTF-8"?>
<station id="42"><location lat="51.5" lng="-0.12"/></station>"#;
        let config = ConversionConfig::new().with_spec(ConversionSpec::new().with_locator(
            geosniff::GeometryKind::Point,
            json!(["station.location.lat", "station.location.lng"]),
        ));
        let output = load_text(text, &config).unwrap();

        let geojson = output.as_value().unwrap();
        assert_eq!(geojson["geometry"]["coordinates"], json!([-0.12, 51.5]));
    }

    /// Test plain text passes through unconverted
    #[test]
    fn test_plain_text() {
        let output = load_text("Process finished in 3.2s", &lat_lng_config()).unwrap();
        assert_eq!(output, LoadedOutput::Text("Process finished in 3.2s".to_string()));
    }

    /// Test records without any geometry come back as data
    #[test]
    fn test_json_without_geometry() {
        let output = load_text(r#"{"a":1,"b":2}"#, &lat_lng_config()).unwrap();
        assert_eq!(output, LoadedOutput::Data(json!({"a": 1, "b": 2})));
    }

    /// Test the default loader spec (latitude/longitude fields)
    #[test]
    fn test_default_loader_spec() {
        let value = json!([{"latitude": 10, "longitude": 20, "geometry": {"bbox": [0], "kind": "x"}}]);
        let output = load_value(&value).unwrap();

        let geojson = output.as_value().unwrap();
        assert_eq!(geojson["features"][0]["geometry"]["coordinates"], json!([20, 10]));
        // geometry.bbox is excluded by the loader defaults
        assert_eq!(geojson["features"][0]["properties"], json!({"geometry": {"kind": "x"}}));
    }

    /// Test a specification without geometry types fails loudly
    #[test]
    fn test_invalid_specification() {
        let config = ConversionConfig::new().with_spec(ConversionSpec::new().with_exclude(["a"]));
        let err = load_text(r#"[{"lat": 1, "lng": 2}]"#, &config).unwrap_err();
        assert!(matches!(
            err.kind(),
            Some(ConversionErrorKind::InvalidSpecification { .. })
        ));
        assert!(err.user_message().contains("geometry"));
    }
}
