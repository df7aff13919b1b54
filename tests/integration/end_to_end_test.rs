//! End-to-end tests: output item in, GeoJSON (or pass-through) out

use assert_matches::assert_matches;
use geosniff::conversion::{ConversionConfig, ConversionSpec, GeometryKind};
use geosniff::{CellOutput, DataFormat, LoadedOutput, OutputLoader};
use serde_json::json;

fn loader(spec: ConversionSpec) -> OutputLoader {
    OutputLoader::with_config(ConversionConfig::new().with_spec(spec))
}

#[cfg(test)]
mod scenario_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_array_to_collection() {
        let item = CellOutput::from_value(&json!([{"lat": 41.8, "lng": -87.6, "name": "Chicago"}]));
        let output = loader(ConversionSpec::point("lat", "lng")).load(&item).unwrap();

        assert_eq!(
            output,
            LoadedOutput::GeoJson(json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [-87.6, 41.8]},
                    "properties": {"name": "Chicago"}
                }]
            }))
        );
    }

    #[test]
    fn test_json_text_is_single_object() {
        let item = CellOutput::from_text("text/plain", "{\"a\":1,\"b\":2}\n");
        let report = loader(ConversionSpec::point("lat", "lng"))
            .load_detailed(&item)
            .unwrap();

        assert_eq!(report.format, DataFormat::Json);
        assert_eq!(report.output, LoadedOutput::Data(json!({"a": 1, "b": 2})));
        assert_eq!(report.metadata.unwrap().record_count, 1);
    }

    #[test]
    fn test_csv_rows_to_features() {
        let item = CellOutput::from_text(
            "text/plain",
            "lat,lng,name\n41.8,-87.6,Chicago\n40.7,-74.0,NYC\n",
        );
        let report = loader(ConversionSpec::point("lat", "lng"))
            .load_detailed(&item)
            .unwrap();

        assert_eq!(report.format, DataFormat::Csv);
        let geojson = report.output.as_value().unwrap();
        assert_eq!(geojson["features"][0]["geometry"]["coordinates"], json!([-87.6, 41.8]));
        assert_eq!(geojson["features"][1]["geometry"]["coordinates"], json!([-74, 40.7]));
        assert_eq!(geojson["features"][1]["properties"], json!({"name": "NYC"}));
        assert_eq!(report.metadata.unwrap().feature_count, 2);
    }

    #[test]
    fn test_existing_features_are_returned_unchanged() {
        let geojson = json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "geometry": null, "properties": {"lat": 1, "lng": 2}}]
        });
        let report = loader(ConversionSpec::point("lat", "lng"))
            .load_detailed(&CellOutput::from_value(&geojson))
            .unwrap();

        assert_eq!(report.format, DataFormat::GeoJson);
        assert_eq!(report.output, LoadedOutput::GeoJson(geojson));
        assert!(report.metadata.is_none());
    }

    #[test]
    fn test_rest_envelope_is_unwrapped() {
        let features = json!([{"type": "Feature", "geometry": {"type": "Point", "coordinates": [1, 2]}, "properties": {}}]);
        let item = CellOutput::from_value(&json!({"data": {"features": features.clone()}, "status": 200}));
        let output = loader(ConversionSpec::point("lat", "lng")).load(&item).unwrap();

        assert_eq!(output, LoadedOutput::GeoJson(json!({"features": features})));
    }

    #[test]
    fn test_composite_polygon() {
        let spec = ConversionSpec::new().with_locator(
            GeometryKind::Polygon,
            json!({"corner1": ["lat", "lng"], "corner2": ["lat", "lng"]}),
        );
        let item = CellOutput::from_value(&json!({
            "corner1": {"lat": 10, "lng": 20},
            "corner2": {"lat": 30, "lng": 40},
            "id": "area-1"
        }));
        let report = loader(spec).load_detailed(&item).unwrap();

        let geojson = report.output.as_value().unwrap();
        assert_eq!(
            geojson["geometry"],
            json!({"type": "Polygon", "coordinates": [[20, 10], [40, 30]]})
        );
        assert_eq!(geojson["properties"], json!({"id": "area-1"}));
        // the point-pair shape is not an RFC 7946 polygon; reported, not fatal
        assert!(!report.validation.unwrap().is_valid());
    }
}

#[cfg(test)]
mod policy_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use geosniff::error::ConversionErrorKind;

    #[test]
    fn test_throwing_policy_propagates_invalid_geometry() {
        let spec = ConversionSpec::point("lat", "lng").with_throw_on_invalid_geometry(true);
        let item = CellOutput::from_value(&json!([{"lat": 1, "lng": 2}, {"city": "nowhere"}]));

        let err = loader(spec.clone()).load(&item).unwrap_err();
        assert_matches!(
            err.kind(),
            Some(ConversionErrorKind::InvalidGeometry { record, .. }) if record.contains("nowhere")
        );

        let report = loader(spec).load_lossy(&item);
        assert_matches!(report.output, LoadedOutput::Data(_));
    }

    #[test]
    fn test_dropped_records_are_counted() {
        let item = CellOutput::from_text(
            "text/csv",
            "lat,lng,name\n1,2,a\nnorth,east,b\n3,4,c\n",
        );
        let report = loader(ConversionSpec::point("lat", "lng"))
            .load_detailed(&item)
            .unwrap();

        let metadata = report.metadata.unwrap();
        assert_eq!(metadata.record_count, 3);
        assert_eq!(metadata.feature_count, 2);
        assert_eq!(metadata.dropped_count, 1);
    }

    #[test]
    fn test_validation_can_be_disabled() {
        let config = ConversionConfig::new()
            .with_spec(ConversionSpec::point("lat", "lng"))
            .with_validation(false);
        let item = CellOutput::from_value(&json!([{"lat": 1, "lng": 2}]));
        let report = OutputLoader::with_config(config).load_detailed(&item).unwrap();
        assert!(report.validation.is_none());
        assert!(report.output.has_features());
    }

    #[test]
    fn test_single_line_xml_document_survives() {
        let spec = ConversionSpec::new()
            .with_locator(GeometryKind::Point, json!(["place.lat", "place.lng"]));
        let item = CellOutput::from_text(
            "text/plain",
            r#"<?xml version="1.0"?><place lat="41.8" lng="-87.6">Chicago, IL</place>"#,
        );
        let report = loader(spec).load_detailed(&item).unwrap();

        assert_eq!(report.format, DataFormat::Xml);
        let geojson = report.output.as_value().unwrap();
        assert_eq!(geojson["geometry"]["coordinates"], json!([-87.6, 41.8]));
    }

    #[test]
    fn test_header_without_rows_is_shown_as_text() {
        let item = CellOutput::from_text("text/plain", "lat,lng");
        let output = loader(ConversionSpec::point("lat", "lng")).load(&item).unwrap();
        assert_eq!(output, LoadedOutput::Text("lat,lng".to_string()));
    }
}
