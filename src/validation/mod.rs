//! GeoJSON output validation module

pub mod geojson_compliance;

pub use geojson_compliance::{GeoJsonValidator, IssueSeverity, ValidationIssue, ValidationReport};
