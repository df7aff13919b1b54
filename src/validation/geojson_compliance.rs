//! GeoJSON output compliance validation
//!
//! Checks produced output against the RFC 7946 object shapes: known type
//! names, coordinate nesting depth per geometry type and longitude/latitude
//! ranges. Findings are reported, never enforced; topology is not checked.

use crate::conversion::spec::GeometryKind;
use serde_json::Value;

/// GeoJSON compliance validator
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoJsonValidator;

impl GeoJsonValidator {
    /// Create a new GeoJSON validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a `Feature` or `FeatureCollection`
    pub fn validate(&self, geojson: &Value) -> ValidationReport {
        let mut report = ValidationReport::new();

        match geojson.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => match geojson.get("features").and_then(Value::as_array) {
                Some(features) => {
                    for (i, feature) in features.iter().enumerate() {
                        self.validate_feature(feature, &format!("features[{}]", i), &mut report);
                    }
                }
                None => report.add_error("FeatureCollection has no features array"),
            },
            Some("Feature") => self.validate_feature(geojson, "feature", &mut report),
            Some(other) => report.add_error(&format!("Unexpected top-level type '{}'", other)),
            None => report.add_error("Output has no type"),
        }

        report
    }

    fn validate_feature(&self, feature: &Value, location: &str, report: &mut ValidationReport) {
        if feature.get("type").and_then(Value::as_str) != Some("Feature") {
            report.add_error(&format!("{}: type is not 'Feature'", location));
        }

        if !feature.get("properties").map_or(false, |p| p.is_object() || p.is_null()) {
            report.add_warning(&format!("{}: properties is not an object", location));
        }

        match feature.get("geometry") {
            None | Some(Value::Null) => {
                report.add_warning(&format!("{}: no geometry", location));
            }
            Some(geometry) => {
                report.geometry_count += 1;
                self.validate_geometry(geometry, &format!("{}.geometry", location), report);
            }
        }
    }

    fn validate_geometry(&self, geometry: &Value, location: &str, report: &mut ValidationReport) {
        let type_name = geometry.get("type").and_then(Value::as_str).unwrap_or("");

        if type_name == "GeometryCollection" {
            match geometry.get("geometries").and_then(Value::as_array) {
                Some(members) => {
                    for (i, member) in members.iter().enumerate() {
                        self.validate_geometry(member, &format!("{}.geometries[{}]", location, i), report);
                    }
                }
                None => report.add_error(&format!("{}: GeometryCollection without geometries", location)),
            }
            return;
        }

        let Some(expected) = GeometryKind::from_key(type_name).and_then(|kind| kind.coordinate_depth())
        else {
            report.add_error(&format!("{}: unknown geometry type '{}'", location, type_name));
            return;
        };

        let Some(coordinates) = geometry.get("coordinates") else {
            report.add_error(&format!("{}: missing coordinates", location));
            return;
        };

        match nesting_depth(coordinates) {
            Some(depth) if depth == expected => {
                self.validate_positions(coordinates, location, report);
            }
            Some(depth) => report.add_error(&format!(
                "{}: {} coordinates nested {} deep, expected {}",
                location, type_name, depth, expected
            )),
            None => report.add_error(&format!("{}: coordinates are not numeric arrays", location)),
        }
    }

    fn validate_positions(&self, coordinates: &Value, location: &str, report: &mut ValidationReport) {
        let Some(items) = coordinates.as_array() else {
            return;
        };

        if items.first().map_or(false, Value::is_number) {
            if !(2..=3).contains(&items.len()) {
                report.add_error(&format!("{}: position has {} values", location, items.len()));
                return;
            }
            let lng = items[0].as_f64().unwrap_or(0.0);
            let lat = items[1].as_f64().unwrap_or(0.0);
            if !(-180.0..=180.0).contains(&lng) {
                report.add_warning(&format!("{}: longitude {} out of range", location, lng));
            }
            if !(-90.0..=90.0).contains(&lat) {
                report.add_warning(&format!("{}: latitude {} out of range", location, lat));
            }
            return;
        }

        for item in items {
            self.validate_positions(item, location, report);
        }
    }
}

/// Array depth down to the first number; `None` for non-numeric leaves
fn nesting_depth(value: &Value) -> Option<usize> {
    match value {
        Value::Number(_) => Some(0),
        Value::Array(items) => match items.first() {
            Some(first) => nesting_depth(first).map(|depth| depth + 1),
            None => Some(1),
        },
        _ => None,
    }
}

/// GeoJSON validation report
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Number of non-null geometries inspected
    pub geometry_count: usize,

    /// List of validation issues
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create a new validation report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error to the report
    pub fn add_error(&mut self, message: &str) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Error,
            message: message.to_string(),
        });
    }

    /// Add a warning to the report
    pub fn add_warning(&mut self, message: &str) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Warning,
            message: message.to_string(),
        });
    }

    /// Check if validation passed (no errors)
    pub fn is_valid(&self) -> bool {
        !self
            .issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Error)
    }

    /// Get error count
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error)
            .count()
    }

    /// Get warning count
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
            .count()
    }
}

/// Validation issue
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub message: String,
}

/// Issue severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}
