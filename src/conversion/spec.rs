//! Declarative geometry-mapping specification
//!
//! A [`ConversionSpec`] is the caller-owned settings object: geometry-type keys
//! (`Point`, `Polygon`, ... `GeoJSON`) map to locators, every other key is a
//! general setting (`exclude`, `crs`, `bbox`, ...). It is never mutated by a
//! conversion; the resolver derives a private working copy from it.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Supported geometry object types, plus the literal passthrough kind
///
/// See RFC 7946 §1.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    /// The located field already holds a complete geometry object
    GeoJson,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 7] = [
        GeometryKind::Point,
        GeometryKind::MultiPoint,
        GeometryKind::LineString,
        GeometryKind::MultiLineString,
        GeometryKind::Polygon,
        GeometryKind::MultiPolygon,
        GeometryKind::GeoJson,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::LineString => "LineString",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::GeoJson => "GeoJSON",
        }
    }

    /// Match a settings key against the geometry type names (case sensitive)
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == key)
    }

    /// Coordinate nesting depth required by RFC 7946 §3.1
    pub fn coordinate_depth(&self) -> Option<usize> {
        match self {
            GeometryKind::Point => Some(1),
            GeometryKind::MultiPoint | GeometryKind::LineString => Some(2),
            GeometryKind::MultiLineString | GeometryKind::Polygon => Some(3),
            GeometryKind::MultiPolygon => Some(4),
            GeometryKind::GeoJson => None,
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry-mapping specification supplied once per conversion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversionSpec {
    settings: Map<String, Value>,
}

impl ConversionSpec {
    /// Create an empty specification
    pub fn new() -> Self {
        Self::default()
    }

    /// Specification locating a point from two flat `lat`/`lng` fields
    pub fn point(lat: &str, lng: &str) -> Self {
        Self::new().with_locator(GeometryKind::Point, json!([lat, lng]))
    }

    /// Parse a specification from JSON text
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Default specification used when loading notebook output
    pub fn loader_default() -> Self {
        Self::point("latitude", "longitude")
            .with_remove_invalid_geometries(true)
            .with_exclude(["geometry.bbox", "geometry.type", "geometry.coordinates"])
    }

    /// Converter defaults, merged under every caller specification
    pub fn converter_defaults() -> Self {
        Self::new()
            .with_setting("doThrows", json!({ "invalidGeometry": false }))
            .with_remove_invalid_geometries(true)
            .with_setting("exclude", json!([]))
    }

    /// Set the locator for one geometry type
    pub fn with_locator(self, kind: GeometryKind, locator: Value) -> Self {
        self.with_setting(kind.as_str(), locator)
    }

    /// Set an arbitrary setting
    pub fn with_setting(mut self, key: &str, value: Value) -> Self {
        self.settings.insert(key.to_string(), value);
        self
    }

    /// Property names or dot-paths to leave out of feature properties
    pub fn with_exclude<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths: Vec<Value> = paths.into_iter().map(|p| Value::String(p.into())).collect();
        self.with_setting("exclude", Value::Array(paths))
    }

    pub fn with_crs(self, crs: Value) -> Self {
        self.with_setting("crs", crs)
    }

    pub fn with_bbox(self, bbox: Value) -> Self {
        self.with_setting("bbox", bbox)
    }

    /// Properties attached to the top-level output object
    pub fn with_extra_global(self, properties: Value) -> Self {
        self.with_setting("extraGlobal", properties)
    }

    /// Properties merged into every feature
    pub fn with_extra(self, properties: Value) -> Self {
        self.with_setting("extra", properties)
    }

    pub fn with_postgres(self, enabled: bool) -> Self {
        self.with_setting("isPostgres", Value::Bool(enabled))
    }

    pub fn with_throw_on_invalid_geometry(self, enabled: bool) -> Self {
        self.with_setting("doThrows", json!({ "invalidGeometry": enabled }))
    }

    pub fn with_remove_invalid_geometries(self, enabled: bool) -> Self {
        self.with_setting("removeInvalidGeometries", Value::Bool(enabled))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    pub fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }

    /// Whether any geometry-type key is present
    pub fn has_geometry(&self) -> bool {
        self.settings
            .keys()
            .any(|key| GeometryKind::from_key(key).is_some())
    }

    /// Merge `defaults` into a copy of this specification
    ///
    /// Only keys that are missing (or `null`) are filled in; an explicit
    /// setting is never overwritten, so applying the same defaults twice is a
    /// no-op.
    pub fn apply_defaults(&self, defaults: &ConversionSpec) -> ConversionSpec {
        let mut settings = self.settings.clone();
        for (key, value) in &defaults.settings {
            match settings.get(key) {
                Some(existing) if !existing.is_null() => {}
                _ => {
                    settings.insert(key.clone(), value.clone());
                }
            }
        }
        ConversionSpec { settings }
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.settings.clone())
    }
}
