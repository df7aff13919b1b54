//! Geometry rule resolution
//!
//! Splits a [`ConversionSpec`] into the geometry locators and the general
//! settings, and collects every field name or dot-path consumed as a geometry
//! source. The result is a fresh value per conversion call.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::conversion::spec::{ConversionSpec, GeometryKind};
use crate::error::{ConversionError, ConversionErrorKind, ConversionResult};

/// Where one geometry type's coordinates live within a record
#[derive(Debug, Clone, PartialEq)]
pub enum Locator {
    /// `"coords"`: a field holding coordinates or a literal geometry
    Field(String),
    /// `["lat", "lng"(, "alt")]`: flat field names or dot-paths
    Fields(Vec<String>),
    /// `{"northeast": ["lat", "lng"], ...}`: one point per nested record
    Composite(Vec<(String, Locator)>),
    /// `[{"coordinates": ["lat", "lng"]}]`: ordinal positions inside the
    /// record's own `coordinates` array
    CoordinateContainer(Vec<String>),
}

impl Locator {
    /// Parse a locator from its declarative JSON form
    pub fn from_value(value: &Value) -> ConversionResult<Self> {
        match value {
            Value::String(field) => Ok(Locator::Field(field.clone())),
            Value::Object(parts) => {
                let parts = parts
                    .iter()
                    .map(|(key, inner)| Ok((key.clone(), Locator::from_value(inner)?)))
                    .collect::<ConversionResult<Vec<_>>>()?;
                if parts.is_empty() {
                    return Err(invalid_spec("composite locator has no parts"));
                }
                Ok(Locator::Composite(parts))
            }
            Value::Array(items) => {
                if let Some(order) = items.first().and_then(container_order) {
                    return Ok(Locator::CoordinateContainer(order));
                }
                let fields = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| invalid_spec("locator arrays must hold field names"))?;
                if !(2..=3).contains(&fields.len()) {
                    return Err(invalid_spec(format!(
                        "locator arrays must list 2 or 3 fields, got {}",
                        fields.len()
                    )));
                }
                Ok(Locator::Fields(fields))
            }
            other => Err(invalid_spec(format!("unsupported locator: {}", other))),
        }
    }

    /// Record fields (or dot-paths) this locator consumes
    fn collect_fields(&self, fields: &mut GeometryFieldSet) {
        match self {
            Locator::Field(name) => fields.insert(name),
            Locator::Fields(names) => names.iter().for_each(|name| fields.insert(name)),
            Locator::Composite(parts) => parts.iter().for_each(|(key, _)| fields.insert(key)),
            Locator::CoordinateContainer(_) => fields.insert("coordinates"),
        }
    }
}

/// `{"coordinates": ["lat", "lng"]}` with `coordinates` as its first key
fn container_order(item: &Value) -> Option<Vec<String>> {
    let (key, order) = item.as_object()?.iter().next()?;
    if key != "coordinates" {
        return None;
    }
    order
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

fn invalid_spec(message: impl Into<String>) -> ConversionError {
    ConversionError::conversion(ConversionErrorKind::invalid_specification(message))
}

/// Field names and dot-paths consumed as geometry sources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeometryFieldSet {
    fields: BTreeSet<String>,
}

impl GeometryFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, field: &str) {
        self.fields.insert(field.to_string());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Error policy flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoThrows {
    pub invalid_geometry: bool,
}

/// Non-geometry settings of a specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionSettings {
    /// Property names or dot-paths left out of feature properties
    pub exclude: Vec<String>,
    /// Coordinate reference system, validated before use
    pub crs: Option<Value>,
    pub bbox: Option<Value>,
    /// Properties attached to the top-level output object
    pub extra_global: Option<Map<String, Value>>,
    /// Properties merged into every feature
    pub extra: Option<Map<String, Value>>,
    /// Place the CRS under `geometry.crs` instead of at the top level
    pub is_postgres: bool,
    pub do_throws: DoThrows,
    /// Drop features with empty geometry from collections
    pub remove_invalid_geometries: bool,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            crs: None,
            bbox: None,
            extra_global: None,
            extra: None,
            is_postgres: false,
            do_throws: DoThrows::default(),
            remove_invalid_geometries: true,
        }
    }
}

/// Private working copy of a specification for one conversion
#[derive(Debug, Clone)]
pub struct ResolvedSpec {
    /// Geometry locators in specification order
    pub geometry: Vec<(GeometryKind, Locator)>,
    pub fields: GeometryFieldSet,
    pub settings: ConversionSettings,
    /// Settings as supplied, kept for diagnostics
    pub source: Value,
}

impl ResolvedSpec {
    /// Whether a property key must be left out of feature properties
    pub fn is_reserved(&self, key: &str) -> bool {
        self.fields.contains(key) || self.settings.exclude.iter().any(|e| e == key)
    }
}

/// Separate geometry locators from general settings
pub fn resolve(spec: &ConversionSpec) -> ConversionResult<ResolvedSpec> {
    let mut geometry = Vec::new();
    let mut fields = GeometryFieldSet::new();
    let mut general = Map::new();

    for (key, value) in spec.settings() {
        match GeometryKind::from_key(key) {
            Some(kind) => {
                let locator = Locator::from_value(value)?;
                locator.collect_fields(&mut fields);
                geometry.push((kind, locator));
            }
            None if value.is_null() => {}
            None => {
                general.insert(key.clone(), value.clone());
            }
        }
    }

    if geometry.is_empty() || fields.is_empty() {
        return Err(invalid_spec("no geometry attributes specified"));
    }

    let settings: ConversionSettings = serde_json::from_value(Value::Object(general))
        .map_err(|e| {
            ConversionError::conversion_with_source(
                ConversionErrorKind::invalid_specification(format!("bad setting: {}", e)),
                e.into(),
            )
        })?;

    log::debug!(
        "Resolved {} geometry locator(s) over fields {:?}",
        geometry.len(),
        fields.iter().collect::<Vec<_>>()
    );

    Ok(ResolvedSpec {
        geometry,
        fields,
        settings,
        source: spec.to_value(),
    })
}
