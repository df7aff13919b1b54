//! Geometry building
//!
//! Applies resolved locators to one record. Strategies are tried in a fixed
//! order and the first structural match wins:
//!
//! 1. literal field
//! 2. composite (one point per nested record)
//! 3. flat field triple
//! 4. flat field pair
//! 5. dot-path triple
//! 6. dot-path pair
//! 7. coordinate container
//!
//! Source fields are read as (lat, lng[, alt]) and always emitted as
//! (lng, lat[, alt]).

use serde_json::{json, Map, Number, Value};

use crate::conversion::resolver::{Locator, ResolvedSpec};
use crate::conversion::spec::GeometryKind;

/// Geometry produced for one record
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// No locator matched
    Empty,
    /// `{"type": kind, "coordinates": ...}`
    Shaped { kind: GeometryKind, coordinates: Value },
    /// Geometry object copied verbatim from a record field
    Literal(Value),
}

impl Geometry {
    /// A geometry is usable when it carries a `type`
    pub fn is_valid(&self) -> bool {
        match self {
            Geometry::Empty => false,
            Geometry::Shaped { .. } => true,
            Geometry::Literal(value) => value
                .as_object()
                .map_or(false, |object| object.contains_key("type")),
        }
    }

    pub fn coordinates(&self) -> Option<&Value> {
        match self {
            Geometry::Empty => None,
            Geometry::Shaped { coordinates, .. } => Some(coordinates),
            Geometry::Literal(value) => value.get("coordinates"),
        }
    }

    /// GeoJSON form; empty geometry is `null`
    pub fn to_value(&self) -> Value {
        match self {
            Geometry::Empty => Value::Null,
            Geometry::Shaped { kind, coordinates } => json!({
                "type": kind.as_str(),
                "coordinates": coordinates,
            }),
            Geometry::Literal(value) => value.clone(),
        }
    }
}

/// Geometry building failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// A dot-path locator named a key the record does not have
    #[error("path '{path}' not found in record")]
    UnresolvedPath { path: String },

    /// Nothing matched and the settings ask for a hard failure
    #[error("invalid geometry")]
    Invalid { record: Value, spec: Value },
}

/// Builds geometries for records under one resolved specification
pub struct GeometryBuilder<'a> {
    spec: &'a ResolvedSpec,
}

impl<'a> GeometryBuilder<'a> {
    pub fn new(spec: &'a ResolvedSpec) -> Self {
        Self { spec }
    }

    /// Build the geometry for one record
    ///
    /// Every configured geometry type is tried in specification order; a
    /// later match replaces an earlier one.
    pub fn build(&self, record: &Value) -> Result<Geometry, GeometryError> {
        let mut geometry = Geometry::Empty;
        for (kind, locator) in &self.spec.geometry {
            if let Some(found) = locate(record, *kind, locator)? {
                geometry = found;
            }
        }

        if self.spec.settings.do_throws.invalid_geometry && !geometry.is_valid() {
            return Err(GeometryError::Invalid {
                record: record.clone(),
                spec: self.spec.source.clone(),
            });
        }

        Ok(geometry)
    }
}

/// Apply one locator to a record
fn locate(
    record: &Value,
    kind: GeometryKind,
    locator: &Locator,
) -> Result<Option<Geometry>, GeometryError> {
    match locator {
        Locator::Field(name) => Ok(field(record, name).map(|value| match kind {
            GeometryKind::GeoJson => Geometry::Literal(value.clone()),
            _ => Geometry::Shaped {
                kind,
                coordinates: value.clone(),
            },
        })),
        Locator::Composite(parts) => Ok(composite(record, kind, parts)),
        Locator::Fields(names) => fields(record, kind, names),
        Locator::CoordinateContainer(order) => Ok(container(record, kind, order)),
    }
}

fn composite(record: &Value, kind: GeometryKind, parts: &[(String, Locator)]) -> Option<Geometry> {
    let mut coordinates = Vec::with_capacity(parts.len());
    for (key, inner) in parts {
        let nested = field(record, key).unwrap_or(&Value::Null);
        match locate(nested, GeometryKind::Point, inner) {
            Ok(Some(point)) => match point.coordinates() {
                Some(point) => coordinates.push(point.clone()),
                None => return None,
            },
            Ok(None) | Err(_) => {
                log::debug!("Composite part '{}' has no point", key);
                return None;
            }
        }
    }
    Some(Geometry::Shaped {
        kind,
        coordinates: Value::Array(coordinates),
    })
}

fn fields(
    record: &Value,
    kind: GeometryKind,
    names: &[String],
) -> Result<Option<Geometry>, GeometryError> {
    let present = |count: usize| {
        names.len() >= count && names[..count].iter().all(|name| field(record, name).is_some())
    };
    let nested = |count: usize| names.len() >= count && names[..count].iter().all(|n| is_nested(n));

    let values: Vec<&Value> = if names.len() == 3 && present(3) {
        names.iter().filter_map(|name| field(record, name)).collect()
    } else if present(2) {
        names[..2].iter().filter_map(|name| field(record, name)).collect()
    } else if names.len() == 3 && nested(3) {
        resolve_paths(record, names)?
    } else if nested(2) {
        resolve_paths(record, &names[..2])?
    } else {
        return Ok(None);
    };

    Ok(swapped(&values).map(|coordinates| Geometry::Shaped { kind, coordinates }))
}

fn container(record: &Value, kind: GeometryKind, order: &[String]) -> Option<Geometry> {
    let source = field(record, "coordinates")?.as_array()?;
    let position = |axis: &str| order.iter().position(|name| name == axis);
    let lng = source.get(position("lng")?)?;
    let lat = source.get(position("lat")?)?;
    let coordinates = coordinate_array(&[lng, lat])?;
    Some(Geometry::Shaped { kind, coordinates })
}

/// Top-level field of an object record
fn field<'v>(record: &'v Value, name: &str) -> Option<&'v Value> {
    record.as_object().and_then(|object| object.get(name))
}

/// `container.lat` style paths
fn is_nested(name: &str) -> bool {
    name.char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < name.len())
}

/// Resolve every dot-path, failing on the first missing key
fn resolve_paths<'v>(record: &'v Value, paths: &[String]) -> Result<Vec<&'v Value>, GeometryError> {
    paths
        .iter()
        .map(|path| {
            resolve_path(record, path).ok_or_else(|| GeometryError::UnresolvedPath {
                path: path.clone(),
            })
        })
        .collect()
}

/// Descend a record key by key; numeric segments index into arrays
pub fn resolve_path<'v>(record: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(record, |current, segment| match current {
        Value::Object(object) => object.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// (lat, lng[, alt]) in, (lng, lat[, alt]) out
fn swapped(values: &[&Value]) -> Option<Value> {
    match values {
        [lat, lng] => coordinate_array(&[*lng, *lat]),
        [lat, lng, alt] => coordinate_array(&[*lng, *lat, *alt]),
        _ => None,
    }
}

fn coordinate_array(values: &[&Value]) -> Option<Value> {
    let numbers = values
        .iter()
        .map(|value| number_value(to_number(value)))
        .collect::<Option<Vec<_>>>();
    if numbers.is_none() {
        log::debug!("Non-numeric coordinate in {:?}", values);
    }
    numbers.map(Value::Array)
}

/// Numeric coercion for coordinate values
///
/// Strings are trimmed and parsed (an empty string is zero), booleans map to
/// one and zero, `null` is zero. Anything else is not a number.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null => 0.0,
        Value::Array(items) => match items.as_slice() {
            [] => 0.0,
            [only] => to_number(only),
            _ => f64::NAN,
        },
        Value::Object(_) => f64::NAN,
    }
}

/// Finite numbers only; whole numbers stay integral
fn number_value(n: f64) -> Option<Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Some(Value::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number)
}

/// Drop `path` (a dot-path) from a copy of `properties`
pub(crate) fn remove_path(properties: &mut Map<String, Value>, path: &str) {
    let mut segments = path.split('.');
    let Some(first) = segments.next() else {
        return;
    };
    let rest: Vec<&str> = segments.collect();
    if rest.is_empty() {
        properties.remove(first);
        return;
    }
    if let Some(Value::Object(inner)) = properties.get_mut(first) {
        remove_path(inner, &rest.join("."));
    }
}
