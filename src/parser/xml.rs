//! XML detection and parsing into nested JSON objects
//!
//! Attributes are flattened onto their element (no prefix), namespace
//! prefixes are dropped, repeated child elements become arrays and element
//! text lives under [`TEXT_KEY`] when the element also has attributes or
//! children. Leaf values are coerced to booleans and numbers where they
//! parse as such.

use crate::error::{ParseError, ParseResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

/// Key holding element text next to attributes or children
pub const TEXT_KEY: &str = "value";

/// Check for an XML declaration prologue
pub fn is_xml(text: &str) -> bool {
    text.trim_start_matches('\u{feff}').starts_with("<?xml ")
}

/// Element being built
struct Element {
    fields: Map<String, Value>,
    text: String,
    name: String,
}

impl Element {
    fn root() -> Self {
        Self {
            fields: Map::new(),
            text: String::new(),
            name: String::new(),
        }
    }

    fn open(start: &BytesStart<'_>, source: &str) -> ParseResult<Self> {
        let mut fields = Map::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| {
                ParseError::new(format!("Invalid XML attribute: {}", e), None)
                    .with_preview(crate::parser::repair::preview(source))
            })?;
            let key = attribute.key.as_ref();
            if key == b"xmlns" || key.starts_with(b"xmlns:") {
                continue;
            }
            let value = attribute
                .unescape_value()
                .map_err(|e| ParseError::new(format!("Invalid XML attribute value: {}", e), None))?;
            let name = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            fields.insert(name, coerce_scalar(&value));
        }

        Ok(Self {
            fields,
            text: String::new(),
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        })
    }

    fn close(mut self) -> (String, Value) {
        let text = self.text.trim();
        let value = if self.fields.is_empty() {
            coerce_scalar(text)
        } else {
            if !text.is_empty() {
                self.fields.insert(TEXT_KEY.to_string(), coerce_scalar(text));
            }
            Value::Object(self.fields)
        };
        (self.name, value)
    }

    /// Add a child; repeated names collect into an array
    fn insert(&mut self, name: String, value: Value) {
        match self.fields.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.fields.insert(name, value);
            }
        }
    }
}

/// Parse an XML document into a JSON object keyed by the root element name
pub fn parse_xml(text: &str) -> ParseResult<Value> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack = vec![Element::root()];

    loop {
        let event = reader
            .read_event()
            .map_err(|e| xml_error(&e, text, reader.buffer_position()))?;
        match event {
            Event::Start(start) => stack.push(Element::open(&start, text)?),
            Event::Empty(start) => {
                let (name, value) = Element::open(&start, text)?.close();
                if let Some(parent) = stack.last_mut() {
                    parent.insert(name, value);
                }
            }
            Event::Text(content) => {
                let content = content
                    .unescape()
                    .map_err(|e| xml_error(&e, text, reader.buffer_position()))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&content);
                }
            }
            Event::CData(content) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&content.into_inner()));
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(ParseError::new("Unexpected closing tag".to_string(), None));
                }
                if let Some(element) = stack.pop() {
                    let (name, value) = element.close();
                    if let Some(parent) = stack.last_mut() {
                        parent.insert(name, value);
                    }
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if stack.len() != 1 {
        return Err(ParseError::new(
            format!("Unclosed XML element: {}", stack.last().map_or("", |e| e.name.as_str())),
            None,
        ));
    }

    let document = stack.pop().map(|root| root.fields).unwrap_or_default();
    Ok(Value::Object(document))
}

fn xml_error(error: &quick_xml::Error, text: &str, position: usize) -> ParseError {
    let end = position.min(text.len());
    let line = text.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1;
    ParseError::new(format!("Invalid XML: {}", error), Some((line, 1)))
}

/// Booleans and numbers from leaf text; everything else stays a string
pub fn coerce_scalar(text: &str) -> Value {
    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(integer) = text.parse::<i64>() {
        return Value::from(integer);
    }

    let numeric = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if numeric {
        if let Some(number) = text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            return Value::Number(number);
        }
    }

    Value::String(text.to_string())
}
