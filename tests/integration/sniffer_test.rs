//! Integration tests for format sniffing
//!
//! Exercises the full hypothesis chain through custom `OutputItem`
//! implementations, the way a host hands items over.

use geosniff::error::{ParseError, ParseResult};
use geosniff::parser::delimited::is_csv;
use geosniff::{CellOutput, DataFormat, FormatSniffer, OutputItem, SniffedData};
use serde_json::{json, Value};

/// Host item whose structured accessor is independent of its text
struct HostItem {
    json: Option<Value>,
    text: String,
    bytes: Vec<u8>,
}

impl OutputItem for HostItem {
    fn mime(&self) -> &str {
        "application/x-test"
    }

    fn json(&self) -> ParseResult<Value> {
        self.json
            .clone()
            .ok_or_else(|| ParseError::new("no structured data".to_string(), None))
    }

    fn text(&self) -> String {
        self.text.clone()
    }

    fn data(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod sniffer_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_structured_accessor_wins_over_text() {
        let item = HostItem {
            json: Some(json!([{"a": 1}])),
            text: "a,b\n1,2".to_string(),
            bytes: Vec::new(),
        };
        let sniffed = FormatSniffer::new().sniff(&item);
        assert_eq!(sniffed.format, DataFormat::JsonArray);
    }

    #[test]
    fn test_rest_envelope_holding_csv_string() {
        let item = HostItem {
            json: Some(json!({"data": "lat,lng\n1,2\n3,4\n", "status": 200})),
            text: String::new(),
            bytes: Vec::new(),
        };
        let sniffed = FormatSniffer::new().sniff(&item);
        assert_eq!(sniffed.format, DataFormat::Csv);
        assert_eq!(
            sniffed.data,
            SniffedData::Records(vec![
                json!({"lat": "1", "lng": "2"}),
                json!({"lat": "3", "lng": "4"})
            ])
        );
    }

    #[test]
    fn test_malformed_xml_falls_back_to_text() {
        let text = r#"<?xml version="1.0"?><a><b></a>"#;
        let sniffed = FormatSniffer::new().sniff(&CellOutput::from_text("application/xml", text));
        assert_eq!(sniffed.format, DataFormat::Text);
        assert_eq!(sniffed.data, SniffedData::Text(text.to_string()));
    }

    #[test]
    fn test_empty_object_text_is_empty_record() {
        let item = HostItem {
            json: None,
            text: "{}".to_string(),
            bytes: b"{}".to_vec(),
        };
        let sniffed = FormatSniffer::new().sniff(&item);
        assert_eq!(sniffed.data, SniffedData::Record(json!({})));
    }

    #[test]
    fn test_no_text_uses_bytes() {
        let item = HostItem {
            json: None,
            text: String::new(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        };
        let sniffed = FormatSniffer::new().sniff(&item);
        assert_eq!(sniffed.format, DataFormat::Binary);
    }

    #[test]
    fn test_nothing_at_all() {
        let item = HostItem {
            json: None,
            text: String::new(),
            bytes: Vec::new(),
        };
        let sniffed = FormatSniffer::new().sniff(&item);
        assert_eq!(sniffed.format, DataFormat::Empty);
    }
}

#[cfg(test)]
mod csv_boundary_tests {
    use super::*;

    #[test]
    fn test_one_column_is_never_csv() {
        for text in ["lat\n1\n2", "just some words", "a\n\n\n"] {
            assert!(!is_csv(text), "{:?}", text);
        }
    }

    #[test]
    fn test_wide_rows_are_csv() {
        assert!(is_csv("a,b\n1,2,3\n4,5,6,7"));
    }

    #[test]
    fn test_bracketed_header_is_not_csv() {
        assert!(!is_csv("[1,2],3\n4,5,6"));
        assert!(!is_csv("x,{y\n1,2"));
    }

    #[test]
    fn test_eleventh_line_is_not_checked() {
        let mut text = "a,b,c\n".to_string();
        text.push_str(&"1,2,3\n".repeat(9));
        text.push_str("short\n");
        assert!(is_csv(&text));

        let mut text = "a,b,c\n".to_string();
        text.push_str(&"1,2,3\n".repeat(8));
        text.push_str("short\n");
        assert!(!is_csv(&text));
    }
}
