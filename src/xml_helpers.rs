//! Attribute extraction helpers shared by the XLSX readers.
//!
//! Keys are matched exactly (including any namespace prefix). Values are
//! entity-unescaped; malformed values read as missing.

use quick_xml::events::BytesStart;

/// Extract a string attribute value by key.
pub(crate) fn attr_string(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

pub(crate) fn attr_u32(e: &BytesStart, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|s| s.trim().parse().ok())
}

pub(crate) fn attr_f64(e: &BytesStart, key: &[u8]) -> Option<f64> {
    attr_string(e, key)
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Extract a boolean attribute value by key.
///
/// `"1"` and `"true"` are true; any other present value is false.
pub(crate) fn attr_bool(e: &BytesStart, key: &[u8]) -> Option<bool> {
    attr_string(e, key).map(|s| matches!(s.trim(), "1" | "true"))
}

/// Extract the `val` attribute as a string. Very common in XLSX XML.
pub(crate) fn attr_val(e: &BytesStart) -> Option<String> {
    attr_string(e, b"val")
}

pub(crate) fn attr_val_f64(e: &BytesStart) -> Option<f64> {
    attr_f64(e, b"val")
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn make_start(xml: &str) -> BytesStart<'_> {
        // Strip < and > / /> to get just the tag content
        let content = xml
            .trim_start_matches('<')
            .trim_end_matches('>')
            .trim_end_matches('/')
            .trim_end();
        BytesStart::from_content(content, content.find(' ').unwrap_or(content.len()))
    }

    #[test]
    fn test_attr_string_unescapes() {
        let e = make_start(r#"<sheet name="P&amp;L" />"#);
        assert_eq!(attr_string(&e, b"name"), Some("P&L".to_string()));
        assert_eq!(attr_string(&e, b"missing"), None);
    }

    #[test]
    fn test_numeric_attrs() {
        let e = make_start(r#"<col min="2" max="4" width="12.5" bad="wide" inf="inf" />"#);
        assert_eq!(attr_u32(&e, b"min"), Some(2));
        assert_eq!(attr_f64(&e, b"width"), Some(12.5));
        assert_eq!(attr_f64(&e, b"bad"), None);
        assert_eq!(attr_f64(&e, b"inf"), None);
    }

    #[test]
    fn test_attr_bool() {
        let e = make_start(r#"<row a="1" b="0" c="true" d="false" />"#);
        assert_eq!(attr_bool(&e, b"a"), Some(true));
        assert_eq!(attr_bool(&e, b"b"), Some(false));
        assert_eq!(attr_bool(&e, b"c"), Some(true));
        assert_eq!(attr_bool(&e, b"d"), Some(false));
        assert_eq!(attr_bool(&e, b"missing"), None);
    }

    #[test]
    fn test_attr_val() {
        let e = make_start(r#"<sz val="12" />"#);
        assert_eq!(attr_val(&e), Some("12".to_string()));
        assert_eq!(attr_val_f64(&e), Some(12.0));
    }
}
