//! Object-level helpers shared by the lopdf-based extraction modules.

use lopdf::{Document, Object};

/// Follow an indirect reference to its target object.
///
/// Non-reference objects are returned as-is; a dangling reference yields
/// `None`.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Decode a PDF text string: UTF-16BE when BOM-prefixed, otherwise UTF-8
/// with a Latin-1 fallback.
pub(crate) fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => bytes.iter().map(|&b| b as char).collect(),
        }
    }
}

/// Decode a string-valued object (String or Name), resolving references.
pub(crate) fn object_to_string(doc: &Document, obj: &Object) -> Option<String> {
    match resolve(doc, obj)? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}
