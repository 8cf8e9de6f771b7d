//! Document metadata extraction.
//!
//! Metadata is treated as an opaque key/value mapping taken from the
//! trailer's Info dictionary, plus the PDF version. Extraction is
//! best-effort: anything unreadable is simply absent from the map.

use super::object::{decode_text_string, object_to_string, resolve};
use lopdf::Document;
use std::collections::BTreeMap;

/// Extract the document's metadata map. Never fails; unreadable or absent
/// entries are omitted.
pub fn extract_metadata(doc: &Document) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("PdfVersion".to_string(), doc.version.clone());

    let Some(info) = info_dictionary(doc) else {
        return metadata;
    };

    for (key, value) in info.iter() {
        let key = decode_text_string(key);
        // Values are typically strings or names; anything else (stream
        // references, arrays) is not representable in an opaque map.
        if let Some(value) = object_to_string(doc, value) {
            metadata.insert(key, value);
        }
    }

    metadata
}

fn info_dictionary(doc: &Document) -> Option<&lopdf::Dictionary> {
    let info = doc.trailer.get(b"Info").ok()?;
    resolve(doc, info)?.as_dict().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Object};

    #[test]
    fn test_metadata_without_info_dict_has_version_only() {
        let doc = Document::with_version("1.7");
        let metadata = extract_metadata(&doc);
        assert_eq!(metadata.get("PdfVersion").map(String::as_str), Some("1.7"));
        assert_eq!(metadata.len(), 1);
    }

    #[test]
    fn test_metadata_from_info_dict() {
        let mut doc = Document::with_version("1.5");
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Annual Report"),
            "Author" => Object::string_literal("Jane Doe"),
            "CreationDate" => Object::string_literal("D:20240101120000Z"),
        });
        doc.trailer.set("Info", info_id);

        let metadata = extract_metadata(&doc);
        assert_eq!(
            metadata.get("Title").map(String::as_str),
            Some("Annual Report")
        );
        assert_eq!(metadata.get("Author").map(String::as_str), Some("Jane Doe"));
        assert_eq!(
            metadata.get("CreationDate").map(String::as_str),
            Some("D:20240101120000Z")
        );
    }

    #[test]
    fn test_metadata_skips_non_string_values() {
        let mut doc = Document::with_version("1.5");
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Ok"),
            "Trapped" => Object::Boolean(true),
        });
        doc.trailer.set("Info", info_id);

        let metadata = extract_metadata(&doc);
        assert!(metadata.contains_key("Title"));
        assert!(!metadata.contains_key("Trapped"));
    }

    #[test]
    fn test_metadata_utf16_title() {
        let mut doc = Document::with_version("1.5");
        // BOM + "Ü"
        let title_bytes = vec![0xFE, 0xFF, 0x00, 0xDC];
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(title_bytes, lopdf::StringFormat::Literal),
        });
        doc.trailer.set("Info", info_id);

        let metadata = extract_metadata(&doc);
        assert_eq!(metadata.get("Title").map(String::as_str), Some("Ü"));
    }
}
