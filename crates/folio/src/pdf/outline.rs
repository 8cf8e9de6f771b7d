//! Outline (table of contents) extraction and destination resolution.
//!
//! The catalog's `Outlines` tree is a doubly-linked sibling list with
//! `First`/`Next` pointers. Each node carries a title and, optionally, a
//! destination: either an explicit array whose first element references a
//! page object, or a named destination that must first be looked up in the
//! catalog's `Names` → `Dests` name tree (or the legacy `Dests`
//! dictionary). Page references resolve to 1-based page numbers through a
//! map of page object ids built once per extraction pass.
//!
//! Resolution is best-effort per node: a failure leaves that node without
//! a page number and never aborts the walk. Malformed sibling/child links
//! are guarded by a visited set and a depth cap.

use super::object::{decode_text_string, object_to_string, resolve};
use crate::types::OutlineItem;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};

/// Maximum outline nesting depth; deeper structures are assumed circular.
const MAX_DEPTH: usize = 64;

/// Maximum siblings walked at one level.
const MAX_SIBLINGS: usize = 10_000;

/// Rendered in place of a missing or empty outline.
pub const NO_OUTLINE_TEXT: &str = "No outline available in this document.";

/// Extract the document outline as a forest.
///
/// Returns `None` when the document has no outline, the outline is empty,
/// or the catalog cannot be read.
pub fn extract_outline(doc: &Document) -> Option<Vec<OutlineItem>> {
    let catalog = catalog_dict(doc)?;
    let outlines = resolve(doc, catalog.get(b"Outlines").ok()?)?.as_dict().ok()?;

    let first = match outlines.get(b"First") {
        Ok(Object::Reference(id)) => *id,
        _ => return None,
    };

    let page_numbers = page_number_map(doc);
    let mut visited = HashSet::new();
    let items = walk_siblings(doc, first, 0, &page_numbers, &mut visited);

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Render an outline forest as indented text, two spaces per level, with a
/// ` (Page N)` suffix for entries that resolved to a page.
pub fn format_outline(items: &[OutlineItem]) -> String {
    if items.is_empty() {
        return NO_OUTLINE_TEXT.to_string();
    }

    let mut out = String::new();
    append_formatted(items, &mut out);
    out.truncate(out.trim_end().len());
    out
}

fn append_formatted(items: &[OutlineItem], out: &mut String) {
    for item in items {
        for _ in 0..item.level {
            out.push_str("  ");
        }
        out.push_str(&item.title);
        if let Some(page) = item.page {
            out.push_str(&format!(" (Page {})", page));
        }
        out.push('\n');
        append_formatted(&item.children, out);
    }
}

/// Map every page object id to its 1-based page number, built once per
/// extraction pass so destination resolution is a hash lookup.
fn page_number_map(doc: &Document) -> HashMap<ObjectId, u32> {
    doc.get_pages()
        .iter()
        .map(|(&number, &id)| (id, number))
        .collect()
}

fn catalog_dict(doc: &Document) -> Option<&Dictionary> {
    let root = doc.trailer.get(b"Root").ok()?;
    resolve(doc, root)?.as_dict().ok()
}

fn walk_siblings(
    doc: &Document,
    first: ObjectId,
    level: usize,
    page_numbers: &HashMap<ObjectId, u32>,
    visited: &mut HashSet<ObjectId>,
) -> Vec<OutlineItem> {
    let mut items = Vec::new();
    if level >= MAX_DEPTH {
        tracing::warn!("Outline nesting exceeds {} levels, truncating", MAX_DEPTH);
        return items;
    }

    let mut current = Some(first);
    while let Some(node_id) = current {
        if !visited.insert(node_id) || items.len() >= MAX_SIBLINGS {
            tracing::warn!("Circular or oversized outline at object {:?}", node_id);
            break;
        }

        let Some(node) = doc.get_object(node_id).ok().and_then(|o| o.as_dict().ok()) else {
            break;
        };

        let title = node
            .get(b"Title")
            .ok()
            .and_then(|t| object_to_string(doc, t))
            .unwrap_or_default();

        let page = resolve_node_destination(doc, node, page_numbers);

        let children = match node.get(b"First") {
            Ok(Object::Reference(child_id)) => {
                walk_siblings(doc, *child_id, level + 1, page_numbers, visited)
            }
            _ => Vec::new(),
        };

        items.push(OutlineItem {
            title,
            level,
            page,
            children,
        });

        current = match node.get(b"Next") {
            Ok(Object::Reference(next_id)) => Some(*next_id),
            _ => None,
        };
    }

    items
}

/// Resolve a node's destination to a 1-based page number.
///
/// Checks `Dest` first, then a `GoTo` action's `D` entry.
fn resolve_node_destination(
    doc: &Document,
    node: &Dictionary,
    page_numbers: &HashMap<ObjectId, u32>,
) -> Option<u32> {
    if let Ok(dest) = node.get(b"Dest") {
        if let Some(page) = resolve_destination(doc, dest, page_numbers) {
            return Some(page);
        }
    }

    let action = resolve(doc, node.get(b"A").ok()?)?.as_dict().ok()?;
    match action.get(b"S") {
        Ok(Object::Name(kind)) if kind.as_slice() == b"GoTo" => {
            resolve_destination(doc, action.get(b"D").ok()?, page_numbers)
        }
        _ => None,
    }
}

/// Resolve an explicit or named destination object to a page number.
fn resolve_destination(
    doc: &Document,
    dest: &Object,
    page_numbers: &HashMap<ObjectId, u32>,
) -> Option<u32> {
    match resolve(doc, dest)? {
        // Explicit destination: [page_ref /XYZ left top zoom] etc.
        Object::Array(arr) => {
            let Object::Reference(page_ref) = arr.first()? else {
                return None;
            };
            page_numbers.get(page_ref).copied()
        }
        Object::String(bytes, _) => {
            let name = decode_text_string(bytes);
            resolve_named_destination(doc, &name, page_numbers)
        }
        Object::Name(name) => {
            let name = String::from_utf8_lossy(name).into_owned();
            resolve_named_destination(doc, &name, page_numbers)
        }
        _ => None,
    }
}

/// Look a named destination up in `Names` → `Dests` (name tree) or the
/// legacy catalog `Dests` dictionary.
fn resolve_named_destination(
    doc: &Document,
    name: &str,
    page_numbers: &HashMap<ObjectId, u32>,
) -> Option<u32> {
    let catalog = catalog_dict(doc)?;

    if let Ok(names) = catalog.get(b"Names") {
        if let Some(names) = resolve(doc, names).and_then(|o| o.as_dict().ok()) {
            if let Ok(dests) = names.get(b"Dests") {
                if let Some(tree) = resolve(doc, dests).and_then(|o| o.as_dict().ok()) {
                    let mut depth = 0;
                    if let Some(page) =
                        lookup_name_tree(doc, tree, name, page_numbers, &mut depth)
                    {
                        return Some(page);
                    }
                }
            }
        }
    }

    let dests = resolve(doc, catalog.get(b"Dests").ok()?)?.as_dict().ok()?;
    let value = dests.get(name.as_bytes()).ok()?;
    resolve_destination_value(doc, value, page_numbers)
}

/// Walk a name tree (leaf `Names` arrays, intermediate `Kids`).
fn lookup_name_tree(
    doc: &Document,
    tree: &Dictionary,
    name: &str,
    page_numbers: &HashMap<ObjectId, u32>,
    depth: &mut usize,
) -> Option<u32> {
    *depth += 1;
    if *depth > MAX_DEPTH {
        return None;
    }

    if let Ok(names) = tree.get(b"Names") {
        if let Some(Object::Array(pairs)) = resolve(doc, names) {
            let mut i = 0;
            while i + 1 < pairs.len() {
                let key = resolve(doc, &pairs[i]);
                if let Some(Object::String(key_bytes, _)) = key {
                    if decode_text_string(key_bytes) == name {
                        return resolve_destination_value(doc, &pairs[i + 1], page_numbers);
                    }
                }
                i += 2;
            }
        }
    }

    if let Ok(kids) = tree.get(b"Kids") {
        if let Some(Object::Array(kids)) = resolve(doc, kids) {
            for kid in kids {
                if let Some(kid) = resolve(doc, kid).and_then(|o| o.as_dict().ok()) {
                    if let Some(page) = lookup_name_tree(doc, kid, name, page_numbers, depth) {
                        return Some(page);
                    }
                }
            }
        }
    }

    None
}

/// A named-destination value is either the destination array itself or a
/// dictionary wrapping it under `D`.
fn resolve_destination_value(
    doc: &Document,
    value: &Object,
    page_numbers: &HashMap<ObjectId, u32>,
) -> Option<u32> {
    match resolve(doc, value)? {
        Object::Dictionary(dict) => resolve_destination(doc, dict.get(b"D").ok()?, page_numbers),
        other => resolve_destination(doc, other, page_numbers),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// Two-page document skeleton; returns (doc, page ids, pages id).
    fn two_page_doc() -> (Document, Vec<ObjectId>, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut page_ids = Vec::new();
        for _ in 0..2 {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            page_ids.push(page_id);
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => page_ids.iter().map(|&id| Object::from(id)).collect::<Vec<_>>(),
                "Count" => 2i64,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        (doc, page_ids, pages_id)
    }

    fn catalog_id(doc: &Document) -> ObjectId {
        match doc.trailer.get(b"Root").unwrap() {
            Object::Reference(id) => *id,
            _ => panic!("Root is not a reference"),
        }
    }

    fn attach_outline(doc: &mut Document, first: ObjectId, last: ObjectId) {
        let outlines_id = doc.add_object(dictionary! {
            "Type" => "Outlines",
            "First" => first,
            "Last" => last,
        });
        let cat_id = catalog_id(doc);
        if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(cat_id) {
            catalog.set("Outlines", outlines_id);
        }
    }

    #[test]
    fn test_no_outline_returns_none() {
        let (doc, _, _) = two_page_doc();
        assert!(extract_outline(&doc).is_none());
    }

    #[test]
    fn test_explicit_destination_resolves() {
        let (mut doc, page_ids, _) = two_page_doc();

        let item_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Chapter 1"),
            "Dest" => vec![Object::Reference(page_ids[1]), "XYZ".into(), Object::Null, Object::Null, Object::Null],
        });
        attach_outline(&mut doc, item_id, item_id);

        let outline = extract_outline(&doc).unwrap();
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].title, "Chapter 1");
        assert_eq!(outline[0].level, 0);
        assert_eq!(outline[0].page, Some(2));
    }

    #[test]
    fn test_nested_children_levels() {
        let (mut doc, page_ids, _) = two_page_doc();

        let child_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Section 1.1"),
            "Dest" => vec![Object::Reference(page_ids[0]), "Fit".into()],
        });
        let parent_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Chapter 1"),
            "First" => child_id,
            "Last" => child_id,
            "Dest" => vec![Object::Reference(page_ids[0]), "Fit".into()],
        });
        attach_outline(&mut doc, parent_id, parent_id);

        let outline = extract_outline(&doc).unwrap();
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].level, 0);
        assert_eq!(outline[0].children.len(), 1);
        assert_eq!(outline[0].children[0].level, 1);
        assert_eq!(outline[0].children[0].title, "Section 1.1");
    }

    #[test]
    fn test_goto_action_destination() {
        let (mut doc, page_ids, _) = two_page_doc();

        let action_id = doc.add_object(dictionary! {
            "S" => "GoTo",
            "D" => vec![Object::Reference(page_ids[1]), "Fit".into()],
        });
        let item_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Appendix"),
            "A" => action_id,
        });
        attach_outline(&mut doc, item_id, item_id);

        let outline = extract_outline(&doc).unwrap();
        assert_eq!(outline[0].page, Some(2));
    }

    #[test]
    fn test_named_destination_via_name_tree() {
        let (mut doc, page_ids, _) = two_page_doc();

        let dests_id = doc.add_object(dictionary! {
            "Names" => vec![
                Object::string_literal("chap2"),
                Object::Array(vec![Object::Reference(page_ids[1]), "Fit".into()]),
            ],
        });
        let names_id = doc.add_object(dictionary! {
            "Dests" => dests_id,
        });
        let cat_id = catalog_id(&doc);
        if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(cat_id) {
            catalog.set("Names", names_id);
        }

        let item_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Chapter 2"),
            "Dest" => Object::string_literal("chap2"),
        });
        attach_outline(&mut doc, item_id, item_id);

        let outline = extract_outline(&doc).unwrap();
        assert_eq!(outline[0].page, Some(2));
    }

    #[test]
    fn test_unresolvable_destination_degrades_to_no_page() {
        let (mut doc, _, _) = two_page_doc();

        let item_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Dangling"),
            "Dest" => Object::string_literal("missing-name"),
        });
        attach_outline(&mut doc, item_id, item_id);

        let outline = extract_outline(&doc).unwrap();
        assert_eq!(outline[0].title, "Dangling");
        assert_eq!(outline[0].page, None);
    }

    #[test]
    fn test_circular_sibling_links_terminate() {
        let (mut doc, page_ids, _) = two_page_doc();

        let a_id = doc.new_object_id();
        let b_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("B"),
            "Next" => a_id,
            "Dest" => vec![Object::Reference(page_ids[0]), "Fit".into()],
        });
        doc.objects.insert(
            a_id,
            Object::Dictionary(dictionary! {
                "Title" => Object::string_literal("A"),
                "Next" => b_id,
            }),
        );
        attach_outline(&mut doc, a_id, b_id);

        let outline = extract_outline(&doc).unwrap();
        // A, B visited once each; the back-link to A stops the walk.
        assert_eq!(outline.len(), 2);
    }

    #[test]
    fn test_format_outline_indentation_and_pages() {
        let items = vec![OutlineItem {
            title: "Chapter 1".to_string(),
            level: 0,
            page: Some(1),
            children: vec![OutlineItem {
                title: "Section 1.1".to_string(),
                level: 1,
                page: None,
                children: Vec::new(),
            }],
        }];

        let text = format_outline(&items);
        assert_eq!(text, "Chapter 1 (Page 1)\n  Section 1.1");
    }

    #[test]
    fn test_format_outline_empty_is_sentinel() {
        assert_eq!(format_outline(&[]), NO_OUTLINE_TEXT);
    }
}
