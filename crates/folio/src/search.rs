//! Substring and regex search over cached page text.
//!
//! Plain mode case-folds both haystack and needle and scans forward,
//! advancing past each match, so matches never overlap. Folding is done
//! through a folded-byte → original-byte offset map: matched text and
//! context are always sliced from the original page text, even where
//! lowercasing changes byte lengths.
//!
//! Regex mode compiles the query with `regex::RegexBuilder`; a malformed
//! pattern fails the whole operation with `InvalidPattern`. Zero-width
//! matches are advanced past by the iterator, so `a*`-style patterns
//! terminate.

use crate::error::{FolioError, Result};
use crate::types::{SearchHit, SearchMatch};
use regex::RegexBuilder;

/// Characters of context kept on each side of a match.
const CONTEXT_CHARS: usize = 50;

/// Search all pages of a document.
///
/// `pages` is the per-page text in page order (index 0 = page 1). Pages
/// without matches are omitted; within a page, hits are in left-to-right
/// order.
pub fn search_pages(
    pages: &[String],
    query: &str,
    case_sensitive: bool,
    use_regex: bool,
) -> Result<Vec<SearchMatch>> {
    if query.is_empty() {
        return Err(FolioError::invalid_pattern(query, "query must not be empty"));
    }

    // Compile once, reuse across pages.
    let regex = if use_regex {
        Some(
            RegexBuilder::new(query)
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|e| FolioError::invalid_pattern(query, e.to_string()))?,
        )
    } else {
        None
    };

    let mut matches = Vec::new();
    for (page_idx, page) in pages.iter().enumerate() {
        let hits = match &regex {
            Some(regex) => regex_hits(page, regex),
            None => plain_hits(page, query, case_sensitive),
        };
        if !hits.is_empty() {
            matches.push(SearchMatch {
                page: (page_idx + 1) as u32,
                hits,
            });
        }
    }

    Ok(matches)
}

fn regex_hits(page: &str, regex: &regex::Regex) -> Vec<SearchHit> {
    regex
        .find_iter(page)
        .map(|m| SearchHit {
            matched_text: m.as_str().to_string(),
            context: context_window(page, m.start(), m.end()),
        })
        .collect()
}

fn plain_hits(page: &str, query: &str, case_sensitive: bool) -> Vec<SearchHit> {
    if case_sensitive {
        let mut hits = Vec::new();
        let mut start = 0;
        while let Some(pos) = page[start..].find(query) {
            let match_start = start + pos;
            let match_end = match_start + query.len();
            hits.push(hit_at(page, match_start, match_end));
            start = match_end;
        }
        return hits;
    }

    let (folded, offsets) = fold_with_offsets(page);
    let needle = query.to_lowercase();

    let mut hits = Vec::new();
    let mut start = 0;
    while let Some(pos) = folded[start..].find(&needle) {
        let folded_start = start + pos;
        let folded_end = folded_start + needle.len();

        let match_start = offsets[folded_start];
        // The last folded byte maps back to the original character that
        // produced it; include that character whole.
        let last_char_start = offsets[folded_end - 1];
        let match_end = last_char_start
            + page[last_char_start..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(0);

        hits.push(hit_at(page, match_start, match_end));
        start = folded_end;
    }
    hits
}

fn hit_at(page: &str, start: usize, end: usize) -> SearchHit {
    SearchHit {
        matched_text: page[start..end].to_string(),
        context: context_window(page, start, end),
    }
}

/// Lowercase `s`, recording for every folded byte the byte offset of the
/// original character it came from.
fn fold_with_offsets(s: &str) -> (String, Vec<usize>) {
    let mut folded = String::with_capacity(s.len());
    let mut offsets = Vec::with_capacity(s.len() + 1);

    for (orig_idx, ch) in s.char_indices() {
        for lower in ch.to_lowercase() {
            let before = folded.len();
            folded.push(lower);
            for _ in before..folded.len() {
                offsets.push(orig_idx);
            }
        }
    }
    offsets.push(s.len());

    (folded, offsets)
}

/// ±[`CONTEXT_CHARS`] characters around a match, clipped to page bounds and
/// trimmed of surrounding whitespace.
fn context_window(page: &str, start: usize, end: usize) -> String {
    let ctx_start = page[..start]
        .char_indices()
        .rev()
        .nth(CONTEXT_CHARS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let ctx_end = page[end..]
        .char_indices()
        .nth(CONTEXT_CHARS)
        .map(|(i, _)| end + i)
        .unwrap_or(page.len());

    page[ctx_start..ctx_end].trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_plain_case_insensitive_match() {
        let matches = search_pages(&pages(&["Hello World"]), "hello", false, false).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].page, 1);
        assert_eq!(matches[0].hits.len(), 1);
        assert_eq!(matches[0].hits[0].matched_text, "Hello");
        assert!(matches[0].hits[0].context.contains("World"));
    }

    #[test]
    fn test_plain_case_sensitive_no_match() {
        let matches = search_pages(&pages(&["Hello World"]), "hello", true, false).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_plain_matches_do_not_overlap() {
        let matches = search_pages(&pages(&["aaaa"]), "aa", false, false).unwrap();
        assert_eq!(matches[0].hits.len(), 2);
    }

    #[test]
    fn test_plain_repeated_idempotent() {
        let p = pages(&["Hello World, Hello again"]);
        let first = search_pages(&p, "hello", false, false).unwrap();
        let second = search_pages(&p, "hello", false, false).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].hits.len(), 2);
    }

    #[test]
    fn test_pages_without_matches_omitted() {
        let matches =
            search_pages(&pages(&["nothing here", "target", "also nothing"]), "target", false, false)
                .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].page, 2);
    }

    #[test]
    fn test_results_in_page_order() {
        let matches =
            search_pages(&pages(&["x here", "no", "x again"]), "x", false, false).unwrap();
        let page_numbers: Vec<u32> = matches.iter().map(|m| m.page).collect();
        assert_eq!(page_numbers, vec![1, 3]);
    }

    #[test]
    fn test_regex_alternation_order() {
        let matches =
            search_pages(&pages(&["Hello World"]), "Hello|World", false, true).unwrap();
        assert_eq!(matches[0].hits.len(), 2);
        assert_eq!(matches[0].hits[0].matched_text, "Hello");
        assert_eq!(matches[0].hits[1].matched_text, "World");
    }

    #[test]
    fn test_regex_case_insensitive_flag() {
        let matches = search_pages(&pages(&["HELLO"]), "hello", false, true).unwrap();
        assert_eq!(matches[0].hits[0].matched_text, "HELLO");
    }

    #[test]
    fn test_malformed_regex_is_invalid_pattern() {
        let result = search_pages(&pages(&["text"]), "[", false, true);
        assert!(matches!(result, Err(FolioError::InvalidPattern { .. })));
    }

    #[test]
    fn test_zero_width_regex_terminates() {
        let matches = search_pages(&pages(&["abc"]), "x*", false, true).unwrap();
        // Every position yields a zero-width match; the scan must advance.
        assert_eq!(matches[0].hits.len(), 4);
    }

    #[test]
    fn test_empty_query_rejected() {
        let result = search_pages(&pages(&["text"]), "", false, false);
        assert!(matches!(result, Err(FolioError::InvalidPattern { .. })));
    }

    #[test]
    fn test_context_window_clipped_and_trimmed() {
        let page = format!("{}NEEDLE{}", "a".repeat(80), "b".repeat(80));
        let matches = search_pages(&pages(&[&page]), "needle", false, false).unwrap();
        let context = &matches[0].hits[0].context;
        assert_eq!(context.len(), 50 + 6 + 50);
        assert!(context.contains("NEEDLE"));
    }

    #[test]
    fn test_context_at_page_start() {
        let matches = search_pages(&pages(&["Hit at start of page"]), "hit", false, false).unwrap();
        assert!(matches[0].hits[0].context.starts_with("Hit"));
    }

    #[test]
    fn test_context_trims_whitespace() {
        let matches = search_pages(&pages(&["   padded hit   "]), "hit", false, false).unwrap();
        assert_eq!(matches[0].hits[0].context, "padded hit");
    }

    #[test]
    fn test_multibyte_case_folding() {
        let matches = search_pages(&pages(&["Héllo Wörld"]), "wörld", false, false).unwrap();
        assert_eq!(matches[0].hits[0].matched_text, "Wörld");
    }

    #[test]
    fn test_multibyte_expanding_fold() {
        // 'İ' lowercases to "i\u{307}", changing byte length; offsets must
        // still map back into the original string.
        let matches = search_pages(&pages(&["İstanbul"]), "i\u{307}stanbul", false, false).unwrap();
        assert_eq!(matches[0].hits[0].matched_text, "İstanbul");
    }
}
