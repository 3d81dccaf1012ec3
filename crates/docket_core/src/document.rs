//! Source document helpers.
//!
//! A single JSON file often carries several sections (tool schemas next to
//! workflows). Sections are addressed by RFC 6901 JSON pointer.

use crate::error::{CoreError, CoreResult};
use serde_json::Value;

/// Parse JSON document text
///
/// # Errors
///
/// Returns `InvalidDocument` if the text is not valid JSON
pub fn parse_document(text: &str) -> CoreResult<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Select a section of a document by JSON pointer
///
/// An empty pointer selects the whole document.
///
/// # Errors
///
/// Returns `InvalidDocument` if nothing exists at `pointer`
pub fn section<'a>(document: &'a Value, pointer: &str) -> CoreResult<&'a Value> {
    if pointer.is_empty() {
        return Ok(document);
    }
    document
        .pointer(pointer)
        .ok_or_else(|| CoreError::InvalidDocument {
            reason: format!("no section at {}", pointer),
        })
}
