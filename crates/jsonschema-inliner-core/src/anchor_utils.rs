//! Anchor and `$id` resolution utilities.
//!
//! Builds a map from absolute URI strings (incorporating `$id` base URI scoping)
//! to JSON Pointer paths. Used by `resolver::DocumentStore` to resolve
//! `$anchor`-style `$ref` values (e.g., `"#stepId"`) into standard JSON Pointers
//! before the analyzer/rewriter ever see them.

use std::collections::HashMap;

use serde_json::Value;
use url::Url;

use crate::error::InlineError;
use crate::schema_utils::escape_pointer_segment;

/// Default base URI used when no explicit document URI is known.
///
/// We use a `file:` scheme so that `Url::join` works correctly for
/// fragment-only references like `#anchor`.
const DEFAULT_BASE: &str = "file:///schema.json";

/// Build a map of absolute URI strings → JSON Pointer paths by scanning
/// the schema for `$anchor` declarations, respecting `$id` base URI scoping.
///
/// ## Arguments
///
/// * `schema` — The root JSON Schema document.
/// * `base_uri` — The default base URI for the document. Pass `None` to use
///   `file:///schema.json`.
///
/// ## Returns
///
/// A `HashMap<String, String>` where:
/// * **key** = absolute URI with fragment (e.g., `"file:///schema.json#stepId"`)
/// * **value** = JSON Pointer path (e.g., `"#/$defs/step-object"`)
///
/// ## Errors
///
/// This scan never fails on malformed schemas — malformed `$id`/`$anchor`
/// values are simply ignored, leaving the ref unresolvable downstream. The
/// `Result` is kept for symmetry with the rest of the resolution pipeline.
pub(crate) fn build_anchor_map(
    schema: &Value,
    base_uri: Option<&Url>,
) -> Result<HashMap<String, String>, InlineError> {
    let default_base = Url::parse(DEFAULT_BASE).expect("DEFAULT_BASE is a valid URL");
    let base = base_uri.unwrap_or(&default_base);
    let mut map = HashMap::new();
    scan_anchors(schema, base, "#", &mut map)?;
    Ok(map)
}

/// Resolve a `$ref` string against a base URI and look it up in the anchor map.
///
/// Returns `Some(json_pointer)` if the resolved URI maps to an anchor,
/// `None` otherwise.
pub(crate) fn resolve_ref_via_anchor_map(
    ref_str: &str,
    base_uri: &Url,
    anchor_map: &HashMap<String, String>,
) -> Option<String> {
    // Try to resolve the ref_str as a URL against the base URI.
    let resolved = base_uri.join(ref_str).ok()?;
    anchor_map.get(resolved.as_str()).cloned()
}

/// Recursive DFS scanner that builds the anchor map.
///
/// Tracks `current_base` (updated by `$id`) and `pointer` (the JSON Pointer
/// path to the current node).
fn scan_anchors(
    node: &Value,
    current_base: &Url,
    pointer: &str,
    map: &mut HashMap<String, String>,
) -> Result<(), InlineError> {
    let obj = match node {
        Value::Object(obj) => obj,
        Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                let child_pointer = format!("{}/{}", pointer, i);
                scan_anchors(item, current_base, &child_pointer, map)?;
            }
            return Ok(());
        }
        _ => return Ok(()),
    };

    // Check for $id — updates the base URI for this scope and below.
    let scoped_base = if let Some(id_val) = obj.get("$id").and_then(Value::as_str) {
        match current_base.join(id_val) {
            Ok(new_base) => new_base,
            Err(_) => current_base.clone(), // malformed $id — ignore
        }
    } else {
        current_base.clone()
    };

    // Check for $anchor — register it in the map.
    if let Some(anchor_val) = obj.get("$anchor").and_then(Value::as_str) {
        let fragment = format!("#{}", anchor_val);
        if let Ok(absolute_uri) = scoped_base.join(&fragment) {
            let uri_str = absolute_uri.to_string();
            // First-wins: extracted schemas may contain the same $anchor at
            // multiple structural paths (root property + $defs copy). Only
            // the first occurrence is registered.
            map.entry(uri_str).or_insert_with(|| pointer.to_string());
        }
    }

    // Recurse into all child values.
    for (key, val) in obj {
        if key == "$anchor" || key == "$id" {
            continue; // already processed
        }
        let escaped_key = escape_pointer_segment(key);
        let child_pointer = format!("{}/{}", pointer, escaped_key);
        scan_anchors(val, &scoped_base, &child_pointer, map)?;
    }

    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
