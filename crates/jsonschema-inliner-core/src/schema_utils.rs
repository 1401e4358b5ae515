//! Shared schema utilities for consistent traversal and path construction.
//!
//! Provides two concerns used across the analyzer and rewriter:
//! 1. **JSON Pointer escaping** (RFC 6901) for property keys with `/` or `~`
//! 2. **Shared child-schema traversal** used by the rewriter (§4.D) to visit
//!    every schema-bearing keyword of a 2020-12 object schema
//!
//! The analyzer (§4.C) does not use [`recurse_into_children`] directly — it
//! needs to know, per slot, whether descending into it constitutes an escape
//! route, which this generic walker has no way to express. See
//! `analyzer::walk_children` for that variant.
//!
//! ## Cross-Reference
//!
//! When adding a schema-bearing keyword here, also update the keyword list
//! in `analyzer::walk_children` so both passes agree on which children exist.

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::error::InlineError;

// ---------------------------------------------------------------------------
// JSON Pointer escaping (RFC 6901)
// ---------------------------------------------------------------------------

/// Escape a single path segment per RFC 6901.
///
/// - `~` → `~0`
/// - `/` → `~1`
///
/// Returns `Cow::Borrowed` when no escaping is needed (the common case).
pub fn escape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') || segment.contains('/') {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Build a JSON Pointer path by appending segments to a parent path.
///
/// Each segment is escaped per RFC 6901 before joining.
///
/// # Example
/// ```
/// use jsonschema_inliner_core::build_path;
/// assert_eq!(build_path("#", &["properties", "a/b"]), "#/properties/a~1b");
/// ```
pub fn build_path(parent: &str, segments: &[&str]) -> String {
    let mut path = parent.to_string();
    for segment in segments {
        path.push('/');
        path.push_str(&escape_pointer_segment(segment));
    }
    path
}

/// Unescape a single path segment per RFC 6901.
///
/// - `~1` → `/`
/// - `~0` → `~`
///
/// Order matters: unescape `~1` first to avoid double-unescaping.
/// Returns `Cow::Borrowed` when no unescaping is needed (the common case).
pub fn unescape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains("~0") || segment.contains("~1") {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Split a JSON Pointer path into decoded segments.
///
/// Strips the leading `#` fragment identifier (if present), splits on `/`,
/// and unescapes each segment per RFC 6901.
///
/// # Example
/// ```
/// use jsonschema_inliner_core::split_path;
/// assert_eq!(split_path("#/properties/a~1b/items"), vec!["properties", "a/b", "items"]);
/// assert_eq!(split_path("#"), Vec::<String>::new());
/// ```
pub fn split_path(path: &str) -> Vec<String> {
    let stripped = path.strip_prefix('#').unwrap_or(path);

    // An empty fragment ("#" or "") refers to the whole document.
    if stripped.is_empty() {
        return Vec::new();
    }

    let mut segments_iter = stripped.split('/');

    // A leading "/" produces an initial empty segment from split('/') that
    // represents the root — skip it. Subsequent empty segments are significant
    // per RFC 6901 (e.g. "#/" → [""] refers to the empty-string key).
    if stripped.starts_with('/') {
        segments_iter.next();
    }

    segments_iter
        .map(|s| unescape_pointer_segment(s).into_owned())
        .collect()
}

/// Resolve a JSON Pointer against a document, per RFC 6901.
///
/// Returns `None` if any segment fails to resolve (missing key, out-of-range
/// index, or indexing into a scalar).
pub fn resolve_pointer<'a>(document: &'a Value, pointer: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in split_path(pointer) {
        current = match current {
            Value::Object(map) => map.get(&segment)?,
            Value::Array(arr) => {
                let index: usize = segment.parse().ok()?;
                arr.get(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

// ---------------------------------------------------------------------------
// Shared schema traversal (rewriter only — see module docs)
// ---------------------------------------------------------------------------

/// Recursively visit all schema-bearing children of a 2020-12 JSON Schema
/// object, replacing each with the result of `walk_fn`.
///
/// Uses the extract-recurse-reinsert pattern to avoid borrow conflicts.
///
/// # Keywords visited
///
/// | Category       | Keywords                                                                |
/// |----------------|--------------------------------------------------------------------------|
/// | Object         | `properties`, `patternProperties`, `additionalProperties`,               |
/// |                | `unevaluatedProperties`, `propertyNames`, `dependentSchemas`             |
/// | Array          | `items`, `prefixItems`, `unevaluatedItems`, `contains`                   |
/// | Composition    | `anyOf`, `oneOf`, `allOf`                                                |
/// | Conditional    | `if`, `then`, `else`                                                     |
/// | Negation       | `not`                                                                    |
/// | Definitions    | `$defs`                                                                  |
///
/// `$defs` is included even though no instance ever validates directly
/// against it: every entry still needs its own `$ref`s decided and rewritten
/// so the output never contains a stale, unprocessed reference (see
/// `DESIGN.md` for why this differs from treating `$defs` purely as a
/// reference target).
pub fn recurse_into_children<F>(
    obj: &mut Map<String, Value>,
    path: &str,
    depth: usize,
    walk_fn: &mut F,
) -> Result<(), InlineError>
where
    F: FnMut(&Value, &str, usize) -> Result<Value, InlineError>,
{
    // --- Map-of-schemas keywords ---
    for keyword in [
        "properties",
        "patternProperties",
        "$defs",
        "dependentSchemas",
    ] {
        if let Some(val) = obj.remove(keyword) {
            match val {
                Value::Object(map) => {
                    let mut new_map = Map::new();
                    for (key, val) in map {
                        let child_path = build_path(path, &[keyword, &key]);
                        new_map.insert(key, walk_fn(&val, &child_path, depth + 1)?);
                    }
                    obj.insert(keyword.to_string(), Value::Object(new_map));
                }
                other => {
                    // Not a map-of-schemas — preserve as-is
                    obj.insert(keyword.to_string(), other);
                }
            }
        }
    }

    // --- Single-schema keywords ---
    for keyword in [
        "additionalProperties",
        "unevaluatedProperties",
        "propertyNames",
        "unevaluatedItems",
        "contains",
        "not",
        "if",
        "then",
        "else",
    ] {
        if let Some(val) = obj.remove(keyword) {
            let child_path = build_path(path, &[keyword]);
            let walked = walk_fn(&val, &child_path, depth + 1)?;
            obj.insert(keyword.to_string(), walked);
        }
    }

    // --- Array-of-schemas keywords ---
    for keyword in ["anyOf", "oneOf", "allOf", "prefixItems"] {
        if let Some(val) = obj.remove(keyword) {
            match val {
                Value::Array(variants) => {
                    let mut walked = Vec::with_capacity(variants.len());
                    for (i, variant) in variants.into_iter().enumerate() {
                        let child_path = build_path(path, &[keyword, &i.to_string()]);
                        walked.push(walk_fn(&variant, &child_path, depth + 1)?);
                    }
                    obj.insert(keyword.to_string(), Value::Array(walked));
                }
                other => {
                    // Not an array-of-schemas — preserve as-is
                    obj.insert(keyword.to_string(), other);
                }
            }
        }
    }

    // --- `items` (single schema in 2020-12) ---
    if let Some(items) = obj.remove("items") {
        let child_path = build_path(path, &["items"]);
        let walked = walk_fn(&items, &child_path, depth + 1)?;
        obj.insert("items".to_string(), walked);
    }

    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
