//! `$defs` name synthesis (§4.C.rewriting) for preserved references.
//!
//! Turns a resolved `(document, json pointer)` pair into a candidate
//! identifier, then [`NameAllocator`] disambiguates it against names already
//! allocated in this run so every `$ref` the rewriter emits has the form
//! `#/$defs/<ident>` with a collision-free `<ident>`.

use std::collections::HashSet;

use regex::Regex;
use std::sync::OnceLock;

/// Candidate names must already satisfy `^[A-Za-z0-9_]+$` by construction,
/// but a final catch-all pass guards against any JSON Schema input shape
/// that would otherwise smuggle a disallowed character through (§8 invariant 1).
fn disallowed_char_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]").expect("valid regex"))
}

fn sanitize_uri_part(document: &str) -> String {
    document
        .chars()
        .map(|c| match c {
            '/' | ':' | '.' | '-' => '_',
            other => other,
        })
        .collect()
}

fn sanitize_pointer_part(pointer: &str) -> String {
    pointer.replace("~0", "_tilde_").replace("~1", "_slash_").replace('/', "_")
}

fn final_sanitize(name: &str) -> String {
    disallowed_char_re().replace_all(name, "_").into_owned()
}

/// Trailing, non-empty segment of a JSON Pointer (the part after the last
/// unescaped `/`), or `None` if the pointer has no segments.
fn trailing_segment(pointer: &str) -> Option<&str> {
    let segment = pointer.rsplit('/').next()?;
    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}

/// Synthesize a `$defs` name candidate for a reference resolved to
/// `(document, pointer)`. `is_external` distinguishes a reference landing in
/// a document other than the one being inlined (document URI folded into
/// the name) from one landing in the same document (pointer alone). Does
/// not disambiguate against other allocations — pass the result through a
/// [`NameAllocator`] for that.
pub fn synthesize_def_name(document: &str, pointer: &str, is_external: bool) -> String {
    if pointer.starts_with("/$defs/") || pointer.starts_with("/components/schemas/") {
        if let Some(segment) = trailing_segment(pointer) {
            return final_sanitize(segment);
        }
    }

    let pointer_part = sanitize_pointer_part(pointer);
    let name = if is_external {
        if document.is_empty() && pointer.is_empty() {
            "UnknownRef".to_string()
        } else if pointer.is_empty() {
            "ExternalRef".to_string()
        } else {
            format!("{}_{}", sanitize_uri_part(document), pointer_part)
        }
    } else if pointer_part.is_empty() {
        "InternalRef".to_string()
    } else {
        pointer_part
    };

    final_sanitize(&name)
}

/// Tracks names already allocated in this run and disambiguates collisions
/// with `_1`, `_2`, … suffixes.
#[derive(Debug, Default)]
pub struct NameAllocator {
    used: HashSet<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate `candidate`, suffixing `_1`, `_2`, … until the result is
    /// unused, and remember it so future calls avoid it too.
    pub fn allocate(&mut self, candidate: &str) -> String {
        if !self.used.contains(candidate) {
            self.used.insert(candidate.to_string());
            return candidate.to_string();
        }
        let mut n = 1u64;
        loop {
            let attempt = format!("{candidate}_{n}");
            if !self.used.contains(&attempt) {
                self.used.insert(attempt.clone());
                return attempt;
            }
            n += 1;
        }
    }
}
