//! The `ReferenceResolver` contract and a concrete, I/O-free implementation.
//!
//! [`ReferenceResolver`] is the single collaborator the analyzer and rewriter
//! call out to: given a `$ref` string as written and the document it appears
//! in, it must (a) canonicalize the reference to an absolute form identical
//! for identical targets, and (b) hand back the resolved schema node.
//! [`DocumentStore`] is the bundled implementation — it holds the root
//! document plus any additional documents the caller pre-registers, and
//! performs JSON Pointer / `$anchor` resolution against them. It never
//! touches the filesystem or network: fetching external documents is the
//! caller's concern (§1 Non-goals).

use std::collections::HashMap;

use serde_json::Value;
use url::Url;

use crate::error::InlineError;
use crate::schema_utils::resolve_pointer;

/// The result of resolving a reference: the target node, plus the absolute
/// document location it was read from (nested `$ref`s inside `node` resolve
/// relative to this document, not the one that contained the original
/// reference).
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub node: Value,
    pub document: String,
}

/// Resolves `$ref` strings to schema nodes.
///
/// Implementations must canonicalize identically for identical targets —
/// the analyzer's Registry is keyed on the string `canonicalize` returns, so
/// two references that name the same target must canonicalize to the same
/// string, and two references to different targets must not collide.
pub trait ReferenceResolver {
    /// Canonicalize `reference` (as written in a `$ref`, possibly relative
    /// or anchor-style) against `current_document` — the absolute document
    /// location the `$ref` itself appears in — into a single absolute
    /// reference string of the form `"<document>#<json-pointer>"`.
    fn canonicalize(&self, reference: &str, current_document: &str) -> Result<String, InlineError>;

    /// Resolve a reference already produced by [`canonicalize`](Self::canonicalize)
    /// into its target node.
    fn resolve(
        &self,
        absolute_reference: &str,
        options: &Value,
    ) -> Result<ResolvedTarget, InlineError>;

    /// If `node` originated from the root document at a known JSON Pointer,
    /// return that pointer (fragment form, e.g. `"/components/schemas/User"`).
    /// Returns `None` when no such pointer is known — callers must treat
    /// that as "root-normalization is not possible" rather than an error.
    fn root_document_pointer(&self, node: &Value) -> Option<String>;

    /// The canonical document location used as `current_document` for the
    /// very first call into the analyzer/rewriter.
    fn root_document(&self) -> &str;
}

/// Default base URI used when a document declares no `$id`.
const DEFAULT_BASE: &str = "file:///schema.json";

/// An in-memory, caller-populated collection of schema documents.
///
/// Construct with [`DocumentStore::new`] for the common case (a single,
/// self-contained schema), or [`DocumentStore::with_entry_point`] when the
/// root schema is itself a named sub-schema embedded in a larger document
/// (e.g. an OpenAPI `components/schemas/User`). Additional documents can be
/// registered with [`register_document`](Self::register_document) to
/// support references that cross document boundaries.
pub struct DocumentStore {
    documents: HashMap<String, Value>,
    anchor_maps: HashMap<String, HashMap<String, String>>,
    root_key: String,
    entry_point: Option<String>,
}

impl DocumentStore {
    /// Build a store whose root document is `root` itself.
    pub fn new(root: Value) -> Result<Self, InlineError> {
        let mut store = Self {
            documents: HashMap::new(),
            anchor_maps: HashMap::new(),
            root_key: String::new(),
            entry_point: None,
        };
        let root_key = store.document_key(&root)?;
        store.root_key = root_key;
        store.insert_document(store.root_key.clone(), root)?;
        Ok(store)
    }

    /// Build a store whose root document is a sub-schema embedded at
    /// `entry_pointer` inside `containing_document`. Returns the store plus
    /// the extracted root schema node the caller should hand to `inline`.
    pub fn with_entry_point(
        containing_document: Value,
        entry_pointer: &str,
    ) -> Result<(Self, Value), InlineError> {
        let mut store = Self {
            documents: HashMap::new(),
            anchor_maps: HashMap::new(),
            root_key: String::new(),
            entry_point: Some(entry_pointer.to_string()),
        };
        let root_key = store.document_key(&containing_document)?;
        store.root_key = root_key.clone();
        let root_node = resolve_pointer(&containing_document, entry_pointer)
            .ok_or_else(|| InlineError::ResolveFailed {
                reference: format!("{root_key}#{entry_pointer}"),
                message: "entry point pointer not found in containing document".to_string(),
            })?
            .clone();
        store.insert_document(root_key, containing_document)?;
        Ok((store, root_node))
    }

    /// Register an additional document, reachable by external `$ref`s whose
    /// document part resolves to `uri`. No fetch is performed — `document`
    /// must already be loaded by the caller (§5, §1 Non-goals).
    pub fn register_document(&mut self, uri: &str, document: Value) -> Result<(), InlineError> {
        let key = Url::parse(uri)
            .map_err(|e| InlineError::ResolveFailed {
                reference: uri.to_string(),
                message: format!("invalid document URI: {e}"),
            })?
            .to_string();
        self.insert_document(key, document)
    }

    fn document_key(&self, document: &Value) -> Result<String, InlineError> {
        let default_base = Url::parse(DEFAULT_BASE).expect("DEFAULT_BASE is a valid URL");
        let base = if let Some(id) = document.get("$id").and_then(Value::as_str) {
            default_base.join(id).unwrap_or(default_base)
        } else {
            default_base
        };
        Ok(base.to_string())
    }

    fn insert_document(&mut self, key: String, document: Value) -> Result<(), InlineError> {
        let base = Url::parse(&key).map_err(|e| InlineError::ResolveFailed {
            reference: key.clone(),
            message: format!("invalid document key: {e}"),
        })?;
        let anchors = crate::anchor_utils::build_anchor_map(&document, Some(&base))?;
        self.anchor_maps.insert(key.clone(), anchors);
        self.documents.insert(key, document);
        Ok(())
    }
}

impl ReferenceResolver for DocumentStore {
    fn canonicalize(&self, reference: &str, current_document: &str) -> Result<String, InlineError> {
        let base = if current_document.is_empty() {
            Url::parse(DEFAULT_BASE).expect("DEFAULT_BASE is a valid URL")
        } else {
            Url::parse(current_document).map_err(|e| InlineError::ResolveFailed {
                reference: reference.to_string(),
                message: format!("invalid current document location: {e}"),
            })?
        };

        let joined = base.join(reference).map_err(|e| InlineError::ResolveFailed {
            reference: reference.to_string(),
            message: format!("could not resolve reference against {base}: {e}"),
        })?;

        let mut doc_key_url = joined.clone();
        doc_key_url.set_fragment(None);
        let doc_key = doc_key_url.to_string();

        let fragment = joined.fragment().unwrap_or("");
        let pointer = if fragment.is_empty() || fragment.starts_with('/') {
            fragment.to_string()
        } else {
            // Anchor-style fragment — look it up in that document's anchor map.
            let anchor_key = joined.as_str();
            let resolved = self
                .anchor_maps
                .get(&doc_key)
                .and_then(|m| m.get(anchor_key))
                .ok_or_else(|| InlineError::ResolveFailed {
                    reference: reference.to_string(),
                    message: format!("unknown $anchor '{fragment}' in {doc_key}"),
                })?;
            resolved.strip_prefix('#').unwrap_or(resolved).to_string()
        };

        Ok(format!("{doc_key}#{pointer}"))
    }

    fn resolve(
        &self,
        absolute_reference: &str,
        _options: &Value,
    ) -> Result<ResolvedTarget, InlineError> {
        let (doc_key, pointer) = absolute_reference
            .split_once('#')
            .unwrap_or((absolute_reference, ""));

        let document = self.documents.get(doc_key).ok_or_else(|| InlineError::ResolveFailed {
            reference: absolute_reference.to_string(),
            message: format!("document not registered: {doc_key}"),
        })?;

        let node = resolve_pointer(document, pointer)
            .ok_or_else(|| InlineError::ResolveFailed {
                reference: absolute_reference.to_string(),
                message: format!("pointer '{pointer}' not found in {doc_key}"),
            })?
            .clone();

        Ok(ResolvedTarget {
            node,
            document: doc_key.to_string(),
        })
    }

    fn root_document_pointer(&self, node: &Value) -> Option<String> {
        let entry_pointer = self.entry_point.as_ref()?;
        let containing = self.documents.get(&self.root_key)?;
        let found = resolve_pointer(containing, entry_pointer)?;
        if found == node {
            Some(entry_pointer.clone())
        } else {
            None
        }
    }

    fn root_document(&self) -> &str {
        &self.root_key
    }
}

// ===========================================================================
// Tests
// ===========================================================================
