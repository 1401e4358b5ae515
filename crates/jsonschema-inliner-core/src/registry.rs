//! The Reference Registry (§4.A): the single source of truth shared by the
//! analyzer and rewriter passes.
//!
//! An insertion-ordered map from absolute reference string to [`DecisionRecord`].
//! Insertion order is the only ordering guarantee surfaced externally — it
//! becomes the `$defs` key order in the consolidated output.

use std::collections::HashMap;

use serde_json::Value;

/// The analyzer's verdict for a single absolute reference, plus the state
/// the rewriter accumulates while acting on it.
#[derive(Debug, Clone, Default)]
pub struct DecisionRecord {
    /// `true` means keep this as a `$ref` in the output and materialize its
    /// target into the consolidated `$defs` table.
    pub preserve: bool,
    /// The `#/$defs/<name>` path this reference rewrites to. Empty until a
    /// name has been chosen (only ever set when `preserve` is `true`).
    pub rewritten_ref: String,
    /// The resolved target, populated lazily during the rewriter pass.
    pub target_schema: Option<Value>,
    /// Set by the analyzer when this reference was reached a second time on
    /// the walk stack with an escape route on an intervening frame.
    pub is_circular: bool,
}

/// Insertion-ordered reference → [`DecisionRecord`] map.
///
/// Backed by a `Vec` for order plus a `HashMap` index for O(1) lookup —
/// kept hand-rolled rather than pulling in an ordered-map crate, since the
/// only operations needed are append, lookup, and in-order iteration.
#[derive(Debug, Default)]
pub struct Registry {
    order: Vec<String>,
    records: HashMap<String, DecisionRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `reference` already has an entry.
    pub fn has(&self, reference: &str) -> bool {
        self.records.contains_key(reference)
    }

    pub fn get(&self, reference: &str) -> Option<&DecisionRecord> {
        self.records.get(reference)
    }

    pub fn get_mut(&mut self, reference: &str) -> Option<&mut DecisionRecord> {
        self.records.get_mut(reference)
    }

    /// Ensure an entry exists for `reference`, creating a default
    /// (`preserve = false`) record on first sight, and return it.
    pub fn ensure(&mut self, reference: &str) -> &mut DecisionRecord {
        if !self.records.contains_key(reference) {
            self.order.push(reference.to_string());
            self.records.insert(reference.to_string(), DecisionRecord::default());
        }
        self.records.get_mut(reference).expect("just inserted")
    }

    /// Register `alias` as a reverse lookup pointing at the same
    /// [`DecisionRecord`] already stored under `original`. Idempotent: a
    /// second call with the same `alias` is a no-op. Used when the rewriter
    /// rewrites a reference to `#/$defs/<name>` and must recognize a later,
    /// literal `$ref` to that same path as already decided.
    pub fn alias(&mut self, alias: &str, original: &str) {
        if self.records.contains_key(alias) {
            return;
        }
        if let Some(record) = self.records.get(original).cloned() {
            self.order.push(alias.to_string());
            self.records.insert(alias.to_string(), record);
        }
    }

    /// Iterate entries in first-insertion order.
    pub fn iter_in_order(&self) -> impl Iterator<Item = (&str, &DecisionRecord)> {
        self.order.iter().map(move |k| (k.as_str(), &self.records[k]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
