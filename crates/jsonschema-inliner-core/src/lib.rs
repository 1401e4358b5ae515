//! A two-pass reference-graph analyzer and rewriter for JSON Schema
//! (2020-12 / OpenAPI 3.1 dialect) `$ref`s.
//!
//! [`inline`] takes a schema root plus a [`ReferenceResolver`] and produces a
//! standalone schema: every reachable `$ref` is either substituted in place
//! (a non-cyclic reference) or preserved and relocated into a consolidated
//! `#/$defs/` table (a reference that participates in a structurally safe
//! cycle). See the module docs on [`analyzer`] and [`rewriter`] for the two
//! passes, [`registry`] for the shared decision table, and [`budget`] for
//! the termination guarantee on pathological graphs.

mod analyzer;
mod anchor_utils;
mod budget;
mod config;
mod error;
mod naming;
mod registry;
mod resolver;
mod rewriter;
mod schema_utils;

pub use budget::{CancellationToken, CycleBudget};
pub use config::{InlineOptions, DEFAULT_MAX_CYCLES};
pub use error::{ErrorCode, InlineError};
pub use naming::{synthesize_def_name, NameAllocator};
pub use registry::{DecisionRecord, Registry};
pub use resolver::{DocumentStore, ReferenceResolver, ResolvedTarget};
pub use schema_utils::{
    build_path, escape_pointer_segment, resolve_pointer, split_path, unescape_pointer_segment,
};

use serde_json::{Map, Value};

/// Run the inliner with a fresh, never-cancelled [`CancellationToken`].
pub fn inline(
    root: Value,
    resolver: &dyn ReferenceResolver,
    options: &InlineOptions,
) -> Result<Value, InlineError> {
    inline_with_cancellation(root, resolver, options, &CancellationToken::new())
}

/// Run the inliner, observing `cancellation` at every cycle-budget check
/// (§4.F, §5).
pub fn inline_with_cancellation(
    root: Value,
    resolver: &dyn ReferenceResolver,
    options: &InlineOptions,
    cancellation: &CancellationToken,
) -> Result<Value, InlineError> {
    let normalized_root = normalize_root(root, resolver);
    let current_document = resolver.root_document().to_string();
    let limit = if options.max_cycles == 0 {
        DEFAULT_MAX_CYCLES
    } else {
        options.max_cycles
    };

    let mut registry = Registry::new();
    let mut budget = CycleBudget::new(limit, cancellation.clone());
    let mut names = NameAllocator::new();

    tracing::debug!("pass 1 (analyze) starting");
    analyzer::analyze(
        &normalized_root,
        &current_document,
        resolver,
        &options.resolver_options,
        &mut registry,
        &mut budget,
        &mut names,
    )?;
    tracing::debug!(references = registry.len(), "pass 1 (analyze) complete");

    tracing::debug!("pass 2 (rewrite) starting");
    let result = rewriter::rewrite(
        &normalized_root,
        &current_document,
        resolver,
        &options.resolver_options,
        &mut registry,
        &mut budget,
        options.remove_unused_defs,
    );
    tracing::debug!(ok = result.is_ok(), "pass 2 (rewrite) complete");
    result
}

/// Root-schema normalization (prelude to pass 1, §4.D): if `root` is a
/// concrete (non-reference) schema and the resolver can locate it within a
/// containing document, wrap it as a self-reference so it participates in
/// the Registry like any other node. Silently skips when the resolver has
/// no pointer for it (§9 Open Question 2).
fn normalize_root(root: Value, resolver: &dyn ReferenceResolver) -> Value {
    let already_a_reference = matches!(&root, Value::Object(obj) if obj.contains_key("$ref"));
    if already_a_reference {
        return root;
    }
    match resolver.root_document_pointer(&root) {
        Some(pointer) => {
            let mut wrapper = Map::new();
            wrapper.insert("$ref".to_string(), Value::String(format!("#{pointer}")));
            Value::Object(wrapper)
        }
        None => root,
    }
}
