//! Pass 1 (§4.C): walks the schema, resolves references via the
//! [`ReferenceResolver`], populates the [`Registry`], and classifies cycles
//! as safe or unsafe using the escape-route predicate evaluated on the walk
//! stack.
//!
//! The analyzer does not rewrite anything — it only ever reads the input
//! tree and writes Decision Records. See `rewriter` for pass 2, which
//! consumes what this module produces.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::budget::CycleBudget;
use crate::error::InlineError;
use crate::naming::{synthesize_def_name, NameAllocator};
use crate::registry::Registry;
use crate::resolver::ReferenceResolver;

/// A frame pushed each time the walk follows a reference, popped as the
/// walk returns. `detected_escape_route` is monotone — once set, it stays
/// set for the frame's lifetime, so any descendant cycle reaching back to
/// this frame's reference sees that an escape route was available.
struct LoopFrame {
    reference: String,
    detected_escape_route: bool,
}

struct Analyzer<'a> {
    resolver: &'a dyn ReferenceResolver,
    resolver_options: &'a Value,
    registry: &'a mut Registry,
    budget: &'a mut CycleBudget,
    names: &'a mut NameAllocator,
    root_document: String,
}

/// Run pass 1 over `root`, starting resolution at `current_document`.
/// Populates `registry` in place. Fails on resolver error, unsafe cycle, or
/// cycle-budget exhaustion.
pub fn analyze(
    root: &Value,
    current_document: &str,
    resolver: &dyn ReferenceResolver,
    resolver_options: &Value,
    registry: &mut Registry,
    budget: &mut CycleBudget,
    names: &mut NameAllocator,
) -> Result<(), InlineError> {
    let root_document = resolver.root_document().to_string();
    let mut analyzer = Analyzer {
        resolver,
        resolver_options,
        registry,
        budget,
        names,
        root_document,
    };
    let mut visited = Vec::new();
    analyzer.walk(root, current_document, &mut visited)
}

fn mark_escape(visited: &mut [LoopFrame]) {
    if let Some(top) = visited.last_mut() {
        top.detected_escape_route = true;
    }
}

fn split_absolute(reference: &str) -> (&str, &str) {
    reference.split_once('#').unwrap_or((reference, ""))
}

fn min_items_is_zero_or_absent(obj: &Map<String, Value>) -> bool {
    match obj.get("minItems").and_then(Value::as_u64) {
        Some(0) | None => true,
        Some(_) => false,
    }
}

impl<'a> Analyzer<'a> {
    fn walk(
        &mut self,
        node: &Value,
        current_document: &str,
        visited: &mut Vec<LoopFrame>,
    ) -> Result<(), InlineError> {
        self.budget.tick()?;

        match node {
            Value::Bool(_) => Ok(()),
            Value::Object(obj) => {
                if let Some(Value::String(ref_str)) = obj.get("$ref") {
                    self.walk_reference(ref_str, current_document, visited)
                } else {
                    self.walk_children(obj, current_document, visited)
                }
            }
            _ => Ok(()),
        }
    }

    fn walk_reference(
        &mut self,
        ref_str: &str,
        current_document: &str,
        visited: &mut Vec<LoopFrame>,
    ) -> Result<(), InlineError> {
        let r = self.resolver.canonicalize(ref_str, current_document)?;
        self.registry.ensure(&r);

        if let Some(pos) = visited.iter().position(|f| f.reference == r) {
            let escape_found = visited[pos..].iter().any(|f| f.detected_escape_route);
            if escape_found {
                tracing::debug!(reference = %r, "cycle closed via escape route, preserving");
                self.preserve_circular(&r);
                Ok(())
            } else {
                tracing::debug!(reference = %r, "cycle closed with no escape route, unsafe");
                let mut chain: Vec<String> =
                    visited[pos..].iter().map(|f| f.reference.clone()).collect();
                chain.push(r);
                Err(InlineError::UnsafeCircularReference { chain })
            }
        } else {
            tracing::trace!(reference = %r, "descending into reference");
            visited.push(LoopFrame {
                reference: r.clone(),
                detected_escape_route: false,
            });
            let resolved = self.resolver.resolve(&r, self.resolver_options)?;
            let result = self.walk(&resolved.node, &resolved.document, visited);
            visited.pop();
            result
        }
    }

    fn preserve_circular(&mut self, r: &str) {
        let (doc_part, pointer_part) = split_absolute(r);
        let is_external = doc_part != self.root_document;
        let record = self.registry.get_mut(r).expect("just ensured");
        record.preserve = true;
        record.is_circular = true;
        if record.rewritten_ref.is_empty() {
            let candidate = synthesize_def_name(doc_part, pointer_part, is_external);
            let allocated = self.names.allocate(&candidate);
            record.rewritten_ref = format!("#/$defs/{allocated}");
        }
    }

    fn walk_children(
        &mut self,
        obj: &Map<String, Value>,
        current_document: &str,
        visited: &mut Vec<LoopFrame>,
    ) -> Result<(), InlineError> {
        let required: HashSet<&str> = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        if let Some(Value::Object(props)) = obj.get("properties") {
            for (name, schema) in props {
                if !required.contains(name.as_str()) {
                    mark_escape(visited);
                }
                self.walk(schema, current_document, visited)?;
            }
        }

        if let Some(Value::Object(pattern_props)) = obj.get("patternProperties") {
            for schema in pattern_props.values() {
                self.walk(schema, current_document, visited)?;
            }
        }

        if let Some(Value::Object(defs)) = obj.get("$defs") {
            for schema in defs.values() {
                self.walk(schema, current_document, visited)?;
            }
        }

        if let Some(Value::Object(dep_schemas)) = obj.get("dependentSchemas") {
            for schema in dep_schemas.values() {
                mark_escape(visited);
                self.walk(schema, current_document, visited)?;
            }
        }

        for keyword in [
            "additionalProperties",
            "unevaluatedProperties",
            "propertyNames",
            "unevaluatedItems",
        ] {
            if let Some(schema) = obj.get(keyword) {
                mark_escape(visited);
                self.walk(schema, current_document, visited)?;
            }
        }

        for keyword in ["contains", "not", "if", "then", "else"] {
            if let Some(schema) = obj.get(keyword) {
                self.walk(schema, current_document, visited)?;
            }
        }

        if let Some(items) = obj.get("items") {
            if min_items_is_zero_or_absent(obj) {
                mark_escape(visited);
            }
            self.walk(items, current_document, visited)?;
        }

        if let Some(Value::Array(prefix_items)) = obj.get("prefixItems") {
            for schema in prefix_items {
                self.walk(schema, current_document, visited)?;
            }
        }

        for keyword in ["anyOf", "oneOf"] {
            if let Some(Value::Array(variants)) = obj.get(keyword) {
                let has_escape = variants.len() > 1;
                for variant in variants {
                    if has_escape {
                        mark_escape(visited);
                    }
                    self.walk(variant, current_document, visited)?;
                }
            }
        }

        if let Some(Value::Array(all_of)) = obj.get("allOf") {
            for schema in all_of {
                self.walk(schema, current_document, visited)?;
            }
        }

        Ok(())
    }
}
