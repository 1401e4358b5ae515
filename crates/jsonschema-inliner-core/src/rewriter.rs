//! Pass 2 (§4.D): walks the schema again, consuming the Registry the
//! analyzer built. Non-preserved references are substituted in place with a
//! deep copy of their target; preserved references are rewritten to
//! `#/$defs/<name>` and their targets relocated into a consolidated root
//! `$defs` table.
//!
//! Every visited node is shallow-copied before modification, so a target
//! reached through multiple references ends up as an independently owned
//! subtree once traversal completes — deep copy emerges from recursive
//! shallow-copy plus in-place substitution, never from a single bulk clone.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::budget::CycleBudget;
use crate::error::InlineError;
use crate::registry::Registry;
use crate::resolver::ReferenceResolver;
use crate::schema_utils::recurse_into_children;

struct Rewriter<'a> {
    resolver: &'a dyn ReferenceResolver,
    resolver_options: &'a Value,
    registry: &'a mut Registry,
    budget: &'a mut CycleBudget,
    root_document: String,
}

/// Run pass 2 over `root` using the Registry pass 1 populated, then
/// consolidate preserved targets into the root `$defs` table and optionally
/// prune unused entries.
#[allow(clippy::too_many_arguments)]
pub fn rewrite(
    root: &Value,
    current_document: &str,
    resolver: &dyn ReferenceResolver,
    resolver_options: &Value,
    registry: &mut Registry,
    budget: &mut CycleBudget,
    remove_unused_defs: bool,
) -> Result<Value, InlineError> {
    let root_document = resolver.root_document().to_string();
    let mut rewriter = Rewriter {
        resolver,
        resolver_options,
        registry,
        budget,
        root_document,
    };
    let mut visited = Vec::new();
    let rewritten = rewriter.rewrite_node(root, current_document, &mut visited)?;
    consolidate(rewritten, rewriter.registry, remove_unused_defs)
}

impl<'a> Rewriter<'a> {
    fn rewrite_node(
        &mut self,
        node: &Value,
        current_document: &str,
        visited: &mut Vec<String>,
    ) -> Result<Value, InlineError> {
        self.budget.tick()?;

        match node {
            Value::Object(obj) => {
                if let Some(Value::String(ref_str)) = obj.get("$ref") {
                    let ref_str = ref_str.clone();
                    self.rewrite_reference(&ref_str, current_document, visited)
                } else {
                    let mut new_obj = obj.clone();
                    let doc = current_document.to_string();
                    recurse_into_children(&mut new_obj, "#", 0, &mut |child, _path, _depth| {
                        self.rewrite_node(child, &doc, visited)
                    })?;
                    Ok(Value::Object(new_obj))
                }
            }
            other => Ok(other.clone()),
        }
    }

    fn rewrite_reference(
        &mut self,
        ref_str: &str,
        current_document: &str,
        visited: &mut Vec<String>,
    ) -> Result<Value, InlineError> {
        let r = self.resolver.canonicalize(ref_str, current_document)?;
        let record = self
            .registry
            .get(&r)
            .cloned()
            .ok_or_else(|| InlineError::MissingRegistryEntry { reference: r.clone() })?;

        if record.preserve {
            if visited.contains(&r) {
                let absolute_rewritten = self
                    .resolver
                    .canonicalize(&record.rewritten_ref, &self.root_document)?;
                self.registry.alias(&absolute_rewritten, &r);
                return Ok(Value::Object(
                    [("$ref".to_string(), Value::String(record.rewritten_ref.clone()))]
                        .into_iter()
                        .collect(),
                ));
            }

            visited.push(r.clone());
            let resolved = self.resolver.resolve(&r, self.resolver_options)?;
            let processed_target = self.rewrite_node(&resolved.node, &resolved.document, visited)?;
            visited.pop();

            if let Some(rec) = self.registry.get_mut(&r) {
                if rec.target_schema.is_none() {
                    rec.target_schema = Some(processed_target);
                }
            }
            let rewritten_ref = self.registry.get(&r).expect("just updated").rewritten_ref.clone();
            Ok(Value::Object(
                [("$ref".to_string(), Value::String(rewritten_ref))].into_iter().collect(),
            ))
        } else {
            let resolved = self.resolver.resolve(&r, self.resolver_options)?;
            self.rewrite_node(&resolved.node, &resolved.document, visited)
        }
    }
}

/// Consolidation (§4.D): install every preserved target into the root's
/// `$defs` table (creating it lazily), then optionally prune entries no
/// `$ref` in the output points at.
fn consolidate(
    mut root: Value,
    registry: &Registry,
    remove_unused_defs: bool,
) -> Result<Value, InlineError> {
    let has_preserved = registry.iter_in_order().any(|(_, r)| r.preserve);

    if !has_preserved {
        if remove_unused_defs {
            if let Value::Object(obj) = &mut root {
                obj.remove("$defs");
            }
        }
        return Ok(root);
    }

    match &mut root {
        Value::Object(obj) => {
            let mut defs_map = match obj.remove("$defs") {
                Some(Value::Object(m)) => m,
                _ => Map::new(),
            };

            for (_, record) in registry.iter_in_order() {
                if !record.preserve {
                    continue;
                }
                if let Some(name) = record.rewritten_ref.strip_prefix("#/$defs/") {
                    if let Some(target) = &record.target_schema {
                        defs_map.insert(name.to_string(), target.clone());
                    }
                }
            }

            if remove_unused_defs {
                let used: HashSet<&str> = registry
                    .iter_in_order()
                    .filter(|(_, r)| r.preserve)
                    .filter_map(|(_, r)| r.rewritten_ref.strip_prefix("#/$defs/"))
                    .collect();
                defs_map.retain(|k, _| used.contains(k.as_str()));
            }

            if defs_map.is_empty() {
                obj.remove("$defs");
            } else {
                obj.insert("$defs".to_string(), Value::Object(defs_map));
            }

            Ok(root)
        }
        Value::Bool(_) => Err(InlineError::InvalidRoot {
            reference: "root".to_string(),
        }),
        _ => Ok(root),
    }
}
