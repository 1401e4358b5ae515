//! End-to-end integration tests against the six literal scenarios.

use jsonschema_inliner_core::{inline, DocumentStore, ErrorCode, InlineOptions};
use pretty_assertions::assert_eq;
use serde_json::json;

// S1 — simple inline + prune.
#[test]
fn test_s1_simple_inline_and_prune() {
    let root = json!({
        "properties": { "user": { "$ref": "#/$defs/User" } },
        "$defs": {
            "User": { "type": "object", "properties": { "name": { "type": "string" } } },
            "UnusedDef": { "type": "string" }
        }
    });
    let store = DocumentStore::new(root.clone()).unwrap();
    let options = InlineOptions {
        remove_unused_defs: true,
        ..InlineOptions::default()
    };
    let output = inline(root, &store, &options).unwrap();

    assert_eq!(
        output["properties"]["user"],
        json!({ "type": "object", "properties": { "name": { "type": "string" } } })
    );
    assert!(output.get("$defs").is_none());
}

// S2 — safe self-cycle via optional property.
#[test]
fn test_s2_safe_self_cycle_via_optional_property() {
    let root = json!({
        "$defs": {
            "Node": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "parent": { "$ref": "#/$defs/Node" }
                },
                "required": ["name"]
            }
        },
        "properties": { "parent": { "$ref": "#/$defs/Node" } }
    });
    let store = DocumentStore::new(root.clone()).unwrap();
    let output = inline(root, &store, &InlineOptions::default()).unwrap();

    assert_eq!(output["properties"]["parent"], json!({ "$ref": "#/$defs/Node" }));
    assert_eq!(
        output["$defs"]["Node"]["properties"]["parent"],
        json!({ "$ref": "#/$defs/Node" })
    );
}

// S3 — unsafe self-cycle via required.
#[test]
fn test_s3_unsafe_self_cycle_via_required() {
    let root = json!({
        "$defs": {
            "Node": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "parent": { "$ref": "#/$defs/Node" }
                },
                "required": ["name", "parent"]
            }
        },
        "properties": { "parent": { "$ref": "#/$defs/Node" } }
    });
    let store = DocumentStore::new(root.clone()).unwrap();
    let err = inline(root, &store, &InlineOptions::default()).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::UnsafeCircularReference);
}

// S4 — oneOf escape route.
#[test]
fn test_s4_oneof_escape_route_preserves_cycle() {
    let root = json!({
        "$defs": {
            "Node": {
                "oneOf": [
                    { "type": "string" },
                    {
                        "type": "object",
                        "properties": { "next": { "$ref": "#/$defs/Node" } },
                        "required": ["next"]
                    }
                ]
            }
        },
        "properties": { "node": { "$ref": "#/$defs/Node" } }
    });
    let store = DocumentStore::new(root.clone()).unwrap();
    let output = inline(root, &store, &InlineOptions::default()).unwrap();

    assert_eq!(output["properties"]["node"], json!({ "$ref": "#/$defs/Node" }));
    assert_eq!(
        output["$defs"]["Node"]["oneOf"][1]["properties"]["next"],
        json!({ "$ref": "#/$defs/Node" })
    );
}

// S5 — external ref with internal cycle.
#[test]
fn test_s5_external_ref_with_internal_cycle_collapses_to_one_entry() {
    let external = json!({
        "$defs": {
            "TreeNode": {
                "type": "object",
                "properties": {
                    "children": {
                        "type": "array",
                        "items": { "$ref": "#/$defs/TreeNode" },
                        "minItems": 0
                    }
                }
            }
        }
    });
    let root = json!({ "$ref": "https://example.com/external.json#/$defs/TreeNode" });
    let mut store = DocumentStore::new(root.clone()).unwrap();
    store
        .register_document("https://example.com/external.json", external)
        .unwrap();

    let output = inline(root, &store, &InlineOptions::default()).unwrap();

    assert_eq!(output["$ref"], json!("#/$defs/TreeNode"));
    let defs = output["$defs"].as_object().unwrap();
    assert_eq!(defs.len(), 1, "exactly one consolidated entry for the cyclic external ref");
    assert_eq!(
        defs["TreeNode"]["properties"]["children"]["items"],
        json!({ "$ref": "#/$defs/TreeNode" })
    );
}

// S6 — OpenAPI component entry point with mutually recursive User/Manager.
// Manager closes its own cycle via `deputy` so both ends of the mutual
// recursion independently qualify for preservation under a single entry
// point at User.
#[test]
fn test_s6_openapi_component_entry_point() {
    let containing = json!({
        "components": {
            "schemas": {
                "User": {
                    "type": "object",
                    "properties": { "manager": { "$ref": "#/components/schemas/Manager" } }
                },
                "Manager": {
                    "type": "object",
                    "properties": {
                        "reports": { "$ref": "#/components/schemas/User" },
                        "deputy": { "$ref": "#/components/schemas/Manager" }
                    }
                }
            }
        }
    });
    let (store, entry_root) =
        DocumentStore::with_entry_point(containing, "/components/schemas/User").unwrap();
    let output = inline(entry_root, &store, &InlineOptions::default()).unwrap();

    assert_eq!(output["$ref"], json!("#/$defs/User"));
    assert_eq!(
        output["$defs"]["User"]["properties"]["manager"],
        json!({ "$ref": "#/$defs/Manager" })
    );
    assert_eq!(
        output["$defs"]["Manager"]["properties"]["reports"],
        json!({ "$ref": "#/$defs/User" })
    );
    assert_eq!(
        output["$defs"]["Manager"]["properties"]["deputy"],
        json!({ "$ref": "#/$defs/Manager" })
    );
}

// Invariant 4: running the inliner on its own output is idempotent.
#[test]
fn test_idempotent_on_own_output() {
    let root = json!({
        "$defs": {
            "Node": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "parent": { "$ref": "#/$defs/Node" }
                },
                "required": ["name"]
            }
        },
        "properties": { "parent": { "$ref": "#/$defs/Node" } }
    });
    let store = DocumentStore::new(root.clone()).unwrap();
    let once = inline(root, &store, &InlineOptions::default()).unwrap();

    let store2 = DocumentStore::new(once.clone()).unwrap();
    let twice = inline(once.clone(), &store2, &InlineOptions::default()).unwrap();

    assert_eq!(once, twice);
}

// Invariant 6: exceeding the cycle budget is deterministic and reported.
#[test]
fn test_cycle_budget_exceeded_is_deterministic() {
    let root = json!({
        "$defs": { "Node": { "properties": { "parent": { "$ref": "#/$defs/Node" } } } },
        "properties": { "node": { "$ref": "#/$defs/Node" } }
    });
    let store = DocumentStore::new(root.clone()).unwrap();
    let options = InlineOptions {
        max_cycles: 3,
        ..InlineOptions::default()
    };
    let err = inline(root, &store, &options).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::CycleBudgetExceeded);
}
