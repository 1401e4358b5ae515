//! Configuration for reference inlining.

use serde::{Deserialize, Serialize};

/// The default cycle budget ceiling: the total number of analyzer + rewriter
/// node visits allowed before a run is aborted with [`CycleBudgetExceeded`].
///
/// [`CycleBudgetExceeded`]: crate::error::InlineError::CycleBudgetExceeded
pub const DEFAULT_MAX_CYCLES: u64 = 5_000_000;

/// Options controlling a single `inline` run.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `max-cycles`,
/// `remove-unused-defs`). This naming convention is part of the public API
/// contract for FFI and config files. `resolver_options` is an opaque bag
/// forwarded verbatim to the bundled [`ReferenceResolver`](crate::resolver::ReferenceResolver)
/// and is intentionally excluded from serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct InlineOptions {
    /// Upper bound on total analyzer + rewriter node visits (§4.B Cycle
    /// Budget). Converts runaway or pathologically cyclic graphs into a
    /// bounded `CycleBudgetExceeded` failure instead of an unbounded hang.
    pub max_cycles: u64,
    /// If `true`, consolidation drops any `$defs` entry that ends up with no
    /// `$ref` in the output pointing at it (§4.D unused-`$defs` removal).
    pub remove_unused_defs: bool,
    /// Opaque options forwarded to the resolver's `resolve` call. The
    /// inliner never inspects this value itself.
    #[serde(skip)]
    pub resolver_options: serde_json::Value,
}

impl Default for InlineOptions {
    fn default() -> Self {
        Self {
            max_cycles: DEFAULT_MAX_CYCLES,
            remove_unused_defs: false,
            resolver_options: serde_json::Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_options_serde_round_trip() {
        let opts = InlineOptions {
            max_cycles: 1_000,
            remove_unused_defs: true,
            resolver_options: serde_json::Value::Null,
        };

        let json = serde_json::to_string(&opts).unwrap();
        assert!(json.contains("\"max-cycles\""));
        assert!(json.contains("\"remove-unused-defs\""));
        assert!(!json.contains("resolver_options"));
        assert!(!json.contains("resolver-options"));

        let deserialized: InlineOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.max_cycles, 1_000);
        assert!(deserialized.remove_unused_defs);
    }

    #[test]
    fn test_defaults_when_fields_omitted() {
        let opts: InlineOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.max_cycles, DEFAULT_MAX_CYCLES);
        assert!(!opts.remove_unused_defs);
    }
}
