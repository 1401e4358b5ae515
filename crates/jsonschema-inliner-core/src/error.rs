//! Error types for reference inlining.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, machine-readable error codes for FFI consumers.
///
/// These codes form a **stable API contract** — once published, variant names
/// and their serialized `snake_case` strings must never change across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCode {
    /// The resolver returned an error, or the referenced node could not be found.
    ResolveFailed,
    /// The analyzer revisited a reference with no escape route on the current path.
    UnsafeCircularReference,
    /// Total analyzer+rewriter visits exceeded the configured cycle budget.
    CycleBudgetExceeded,
    /// Caller cancellation was observed at a budget check.
    Cancelled,
    /// A boolean root schema cannot host `$defs`, but at least one reference
    /// needed to be preserved there.
    InvalidRoot,
    /// Pass 2 saw a reference with no Registry entry from pass 1 — an
    /// implementation bug, not a malformed-input condition.
    MissingRegistryEntry,
}

#[derive(Debug, Error)]
pub enum InlineError {
    #[error("failed to resolve {reference}: {message}")]
    ResolveFailed { reference: String, message: String },

    #[error("unsafe circular reference: {}", chain.join(" -> "))]
    UnsafeCircularReference { chain: Vec<String> },

    #[error("cycle budget exceeded (limit: {limit})")]
    CycleBudgetExceeded { limit: u64 },

    #[error("operation cancelled: {cause}")]
    Cancelled { cause: String },

    #[error(
        "invalid root: boolean root schema cannot hold $defs for preserved reference {reference}"
    )]
    InvalidRoot { reference: String },

    #[error("missing registry entry for {reference} (implementation bug)")]
    MissingRegistryEntry { reference: String },
}

impl InlineError {
    /// Returns the stable error code for this error variant.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            InlineError::ResolveFailed { .. } => ErrorCode::ResolveFailed,
            InlineError::UnsafeCircularReference { .. } => ErrorCode::UnsafeCircularReference,
            InlineError::CycleBudgetExceeded { .. } => ErrorCode::CycleBudgetExceeded,
            InlineError::Cancelled { .. } => ErrorCode::Cancelled,
            InlineError::InvalidRoot { .. } => ErrorCode::InvalidRoot,
            InlineError::MissingRegistryEntry { .. } => ErrorCode::MissingRegistryEntry,
        }
    }

    /// The reference(s) involved in this error, if any. Cycle chains are
    /// joined with `->`, matching the `Display` rendering.
    pub fn reference(&self) -> Option<String> {
        match self {
            InlineError::ResolveFailed { reference, .. } => Some(reference.clone()),
            InlineError::UnsafeCircularReference { chain } => Some(chain.join(" -> ")),
            InlineError::InvalidRoot { reference } => Some(reference.clone()),
            InlineError::MissingRegistryEntry { reference } => Some(reference.clone()),
            InlineError::CycleBudgetExceeded { .. } | InlineError::Cancelled { .. } => None,
        }
    }

    /// Produces a structured JSON error for FFI consumers.
    ///
    /// Format: `{"code": "...", "message": "...", "reference": "..." | null}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
            "reference": self.reference(),
        })
    }
}
