//! # graphout — Ordered Result Trees for Graph Queries
//!
//! Converts the column-oriented output of a graph-query evaluation — parallel
//! arrays of matched uids, scalar values, facet annotations, counts, and
//! group-by results, one set per query predicate — into a single ordered,
//! possibly nested, possibly array-grouped tree, and serializes that tree to
//! compact JSON.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: [`OutputNode`] is the contract between the recursive
//!    tree builder and any concrete wire format
//! 2. **Clean DTOs**: [`SubGraph`], [`TypedValue`], [`Facet`] cross all boundaries
//! 3. **Builder owns nothing**: traversal is a pure function over its inputs
//! 4. **Explicit limits**: the `@normalize` element ceiling is a parameter,
//!    never process-wide state
//!
//! ## Quick Start
//!
//! ```rust
//! use graphout::{to_json, Latency, SubGraph, Params, TypedValue, UidList};
//!
//! # fn example() -> graphout::Result<()> {
//! let name = SubGraph {
//!     attr: "name".into(),
//!     src_uids: Some(UidList::new(vec![0x1])),
//!     uid_matrix: vec![vec![]],
//!     value_matrix: vec![vec![TypedValue::Str("Alice".into())]],
//!     ..SubGraph::default()
//! };
//! let people = SubGraph {
//!     params: Params { alias: "people".into(), ..Params::default() },
//!     dest_uids: Some(UidList::new(vec![0x1])),
//!     uid_matrix: vec![vec![0x1]],
//!     children: vec![name],
//!     ..SubGraph::default()
//! };
//!
//! let mut latency = Latency::new();
//! let out = to_json(&mut latency, &[people], 10_000)?;
//! assert_eq!(out, br#"{"people":[{"name":"Alice"}]}"#);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module | Description |
//! |-------|--------|-------------|
//! | Build | [`traverse`] | Recursive descent over the predicate tree |
//! | Flatten | `output::normalize` | `@normalize` cross-product of repeated groups |
//! | Encode | `output::json` | Array-grouping JSON encoder |
//! | Assemble | [`response`] | Roots, latency bookkeeping, extensions envelope |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod output;
pub mod response;
pub mod traverse;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Facet, FacetValType, Facets, Function, Group, GroupAttr, GroupResults,
    Params, PathMeta, SubGraph, TypedValue, UidList, VarContext,
};

// ============================================================================
// Re-exports: Output
// ============================================================================

pub use output::{JsonNode, OutputNode, val_to_bytes};

// ============================================================================
// Re-exports: Traversal
// ============================================================================

pub use traverse::{ParentStack, Traversal, pre_traverse};

// ============================================================================
// Re-exports: Response assembly
// ============================================================================

pub use response::{Extensions, Latency, LatencySummary, TxnContext, to_json};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Length of facets matrix and uid matrix mismatch: {facets} vs {uids}")]
    FacetMismatch { facets: usize, uids: usize },

    #[error("Unexpected length while adding group-by. Idx: [{idx}], len: [{len}]")]
    GroupByLength { idx: usize, len: usize },

    #[error("Expected group-by results to have length > 0")]
    EmptyGroupBy,

    #[error("Only aggregated variables allowed within empty block")]
    EmptyBlockAggregation,

    #[error("All language tags should be either present or absent")]
    LangTagMismatch,

    #[error("Couldn't evaluate @normalize directive - too many results")]
    NormalizeLimit,

    #[error("Unsupported value type: {0}")]
    UnsupportedValue(&'static str),

    #[error("Facet decode failed for key '{key}': {reason}")]
    FacetDecode { key: String, reason: String },

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
