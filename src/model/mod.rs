//! # Result Data Model
//!
//! Clean DTOs crossing the evaluation → output boundary: the evaluated
//! predicate tree ([`SubGraph`]) with its index-aligned matrices, the typed
//! scalar values ([`TypedValue`]) and the raw facets attached to them.
//!
//! Design rule: this module is pure data — no I/O, no state, no encoding.

pub mod facet;
pub mod subgraph;
pub mod value;

pub use facet::{FACET_DELIMITER, Facet, FacetValType, Facets, FacetsList, facet_name};
pub use subgraph::{
    Function, Group, GroupAttr, GroupResults, Params, PathMeta, SubGraph, UidList, VarContext,
};
pub use value::TypedValue;
