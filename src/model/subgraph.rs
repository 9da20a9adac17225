//! SubGraph — one evaluated node of the query's predicate tree.
//!
//! The evaluation engine hands the output layer a tree of `SubGraph`s whose
//! matrices are fully populated and index-aligned: row `i` of every matrix
//! belongs to `src_uids[i]`. This module is pure data plus the small naming
//! helpers the tree builder needs; nothing here mutates a subgraph.

use hashbrown::HashMap;

use super::facet::FacetsList;
use super::TypedValue;

// ============================================================================
// Uid lists
// ============================================================================

/// A sorted, deduplicated list of uids supporting binary-search lookup.
///
/// Used for the `src_uids` / `dest_uids` membership sets. Rows of the uid
/// matrix are plain `Vec<u64>` instead: they carry result order, which the
/// output must preserve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UidList(Vec<u64>);

impl UidList {
    pub fn new(mut uids: Vec<u64>) -> Self {
        uids.sort_unstable();
        uids.dedup();
        UidList(uids)
    }

    /// Position of `uid`, or `None` when it did not match.
    pub fn index_of(&self, uid: u64) -> Option<usize> {
        self.0.binary_search(&uid).ok()
    }

    pub fn contains(&self, uid: u64) -> bool {
        self.index_of(uid).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &u64> {
        self.0.iter()
    }
}

impl From<Vec<u64>> for UidList {
    fn from(uids: Vec<u64>) -> Self {
        UidList::new(uids)
    }
}

// ============================================================================
// Supporting types
// ============================================================================

/// The function applied at this predicate, e.g. `checkpwd` or an aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub args: Vec<String>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Function { name: name.into(), args: Vec::new() }
    }
}

/// A variable this predicate's aggregation depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarContext {
    pub name: String,
}

/// Shortest-path metadata attached to a subgraph level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathMeta {
    pub weight: f64,
}

/// One key or aggregate field inside a group-by group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAttr {
    pub attr: String,
    pub value: TypedValue,
}

/// One group: the key fields it groups on plus its aggregate fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub keys: Vec<GroupAttr>,
    pub aggregates: Vec<GroupAttr>,
}

/// Pre-computed group-by result for one source uid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupResults {
    pub groups: Vec<Group>,
}

// ============================================================================
// Per-predicate directives
// ============================================================================

/// Directives and bindings attached to one predicate of the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    /// Output field name override.
    pub alias: String,
    /// Language preference list for tagged string predicates.
    pub langs: Vec<String>,
    /// Name of the variable this predicate binds, for internal predicates.
    pub var: String,
    /// Variables the aggregation at this predicate depends on.
    pub needs_var: Vec<VarContext>,
    /// Pre-computed variable value per uid (aggregation results).
    pub uid_to_val: HashMap<u64, TypedValue>,

    /// `@normalize`: flatten this block into cross-product rows.
    pub normalize: bool,
    /// Attach each matched node's uid to its output object.
    pub get_uid: bool,
    /// `@ignorereflex`: prune self-referential cycles during descent.
    pub ignore_reflex: bool,
    /// Computed for side effects only; contributes nothing to the output.
    pub ignore_result: bool,
    /// Internal predicate: carries a bound variable, not a graph edge.
    pub is_internal: bool,
    /// Group-by predicate: render the pre-computed groups.
    pub is_group_by: bool,
    /// Empty query block: only aggregated variables are rendered.
    pub is_empty: bool,
    /// `expand()` marker; var-expansion predicates are skipped here.
    pub expand: String,
    /// Expand values in all languages, tagging each field name.
    pub expand_all: bool,
    /// List cardinality: repeats stay distinct array entries.
    pub list: bool,
    /// Facets were requested on this predicate.
    pub facet: bool,
    /// Shortest-path block: nodes always carry their uid.
    pub shortest: bool,

    /// Count of destination uids was requested (`count(uid)`).
    pub uid_count: bool,
    /// Alias for the uid count field; empty means the literal `count`.
    pub uid_count_alias: String,
}

// ============================================================================
// SubGraph
// ============================================================================

/// One node of the evaluated predicate tree, matrices included.
///
/// Read-only from the output layer's perspective. The uid, value, facets and
/// lang-tag matrices are all outer-indexed by the position of the source uid
/// in `src_uids`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubGraph {
    /// Predicate name.
    pub attr: String,
    pub params: Params,
    /// Function applied at this predicate (`checkpwd` is special-cased).
    pub src_fn: Option<Function>,

    /// Source uids this predicate matched, sorted.
    pub src_uids: Option<UidList>,
    /// Destination uids that survived filtering, sorted.
    pub dest_uids: Option<UidList>,

    /// Per source uid: ordered destination uids reached via this predicate.
    pub uid_matrix: Vec<Vec<u64>>,
    /// Per source uid: ordered scalar values.
    pub value_matrix: Vec<Vec<TypedValue>>,
    /// Per source uid: facets aligned with the uid/value matrix row.
    pub facets_matrix: Vec<FacetsList>,
    /// Per source uid: language tags aligned with the value matrix row.
    pub lang_tags: Vec<Vec<String>>,
    /// Per source uid: pre-computed `count(...)` results.
    pub counts: Vec<u32>,
    /// Per source uid: pre-computed group-by results.
    pub group_by_res: Vec<GroupResults>,

    /// Shortest-path weight for this level, when present.
    pub path_meta: Option<PathMeta>,

    pub children: Vec<SubGraph>,
}

impl SubGraph {
    /// Output field name: alias wins over the predicate name.
    pub fn field_name(&self) -> String {
        if !self.params.alias.is_empty() {
            return self.params.alias.clone();
        }
        self.attr.clone()
    }

    /// True for predicates that carry a bound variable instead of edge data.
    pub fn is_internal(&self) -> bool {
        self.params.is_internal
    }

    /// Field name for an aggregated-variable predicate: the alias, else
    /// `fn(val(v))` when the aggregation reads a variable, else `val(v)`.
    pub fn agg_field_name(&self) -> String {
        if !self.params.alias.is_empty() {
            return self.params.alias.clone();
        }
        let mut field = format!("val({})", self.params.var);
        if let Some(nv) = self.params.needs_var.first() {
            field = format!("val({})", nv.name);
            if let Some(f) = &self.src_fn {
                field = format!("{}({field})", f.name);
            }
        }
        field
    }
}
