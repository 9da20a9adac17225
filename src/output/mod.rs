//! # Output Node Trait
//!
//! This is THE contract between the recursive tree builder and any concrete
//! wire format. The builder only ever talks to [`OutputNode`]; a new output
//! format means a new implementation of this trait, not a new builder.
//!
//! ## Implementations
//!
//! | Node | Module | Description |
//! |------|--------|-------------|
//! | [`JsonNode`] | `json` | Compact JSON with consecutive-sibling array grouping |

pub mod codec;
pub mod json;
pub mod normalize;

use crate::Result;
use crate::model::{GroupResults, SubGraph, TypedValue};

pub use codec::val_to_bytes;
pub use json::JsonNode;

/// A mutable, ordered output tree under construction.
///
/// Invariant: a node is either a leaf (scalar bytes, no children) or an
/// internal node (children, no scalar bytes). `is_empty` is true iff no
/// children have been attached.
pub trait OutputNode: Sized {
    /// Construct a fresh, empty node for the given attribute.
    fn new(attr: &str) -> Self;

    /// Append a scalar leaf. Equivalent to `add_list_value(attr, v, false)`.
    fn add_value(&mut self, attr: &str, v: TypedValue) {
        self.add_list_value(attr, v, false);
    }

    /// Append a scalar leaf, optionally tagged for list rendering. A value
    /// the codec cannot render is dropped; the tree never fails for it.
    fn add_list_value(&mut self, attr: &str, v: TypedValue, list: bool);

    /// Attach a child subtree under `attr`, merging into an existing child of
    /// the same name (shallow: grandchildren lists are appended).
    fn add_map_child(&mut self, attr: &str, node: Self, is_root: bool);

    /// Attach a child subtree under `attr`, always as a new sibling.
    fn add_list_child(&mut self, attr: &str, child: Self);

    /// Attach the node's identifier as a scalar field. Idempotent for the
    /// reserved name `"uid"`: a second call with it is a no-op.
    fn set_uid(&mut self, uid: u64, attr: &str);

    /// True iff no children have been attached.
    fn is_empty(&self) -> bool;

    // ------------------------------------------------------------------
    // Internal-use extensions for the tree builder. Default implementations
    // are expressed in terms of the generic operations above.
    // ------------------------------------------------------------------

    /// Render a root-level `count(uid)` block.
    fn add_count_at_root(&mut self, sg: &SubGraph) {
        let count = sg.dest_uids.as_ref().map_or(0, |d| d.len()) as i64;
        let mut n1 = Self::new(&sg.params.alias);
        let field = if sg.params.uid_count_alias.is_empty() {
            "count"
        } else {
            sg.params.uid_count_alias.as_str()
        };
        n1.add_value(field, TypedValue::Int(count));
        self.add_list_child(&sg.params.alias, n1);
    }

    /// Render a pre-computed group-by result as a nested `@groupby` list.
    fn add_groupby(&mut self, res: &GroupResults, fname: &str) {
        // Don't add an empty group-by.
        if res.groups.is_empty() {
            return;
        }
        let mut g = Self::new(fname);
        for grp in &res.groups {
            let mut uc = Self::new("@groupby");
            for it in &grp.keys {
                uc.add_value(&it.attr, it.value.clone());
            }
            for it in &grp.aggregates {
                uc.add_value(&it.attr, it.value.clone());
            }
            g.add_list_child("@groupby", uc);
        }
        self.add_list_child(fname, g);
    }

    /// Render the aggregated variables of an empty query block.
    ///
    /// A child without a pre-computed value and without variable dependencies
    /// is a structural error; with dependencies it means the aggregation was
    /// run over unset variables and renders as zero.
    fn add_aggregations(&mut self, sg: &SubGraph) -> Result<()> {
        for child in &sg.children {
            let agg_val = match child.params.uid_to_val.get(&0) {
                Some(v) => v.clone(),
                None if child.params.needs_var.is_empty() => {
                    return Err(crate::Error::EmptyBlockAggregation);
                }
                None => TypedValue::Float(0.0),
            };
            if child.params.normalize && child.params.alias.is_empty() {
                continue;
            }
            let field_name = child.agg_field_name();
            let mut n1 = Self::new(&field_name);
            n1.add_value(&field_name, agg_val);
            self.add_list_child(&sg.params.alias, n1);
        }
        if self.is_empty() {
            self.add_list_child(&sg.params.alias, Self::new(""));
        }
        Ok(())
    }
}
