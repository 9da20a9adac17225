//! Normalizer — `@normalize` flattening of a built subtree.
//!
//! Re-expresses a tree with repeated child groups as the cross-product of
//! flat rows. Applied bottom-up: children are normalized before being merged
//! into their parent's row set. A cumulative element count enforces the
//! configured ceiling so pathological queries fail instead of exploding.

use super::json::JsonNode;
use crate::{Error, Result};

/// Cross-product merge of a parent row set with a child row set.
///
/// Produces up to M×N rows, each the concatenation of one parent row and one
/// child row. The running element count (sum of row lengths) is checked after
/// every pairwise combination; exceeding `limit` aborts the whole normalize.
pub(crate) fn merge(
    parent: Vec<Vec<JsonNode>>,
    child: Vec<Vec<JsonNode>>,
    limit: usize,
) -> Result<Vec<Vec<JsonNode>>> {
    if parent.is_empty() {
        return Ok(child);
    }

    let mut merged = Vec::with_capacity(parent.len() * child.len());
    let mut cnt = 0usize;
    for pa in &parent {
        for ca in &child {
            cnt += pa.len() + ca.len();
            if cnt > limit {
                return Err(Error::NormalizeLimit);
            }
            let mut row = Vec::with_capacity(pa.len() + ca.len());
            row.extend(pa.iter().cloned());
            row.extend(ca.iter().cloned());
            merged.push(row);
        }
    }
    Ok(merged)
}

impl JsonNode {
    /// Flatten this subtree into rows of plain attributes.
    ///
    /// A node with no structural children yields exactly one row: its own
    /// attributes. Otherwise the node's scalar attributes form the base row,
    /// and each run of consecutive same-named children is normalized
    /// recursively and merged in by cross-product. Each finished row is
    /// sorted by field name (stable, so ties keep their relative position)
    /// and only the earliest `"uid"` field survives.
    pub fn normalize(self, limit: usize) -> Result<Vec<Vec<JsonNode>>> {
        let child_cnt = self.attrs.iter().filter(|a| a.is_child).count();
        if child_cnt == 0 {
            // Recursion base case: no children, the attribute row is final.
            return Ok(vec![self.attrs]);
        }

        // The parent's own scalar attributes seed the row set so children
        // can be merged against them.
        let base: Vec<JsonNode> = self
            .attrs
            .iter()
            .filter(|a| !a.is_child)
            .cloned()
            .collect();
        let mut parent_rows = vec![base];

        let mut iter = self.attrs.into_iter().peekable();
        while let Some(node) = iter.next() {
            if !node.is_child {
                continue;
            }
            let name = node.attr.clone();
            let mut child_rows = node.normalize(limit)?;
            while let Some(next) = iter.next_if(|n| n.attr == name) {
                child_rows.extend(next.normalize(limit)?);
            }
            parent_rows = merge(parent_rows, child_rows, limit)?;
        }

        for row in &mut parent_rows {
            row.sort_by(|a, b| a.attr.cmp(&b.attr).then(a.order.cmp(&b.order)));
            let mut seen_uid = false;
            row.retain(|n| {
                if n.attr == "uid" {
                    if seen_uid {
                        return false;
                    }
                    seen_uid = true;
                }
                true
            });
        }

        Ok(parent_rows)
    }
}
