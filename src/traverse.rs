//! Tree Builder — recursive descent over the evaluated predicate tree.
//!
//! `pre_traverse` populates an [`OutputNode`] with one row of results for a
//! single source uid, walking every child predicate of the current subgraph
//! level. The builder is generic over the output representation; it never
//! touches encoding.

use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::model::{Facets, SubGraph, TypedValue, facet_name};
use crate::output::OutputNode;
use crate::{Error, Result};

/// Stack of currently-open ancestor uids, maintained while `@ignorereflex`
/// levels are being descended. It exactly mirrors the open recursion path.
pub type ParentStack = SmallVec<[u64; 8]>;

/// Outcome of one traversal call.
///
/// `Pruned` is the distinguished "this subtree is invalid, drop it" signal:
/// it is recognized by value at the recursion frame that issued the child
/// call and converted into a per-destination skip. It is not an error and
/// must never propagate past that frame as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    Populated,
    Pruned,
}

/// Populate `dst` with the results for `uid` at this subgraph level.
///
/// Self-references are pruned when the level carries `@ignorereflex`: a uid
/// already open on the ancestor stack yields `Pruned` without touching `dst`.
pub fn pre_traverse<N: OutputNode>(
    sg: &SubGraph,
    uid: u64,
    dst: &mut N,
    parent_ids: &mut ParentStack,
) -> Result<Traversal> {
    if sg.params.ignore_reflex {
        if parent_ids.contains(&uid) {
            // A node can't have itself as the child at any level.
            return Ok(Traversal::Pruned);
        }
        // Push before descending so children see the full open path.
        parent_ids.push(uid);
    }

    let res = traverse_children(sg, uid, dst, parent_ids);

    if sg.params.ignore_reflex {
        parent_ids.pop();
    }
    res?;

    // Only shortest-path queries want the uid even when nothing else exists
    // at this level.
    if (sg.params.get_uid && !dst.is_empty()) || sg.params.shortest {
        dst.set_uid(uid, "uid");
    }

    if let Some(pm) = &sg.path_meta {
        dst.add_value("_weight_", TypedValue::Float(pm.weight));
    }

    Ok(Traversal::Populated)
}

fn traverse_children<N: OutputNode>(
    sg: &SubGraph,
    uid: u64,
    dst: &mut N,
    parent_ids: &mut ParentStack,
) -> Result<()> {
    let mut invalid_uids: Option<HashSet<u64>> = None;

    for pc in &sg.children {
        if pc.params.ignore_result {
            continue;
        }
        if pc.is_internal() {
            if !pc.params.expand.is_empty() {
                continue;
            }
            if pc.params.normalize && pc.params.alias.is_empty() {
                continue;
            }
            add_internal_node(pc, uid, dst);
            continue;
        }

        if pc.uid_matrix.is_empty() {
            // Can happen in recurse queries.
            continue;
        }
        if !pc.facets_matrix.is_empty() && pc.facets_matrix.len() != pc.uid_matrix.len() {
            return Err(Error::FacetMismatch {
                facets: pc.facets_matrix.len(),
                uids: pc.uid_matrix.len(),
            });
        }

        let Some(idx) = pc.src_uids.as_ref().and_then(|s| s.index_of(uid)) else {
            // This uid did not match this predicate.
            continue;
        };

        if pc.params.is_group_by {
            let Some(res) = pc.group_by_res.get(idx) else {
                return Err(Error::GroupByLength { idx, len: pc.group_by_res.len() });
            };
            dst.add_groupby(res, &pc.field_name());
            continue;
        }

        let mut field_name = pc.field_name();
        if !pc.counts.is_empty() {
            add_count(pc, u64::from(pc.counts[idx]), dst);
        } else if pc.src_fn.as_ref().is_some_and(|f| f.name == "checkpwd") {
            let vals = pc.value_matrix.get(idx).map_or(&[][..], Vec::as_slice);
            add_check_pwd(pc, vals, dst);
        } else if let Some(ul) = pc.uid_matrix.get(idx).filter(|row| !row.is_empty()) {
            // Edge predicate: one child node per destination uid.
            let fcs_list: &[Facets] = if pc.params.facet {
                pc.facets_matrix.get(idx).map_or(&[][..], Vec::as_slice)
            } else {
                &[]
            };

            for (child_idx, &child_uid) in ul.iter().enumerate() {
                if field_name.is_empty()
                    || invalid_uids.as_ref().is_some_and(|m| m.contains(&child_uid))
                {
                    continue;
                }
                let mut uc = N::new(&field_name);
                match pre_traverse(pc, child_uid, &mut uc, parent_ids) {
                    Ok(Traversal::Pruned) => {
                        invalid_uids.get_or_insert_default().insert(child_uid);
                        continue; // next destination uid
                    }
                    Ok(Traversal::Populated) => {}
                    Err(rerr) => {
                        tracing::error!(error = %rerr, "error while traversal");
                        return Err(rerr);
                    }
                }

                if pc.params.facet {
                    if let Some(fs) = fcs_list.get(child_idx) {
                        for f in &fs.facets {
                            let f_val = f.decode()?;
                            uc.add_value(&facet_name(&field_name, f), f_val);
                        }
                    }
                }

                if !uc.is_empty() {
                    if sg.params.get_uid {
                        uc.set_uid(child_uid, "uid");
                    }
                    if pc.params.list {
                        dst.add_list_child(&field_name, uc);
                    } else {
                        dst.add_map_child(&field_name, uc, false);
                    }
                }
            }

            if pc.params.uid_count && !(pc.params.uid_count_alias.is_empty() && pc.params.normalize)
            {
                let mut uc = N::new(&field_name);
                let alias = if pc.params.uid_count_alias.is_empty() {
                    "count"
                } else {
                    pc.params.uid_count_alias.as_str()
                };
                uc.add_value(alias, TypedValue::Int(ul.len() as i64));
                dst.add_list_child(&field_name, uc);
            }
        } else {
            // Scalar-value predicate.
            if pc.params.alias.is_empty() && !pc.params.langs.is_empty() {
                field_name.push('@');
                field_name.push_str(&pc.params.langs.join(":"));
            }

            if pc.attr == "uid" {
                dst.set_uid(uid, &pc.field_name());
                continue;
            }

            // A scalar value carries at most one facet set, on the first
            // position of the row.
            if let Some(first) = pc.facets_matrix.get(idx).and_then(|fl| fl.first()) {
                for f in &first.facets {
                    let f_val = f.decode()?;
                    dst.add_value(&facet_name(&field_name, f), f_val);
                }
            }

            let Some(values) = pc.value_matrix.get(idx) else {
                continue;
            };

            for (i, sv) in values.iter().enumerate() {
                let tags = pc.lang_tags.get(idx).map_or(&[][..], Vec::as_slice);
                if pc.params.expand_all && !tags.is_empty() {
                    let Some(lang) = tags.get(i) else {
                        return Err(Error::LangTagMismatch);
                    };
                    let mut tagged_name = field_name.clone();
                    if !lang.is_empty() {
                        tagged_name.push('@');
                        tagged_name.push_str(lang);
                    }
                    let encode_as_list = pc.params.list && lang.is_empty();
                    dst.add_list_value(&tagged_name, sv.clone(), encode_as_list);
                    continue;
                }

                let encode_as_list = pc.params.list && pc.params.langs.is_empty();
                if !pc.params.normalize {
                    dst.add_list_value(&field_name, sv.clone(), encode_as_list);
                    continue;
                }
                // Under @normalize only aliased predicates are rendered;
                // unaliased ones would duplicate what normalization surfaces.
                if !pc.params.alias.is_empty() {
                    dst.add_list_value(&field_name, sv.clone(), encode_as_list);
                }
            }
        }
    }

    Ok(())
}

/// Render an already-computed variable value (aggregation result) for `uid`.
/// No binding for this uid means nothing is added; that is not an error.
fn add_internal_node<N: OutputNode>(pc: &SubGraph, uid: u64, dst: &mut N) {
    let Some(sv) = pc.params.uid_to_val.get(&uid) else {
        return;
    };
    dst.add_value(&pc.agg_field_name(), sv.clone());
}

fn add_count<N: OutputNode>(pc: &SubGraph, count: u64, dst: &mut N) {
    if pc.params.normalize && pc.params.alias.is_empty() {
        return;
    }
    let field_name = if pc.params.alias.is_empty() {
        format!("count({})", pc.attr)
    } else {
        pc.params.alias.clone()
    };
    dst.add_value(&field_name, TypedValue::Int(count as i64));
}

fn add_check_pwd<N: OutputNode>(pc: &SubGraph, vals: &[TypedValue], dst: &mut N) {
    let checked = vals.first().is_some_and(TypedValue::as_bool_lenient);
    let field_name = if pc.params.alias.is_empty() {
        format!("checkpwd({})", pc.attr)
    } else {
        pc.params.alias.clone()
    };
    dst.add_value(&field_name, TypedValue::Bool(checked));
}
