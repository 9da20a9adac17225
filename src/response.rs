//! Top-level assembly — roots to bytes, plus latency bookkeeping.
//!
//! Orchestrates tree building, `@normalize` flattening and encoding across
//! the list of root subgraphs. The extensions envelope is defined here but
//! attached by the caller: transport concerns stay outside this crate.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::model::SubGraph;
use crate::output::{JsonNode, OutputNode};
use crate::traverse::{ParentStack, Traversal, pre_traverse};

/// Serialize the evaluated root subgraphs into the final JSON bytes.
///
/// Roots aliased `"var"` or `"shortest"` exist for the evaluator's benefit
/// and are skipped. An entirely empty result serializes as `{}`.
/// `normalize_limit` is the cumulative element ceiling for `@normalize`
/// output, threaded through explicitly so callers and tests control it.
pub fn to_json(l: &mut Latency, sgl: &[SubGraph], normalize_limit: usize) -> Result<Vec<u8>> {
    let mut root = JsonNode::new("_root_");
    for sg in sgl {
        if sg.params.alias == "var" || sg.params.alias == "shortest" {
            continue;
        }
        process_node_uids(&mut root, sg, normalize_limit)?;
    }

    let mut out = Vec::new();
    if root.is_empty() {
        out.extend_from_slice(b"{}");
    } else {
        root.encode(&mut out);
    }
    tracing::debug!(bytes = out.len(), "encoded query response");

    l.json = l
        .start
        .elapsed()
        .saturating_sub(l.parsing + l.processing + l.transport);
    Ok(out)
}

/// Build the output rows for one root subgraph and attach them to `fj`.
fn process_node_uids(fj: &mut JsonNode, sg: &SubGraph, normalize_limit: usize) -> Result<()> {
    if sg.params.is_empty {
        return fj.add_aggregations(sg);
    }

    if sg.uid_matrix.is_empty() {
        fj.add_list_child(&sg.params.alias, JsonNode::new(""));
        return Ok(());
    }

    let mut has_child = false;
    if sg.params.uid_count && !(sg.params.uid_count_alias.is_empty() && sg.params.normalize) {
        has_child = true;
        fj.add_count_at_root(sg);
    }

    if sg.params.is_group_by {
        let Some(first) = sg.group_by_res.first() else {
            return Err(crate::Error::EmptyGroupBy);
        };
        fj.add_groupby(first, &sg.params.alias);
        return Ok(());
    }

    let root_row = sg.uid_matrix.first().map_or(&[][..], Vec::as_slice);
    let mut parent_ids = ParentStack::new();
    for &uid in root_row {
        if sg.dest_uids.as_ref().is_none_or(|d| !d.contains(uid)) {
            // This uid was filtered, so ignore it.
            continue;
        }

        let mut n1 = JsonNode::new(&sg.params.alias);
        match pre_traverse(sg, uid, &mut n1, &mut parent_ids)? {
            Traversal::Pruned => continue,
            Traversal::Populated => {}
        }
        if n1.is_empty() {
            continue;
        }

        has_child = true;
        if !sg.params.normalize {
            fj.add_list_child(&sg.params.alias, n1);
            continue;
        }

        for row in n1.normalize(normalize_limit)? {
            fj.add_list_child(&sg.params.alias, JsonNode::from_attrs(row));
        }
    }

    if !has_child {
        // Return an empty key when the root matched nothing.
        fj.add_list_child(&sg.params.alias, JsonNode::new(""));
    }
    Ok(())
}

// ============================================================================
// Latency bookkeeping
// ============================================================================

/// Elapsed-time split across the query pipeline phases. The caller fills
/// `parsing` / `processing` / `transport`; [`to_json`] fills `json` with
/// whatever remains of the total.
#[derive(Debug, Clone)]
pub struct Latency {
    pub start: Instant,
    pub parsing: Duration,
    pub processing: Duration,
    pub transport: Duration,
    pub json: Duration,
}

impl Latency {
    pub fn new() -> Self {
        Latency {
            start: Instant::now(),
            parsing: Duration::ZERO,
            processing: Duration::ZERO,
            transport: Duration::ZERO,
            json: Duration::ZERO,
        }
    }

    /// Wire-format summary for the extensions envelope.
    pub fn summary(&self) -> LatencySummary {
        LatencySummary {
            parsing_ns: self.parsing.as_nanos() as u64,
            processing_ns: self.processing.as_nanos() as u64,
            encoding_ns: self.json.as_nanos() as u64,
            total_ns: self.start.elapsed().as_nanos() as u64,
        }
    }
}

impl Default for Latency {
    fn default() -> Self {
        Latency::new()
    }
}

// ============================================================================
// Extensions envelope
// ============================================================================

/// Per-phase latency in nanoseconds, as reported to clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencySummary {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub parsing_ns: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub processing_ns: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub encoding_ns: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total_ns: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

/// Transaction metadata echoed back to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnContext {
    pub start_ts: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub commit_ts: u64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub aborted: bool,
}

/// Extra information appended to query results by the caller.
///
/// Response bodies only carry `data`, `errors` and `extensions` as top-level
/// keys, so server latency travels under the extensions key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_latency: Option<LatencySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txn: Option<TxnContext>,
}
