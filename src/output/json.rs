//! JsonNode — the production [`OutputNode`] implementation.
//!
//! A mutable ordered tree whose leaves hold pre-encoded scalar bytes, plus
//! the encoder that writes it out as compact JSON. The encoder groups
//! *consecutive* same-named siblings into arrays; insertion order is
//! preserved everywhere else.

use hashbrown::HashMap;

use super::OutputNode;
use super::codec::val_to_bytes;
use crate::model::TypedValue;

/// One node of the output tree.
///
/// Either a leaf (`scalar_val` set, `attrs` empty) or an internal node
/// (`attrs` set, `scalar_val` empty). `order` is an encode-time sort key:
/// it is refreshed to the current position when encoding starts, not
/// assigned at creation, so nodes merged from multiple sources sort by
/// where they ended up.
#[derive(Debug, Clone, Default)]
pub struct JsonNode {
    pub(crate) attr: String,
    /// Relative ordering (for sorted results); refreshed at encode time.
    pub(crate) order: usize,
    pub(crate) is_child: bool,
    pub(crate) scalar_val: Vec<u8>,
    pub(crate) attrs: Vec<JsonNode>,
    pub(crate) list: bool,
    /// First position of each attribute name in `attrs`, kept alongside the
    /// ordered sequence so merge-by-name stays O(1) per lookup.
    first_seen: HashMap<String, usize>,
}

impl JsonNode {
    pub(crate) fn scalar(attr: &str, val: Vec<u8>, list: bool) -> JsonNode {
        JsonNode {
            attr: attr.to_owned(),
            scalar_val: val,
            list,
            ..JsonNode::default()
        }
    }

    /// Rebuild a node from a flat attribute row (normalized output).
    pub(crate) fn from_attrs(attrs: Vec<JsonNode>) -> JsonNode {
        let mut node = JsonNode::default();
        for a in attrs {
            node.push_attr(a);
        }
        node
    }

    fn push_attr(&mut self, node: JsonNode) {
        self.first_seen
            .entry(node.attr.clone())
            .or_insert(self.attrs.len());
        self.attrs.push(node);
    }

    fn write_key(&self, out: &mut Vec<u8>) {
        out.push(b'"');
        out.extend_from_slice(self.attr.as_bytes());
        out.push(b'"');
        out.push(b':');
    }

    /// Serialize this subtree.
    ///
    /// A leaf writes its scalar bytes verbatim; an internal node writes an
    /// object, wrapping every run of consecutive same-named children in one
    /// array. A lone child that is structural or list-tagged still gets a
    /// single-element array; a lone plain scalar is written bare.
    pub fn encode(&mut self, out: &mut Vec<u8>) {
        // Set relative ordering to the current position. Stored order is
        // stale once children have been merged in from multiple sources.
        for (i, a) in self.attrs.iter_mut().enumerate() {
            a.order = i;
        }

        if self.attrs.is_empty() {
            out.extend_from_slice(&self.scalar_val);
            return;
        }

        out.push(b'{');
        let n = self.attrs.len();
        let mut i = 0;
        while i < n {
            let mut j = i + 1;
            while j < n && self.attrs[j].attr == self.attrs[i].attr {
                j += 1;
            }
            if i > 0 {
                out.push(b',');
            }
            self.attrs[i].write_key(out);
            let wrap = j - i > 1 || self.attrs[i].is_child || self.attrs[i].list;
            if wrap {
                out.push(b'[');
            }
            for k in i..j {
                if k > i {
                    out.push(b',');
                }
                self.attrs[k].encode(out);
            }
            if wrap {
                out.push(b']');
            }
            i = j;
        }
        out.push(b'}');
    }
}

impl OutputNode for JsonNode {
    fn new(attr: &str) -> Self {
        JsonNode {
            attr: attr.to_owned(),
            ..JsonNode::default()
        }
    }

    fn add_list_value(&mut self, attr: &str, v: TypedValue, list: bool) {
        match val_to_bytes(&v) {
            Ok(bs) => self.push_attr(JsonNode::scalar(attr, bs, list)),
            // Unrenderable values drop out of the result, never fail it.
            Err(err) => tracing::debug!(attr, %err, "dropping unrenderable value"),
        }
    }

    fn add_map_child(&mut self, attr: &str, mut node: Self, _is_root: bool) {
        match self.first_seen.get(attr) {
            Some(&pos) => {
                // Shallow merge: append the new subtree's children into the
                // existing same-named child.
                let existing = &mut self.attrs[pos];
                for a in node.attrs {
                    existing.push_attr(a);
                }
            }
            None => {
                node.attr = attr.to_owned();
                node.is_child = false;
                self.push_attr(node);
            }
        }
    }

    fn add_list_child(&mut self, attr: &str, mut child: Self) {
        child.attr = attr.to_owned();
        child.is_child = true;
        self.push_attr(child);
    }

    fn set_uid(&mut self, uid: u64, attr: &str) {
        // The uid may legitimately be set twice (debug and recursive paths);
        // the reserved name wins once.
        if attr == "uid" && self.first_seen.contains_key(attr) {
            return;
        }
        self.push_attr(JsonNode::scalar(attr, format!("\"{uid:#x}\"").into_bytes(), false));
    }

    fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encoded(node: &mut JsonNode) -> String {
        let mut out = Vec::new();
        node.encode(&mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_leaf_writes_scalar_verbatim() {
        let mut leaf = JsonNode::scalar("x", b"\"v\"".to_vec(), false);
        assert_eq!(encoded(&mut leaf), r#""v""#);
    }

    #[test]
    fn test_consecutive_grouping_only() {
        // Siblings [a, a, b, a]: the first two a's form one array, b stays
        // bare, the trailing a gets its own single-element array.
        let mut n = JsonNode::new("root");
        n.add_value("a", TypedValue::Int(1));
        n.add_value("a", TypedValue::Int(2));
        n.add_value("b", TypedValue::Int(3));
        n.add_value("a", TypedValue::Int(4));
        assert_eq!(encoded(&mut n), r#"{"a":[1,2],"b":3,"a":[4]}"#);
    }

    #[test]
    fn test_lone_structural_child_still_wrapped() {
        let mut n = JsonNode::new("root");
        let mut c = JsonNode::new("friend");
        c.add_value("name", TypedValue::Str("Bea".into()));
        n.add_list_child("friend", c);
        assert_eq!(encoded(&mut n), r#"{"friend":[{"name":"Bea"}]}"#);
    }

    #[test]
    fn test_lone_list_tagged_scalar_wrapped() {
        let mut n = JsonNode::new("root");
        n.add_list_value("tag", TypedValue::Str("x".into()), true);
        assert_eq!(encoded(&mut n), r#"{"tag":["x"]}"#);
    }

    #[test]
    fn test_map_child_attaches_bare_and_merges() {
        let mut n = JsonNode::new("root");

        let mut first = JsonNode::new("friend");
        first.add_value("name", TypedValue::Str("Bea".into()));
        n.add_map_child("friend", first, false);

        let mut second = JsonNode::new("friend");
        second.add_value("age", TypedValue::Int(30));
        n.add_map_child("friend", second, false);

        // One merged object, not two siblings, and not array-wrapped.
        assert_eq!(encoded(&mut n), r#"{"friend":{"name":"Bea","age":30}}"#);
    }

    #[test]
    fn test_set_uid_idempotent_for_reserved_name() {
        let mut n = JsonNode::new("root");
        n.set_uid(0x1, "uid");
        n.set_uid(0x2, "uid");
        assert_eq!(encoded(&mut n), r#"{"uid":"0x1"}"#);

        // Non-reserved names are not deduplicated.
        let mut m = JsonNode::new("root");
        m.set_uid(0x1, "me");
        m.set_uid(0x2, "me");
        assert_eq!(encoded(&mut m), r#"{"me":["0x1","0x2"]}"#);
    }

    #[test]
    fn test_unrenderable_value_dropped_silently() {
        let mut n = JsonNode::new("root");
        n.add_value("emb", TypedValue::Vector(vec![1.0]));
        n.add_value("name", TypedValue::Str("Alice".into()));
        assert_eq!(encoded(&mut n), r#"{"name":"Alice"}"#);
    }

    #[test]
    fn test_is_empty_tracks_children() {
        let mut n = JsonNode::new("root");
        assert!(n.is_empty());
        n.add_value("a", TypedValue::Int(1));
        assert!(!n.is_empty());
    }

    #[test]
    fn test_encode_is_idempotent() {
        let mut n = JsonNode::new("root");
        n.add_value("a", TypedValue::Int(1));
        let mut c = JsonNode::new("friend");
        c.add_value("name", TypedValue::Str("Bea".into()));
        n.add_list_child("friend", c);

        let first = encoded(&mut n);
        let second = encoded(&mut n);
        assert_eq!(first, second);
    }
}
