//! End-to-end tests for edge cases: empty results, structural errors,
//! group-by rendering, empty-block aggregations and language misalignment.

use graphout::{
    Error, Facet, FacetValType, Facets, Function, Group, GroupAttr, GroupResults, Latency, Params,
    SubGraph, TypedValue, UidList, VarContext, to_json,
};

fn scalar_pred(attr: &str, src: Vec<u64>, rows: Vec<Vec<TypedValue>>) -> SubGraph {
    let n = src.len();
    SubGraph {
        attr: attr.into(),
        src_uids: Some(UidList::new(src)),
        uid_matrix: vec![Vec::new(); n],
        value_matrix: rows,
        ..SubGraph::default()
    }
}

fn render(sgl: &[SubGraph]) -> Result<String, Error> {
    let mut l = Latency::new();
    Ok(String::from_utf8(to_json(&mut l, sgl, 10_000)?).unwrap())
}

// ============================================================================
// 1. No roots at all → bare empty object
// ============================================================================

#[test]
fn test_no_results_yield_empty_object() {
    assert_eq!(render(&[]).unwrap(), "{}");
}

// ============================================================================
// 2. A root without a uid matrix still gets an empty key
// ============================================================================

#[test]
fn test_missing_uid_matrix_renders_empty_list() {
    let me = SubGraph {
        params: Params { alias: "me".into(), ..Params::default() },
        ..SubGraph::default()
    };
    assert_eq!(render(&[me]).unwrap(), r#"{"me":[]}"#);
}

// ============================================================================
// 3. A root whose uids were all filtered gets an empty key
// ============================================================================

#[test]
fn test_all_uids_filtered_renders_empty_list() {
    let name = scalar_pred("name", vec![0x1], vec![vec![TypedValue::Str("Ada".into())]]);
    let me = SubGraph {
        params: Params { alias: "me".into(), ..Params::default() },
        dest_uids: Some(UidList::new(Vec::new())),
        uid_matrix: vec![vec![0x1]],
        children: vec![name],
        ..SubGraph::default()
    };
    assert_eq!(render(&[me]).unwrap(), r#"{"me":[]}"#);
}

// ============================================================================
// 4. Group-by rendering at the root
// ============================================================================

#[test]
fn test_group_by_rendering() {
    let groups = GroupResults {
        groups: vec![
            Group {
                keys: vec![GroupAttr { attr: "age".into(), value: TypedValue::Int(19) }],
                aggregates: vec![GroupAttr { attr: "count".into(), value: TypedValue::Int(2) }],
            },
            Group {
                keys: vec![GroupAttr { attr: "age".into(), value: TypedValue::Int(22) }],
                aggregates: vec![GroupAttr { attr: "count".into(), value: TypedValue::Int(1) }],
            },
        ],
    };
    let me = SubGraph {
        params: Params { alias: "byAge".into(), is_group_by: true, ..Params::default() },
        uid_matrix: vec![vec![0x1]],
        group_by_res: vec![groups],
        ..SubGraph::default()
    };

    assert_eq!(
        render(&[me]).unwrap(),
        r#"{"byAge":[{"@groupby":[{"age":19,"count":2},{"age":22,"count":1}]}]}"#
    );
}

// ============================================================================
// 5. A group-by root without results is a structural error
// ============================================================================

#[test]
fn test_group_by_without_results_is_fatal() {
    let me = SubGraph {
        params: Params { alias: "byAge".into(), is_group_by: true, ..Params::default() },
        uid_matrix: vec![vec![0x1]],
        ..SubGraph::default()
    };
    assert!(matches!(render(&[me]).unwrap_err(), Error::EmptyGroupBy));
}

// ============================================================================
// 6. A group-by child with fewer rows than source uids is a structural error
// ============================================================================

#[test]
fn test_group_by_child_short_rows_is_fatal() {
    let by_age = SubGraph {
        attr: "friend".into(),
        params: Params { is_group_by: true, ..Params::default() },
        src_uids: Some(UidList::new(vec![0x1])),
        uid_matrix: vec![vec![0x2]],
        group_by_res: Vec::new(), // missing the row for 0x1
        ..SubGraph::default()
    };
    let me = SubGraph {
        params: Params { alias: "me".into(), ..Params::default() },
        dest_uids: Some(UidList::new(vec![0x1])),
        uid_matrix: vec![vec![0x1]],
        children: vec![by_age],
        ..SubGraph::default()
    };
    assert!(matches!(
        render(&[me]).unwrap_err(),
        Error::GroupByLength { idx: 0, len: 0 }
    ));
}

// ============================================================================
// 7. Empty-block aggregations
// ============================================================================

#[test]
fn test_empty_block_renders_aggregations() {
    let mut uid_to_val = hashbrown::HashMap::new();
    uid_to_val.insert(0u64, TypedValue::Float(42.0));
    let avg = SubGraph {
        params: Params {
            is_internal: true,
            needs_var: vec![VarContext { name: "a".into() }],
            uid_to_val,
            ..Params::default()
        },
        src_fn: Some(Function::new("avg")),
        ..SubGraph::default()
    };
    let me = SubGraph {
        params: Params { alias: "me".into(), is_empty: true, ..Params::default() },
        children: vec![avg],
        ..SubGraph::default()
    };

    assert_eq!(render(&[me]).unwrap(), r#"{"me":[{"avg(val(a))":42.000000}]}"#);
}

#[test]
fn test_empty_block_without_vars_is_fatal() {
    let dangling = SubGraph {
        params: Params { is_internal: true, ..Params::default() },
        ..SubGraph::default()
    };
    let me = SubGraph {
        params: Params { alias: "me".into(), is_empty: true, ..Params::default() },
        children: vec![dangling],
        ..SubGraph::default()
    };
    assert!(matches!(render(&[me]).unwrap_err(), Error::EmptyBlockAggregation));
}

#[test]
fn test_empty_block_unset_vars_render_zero() {
    let unset = SubGraph {
        params: Params {
            is_internal: true,
            needs_var: vec![VarContext { name: "a".into() }],
            ..Params::default()
        },
        src_fn: Some(Function::new("sum")),
        ..SubGraph::default()
    };
    let me = SubGraph {
        params: Params { alias: "me".into(), is_empty: true, ..Params::default() },
        children: vec![unset],
        ..SubGraph::default()
    };
    assert_eq!(render(&[me]).unwrap(), r#"{"me":[{"sum(val(a))":0.000000}]}"#);
}

// ============================================================================
// 8. expand-all with a missing language tag is a structural error
// ============================================================================

#[test]
fn test_expand_all_misaligned_tags_fatal() {
    let mut name = scalar_pred(
        "name",
        vec![0x1],
        vec![vec![
            TypedValue::Str("Ada".into()),
            TypedValue::Str("Adah".into()),
        ]],
    );
    name.params.expand_all = true;
    name.lang_tags = vec![vec!["en".into()]]; // second value has no tag
    let me = SubGraph {
        params: Params { alias: "me".into(), ..Params::default() },
        dest_uids: Some(UidList::new(vec![0x1])),
        uid_matrix: vec![vec![0x1]],
        children: vec![name],
        ..SubGraph::default()
    };
    assert!(matches!(render(&[me]).unwrap_err(), Error::LangTagMismatch));
}

// ============================================================================
// 9. Malformed facet bytes abort the build
// ============================================================================

#[test]
fn test_malformed_facet_is_fatal() {
    let mut name = scalar_pred("name", vec![0x1], vec![vec![TypedValue::Str("Ada".into())]]);
    name.facets_matrix = vec![vec![Facets {
        facets: vec![Facet::new("weight", FacetValType::Float, vec![1, 2])],
    }]];
    let me = SubGraph {
        params: Params { alias: "me".into(), ..Params::default() },
        dest_uids: Some(UidList::new(vec![0x1])),
        uid_matrix: vec![vec![0x1]],
        children: vec![name],
        ..SubGraph::default()
    };
    assert!(matches!(render(&[me]).unwrap_err(), Error::FacetDecode { .. }));
}

// ============================================================================
// 10. Predicates flagged ignore_result contribute nothing
// ============================================================================

#[test]
fn test_ignore_result_predicate_skipped() {
    let mut hidden = scalar_pred("secret", vec![0x1], vec![vec![TypedValue::Str("x".into())]]);
    hidden.params.ignore_result = true;
    let name = scalar_pred("name", vec![0x1], vec![vec![TypedValue::Str("Ada".into())]]);
    let me = SubGraph {
        params: Params { alias: "me".into(), ..Params::default() },
        dest_uids: Some(UidList::new(vec![0x1])),
        uid_matrix: vec![vec![0x1]],
        children: vec![hidden, name],
        ..SubGraph::default()
    };
    assert_eq!(render(&[me]).unwrap(), r#"{"me":[{"name":"Ada"}]}"#);
}
