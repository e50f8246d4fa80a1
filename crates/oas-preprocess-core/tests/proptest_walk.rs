//! Property-based tests for walking arbitrary reference graphs.
//!
//! Component schemas reference each other at random through `allOf`,
//! `oneOf`, and `properties`, including self-references and cycles. The
//! walk must terminate, visit every component exactly once, and never fail.

use oas_preprocess_core::{preprocess_document, PreprocessOptions};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone)]
enum Edge {
    AllOf(usize),
    OneOf(usize),
    Property(usize),
}

fn arb_graph() -> impl Strategy<Value = Vec<Vec<Edge>>> {
    (1usize..8).prop_flat_map(|size| {
        let edge = prop_oneof![
            (0..size).prop_map(Edge::AllOf),
            (0..size).prop_map(Edge::OneOf),
            (0..size).prop_map(Edge::Property),
        ];
        proptest::collection::vec(proptest::collection::vec(edge, 0..4), size)
    })
}

fn reference(target: usize) -> Value {
    json!({ "$ref": format!("#/components/schemas/S{target}") })
}

/// Build the component for one node. Combinators win over properties, so
/// a node with any combinator edge only keeps those.
fn schema(edges: &[Edge]) -> Value {
    let all_of: Vec<Value> = edges
        .iter()
        .filter_map(|e| match e {
            Edge::AllOf(t) => Some(reference(*t)),
            _ => None,
        })
        .collect();
    let one_of: Vec<Value> = edges
        .iter()
        .filter_map(|e| match e {
            Edge::OneOf(t) => Some(reference(*t)),
            _ => None,
        })
        .collect();
    let mut properties = Map::new();
    for (i, edge) in edges.iter().enumerate() {
        if let Edge::Property(t) = edge {
            properties.insert(format!("p{i}"), reference(*t));
        }
    }

    let mut schema = json!({ "type": "object", "properties": properties });
    if !all_of.is_empty() {
        schema["allOf"] = Value::Array(all_of);
    } else if !one_of.is_empty() {
        schema["oneOf"] = Value::Array(one_of);
        schema["discriminator"] = json!({ "propertyName": "kind" });
    }
    schema
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, ..Default::default() })]

    #[test]
    fn walk_terminates_and_visits_each_component_once(graph in arb_graph()) {
        let schemas: Map<String, Value> = graph
            .iter()
            .enumerate()
            .map(|(i, edges)| (format!("S{i}"), schema(edges)))
            .collect();
        let document = json!({ "openapi": "3.0.3", "paths": {}, "components": { "schemas": schemas } });

        let output = preprocess_document(document, &PreprocessOptions::default()).unwrap();
        // Every component is a root with a concrete schema; references only
        // ever point at components, so nothing else is visited.
        prop_assert_eq!(output.stats.visited, graph.len());
        prop_assert_eq!(output.stats.unresolved, 0);
    }
}
