//! The JSON graph loader.
//!
//! The input shape is the checker's external contract:
//!
//! ```json
//! { "Node": [[id, [h, ...]], ...],
//!   "Edge": [[[src, dst], [[src_h, dst_h, slope], ...]], ...] }
//! ```
//!
//! with slope `1` = stay and `2` = decrease. Node capacity is the length of
//! the `Node` table, so an edge naming an unlisted node is rejected by the
//! builder.

use descent::{CheckError, HeightedGraph};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid graph JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid slope code {0} (expected 1 for stay or 2 for decrease)")]
    BadSlope(u8),

    #[error("{0}")]
    Graph(#[from] CheckError),
}

#[derive(Debug, Deserialize)]
struct GraphFile {
    #[serde(rename = "Node")]
    nodes: Vec<(u32, Vec<u32>)>,
    #[serde(rename = "Edge", default)]
    edges: Vec<((u32, u32), Vec<(u32, u32, u8)>)>,
}

pub fn parse_graph(text: &str) -> Result<HeightedGraph, InputError> {
    let file: GraphFile = serde_json::from_str(text)?;

    let mut graph = HeightedGraph::new(file.nodes.len() as u32);
    for (id, heights) in &file.nodes {
        graph.add_node(*id)?;
        for h in heights {
            graph.add_height(*id, *h)?;
        }
    }
    for ((src, dst), slopes) in &file.edges {
        graph.add_edge(*src, *dst)?;
        for &(src_h, dst_h, code) in slopes {
            match code {
                1 => graph.add_stay(*src, src_h, *dst, dst_h)?,
                2 => graph.add_decrease(*src, src_h, *dst, dst_h)?,
                other => return Err(InputError::BadSlope(other)),
            }
        }
    }
    Ok(graph)
}

#[cfg(test)]
mod test {
    use super::*;
    use descent::{Flags, Slope};

    #[test]
    fn parses_nodes_heights_and_edges() {
        let text = r#"{
            "Node": [[0, [10, 11]], [1, [20]]],
            "Edge": [[[0, 1], [[10, 20, 1], [11, 20, 2]]],
                     [[1, 0], [[20, 10, 1]]]]
        }"#;
        let g = parse_graph(text).unwrap();
        assert_eq!(g.num_nodes(), 2);
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.trace_width(), 2);
        assert_eq!(g.get_slope(0, 1, 10, 20), Slope::Stay);
        assert_eq!(g.get_slope(0, 1, 11, 20), Slope::Downward);
        assert_eq!(g.get_slope(1, 0, 20, 10), Slope::Stay);
    }

    #[test]
    fn parsed_graphs_check_like_built_graphs() {
        let text = r#"{
            "Node": [[0, [0]], [1, [0]]],
            "Edge": [[[0, 1], [[0, 0, 2]]],
                     [[1, 0], [[0, 0, 1]]]]
        }"#;
        let g = parse_graph(text).unwrap();
        assert!(g.order_reduced_check(Flags::empty()).unwrap());
    }

    #[test]
    fn edge_table_may_be_absent() {
        let g = parse_graph(r#"{ "Node": [[0, [0]]] }"#).unwrap();
        assert_eq!(g.num_nodes(), 1);
        assert_eq!(g.num_edges(), 0);
    }

    #[test]
    fn rejects_bad_slope_codes() {
        let text = r#"{
            "Node": [[0, [0]]],
            "Edge": [[[0, 0], [[0, 0, 3]]]]
        }"#;
        assert!(matches!(parse_graph(text), Err(InputError::BadSlope(3))));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            parse_graph("{ \"Node\": 17 }"),
            Err(InputError::Json(_))
        ));
    }

    #[test]
    fn rejects_edges_beyond_the_node_table() {
        // Capacity is the Node table length; an edge to an unlisted node
        // does not fit.
        let text = r#"{
            "Node": [[0, [0]]],
            "Edge": [[[0, 5], []]]
        }"#;
        assert!(matches!(parse_graph(text), Err(InputError::Graph(_))));
    }
}
