use super::*;
use crate::hgraph;

#[test]
fn nodes_and_heights_get_dense_indices() {
    let mut g = HeightedGraph::new(4);
    g.add_node(17).unwrap();
    g.add_node(3).unwrap();
    g.add_node(17).unwrap();
    assert_eq!(g.num_nodes(), 2);

    g.add_height(17, 100).unwrap();
    g.add_height(17, 100).unwrap();
    g.add_height(17, 7).unwrap();
    assert_eq!(g.trace_width(), 2);
    assert_eq!(g.height_count(0), 2);
    assert_eq!(g.height_count(1), 0);
}

#[test]
fn capacity_is_enforced() {
    let mut g = HeightedGraph::new(1);
    g.add_node(0).unwrap();
    assert!(g.add_node(1).is_err());
    // Implicit node creation hits the same wall.
    assert!(g.add_edge(0, 2).is_err());
}

#[test]
fn add_edge_is_idempotent() {
    let mut g = HeightedGraph::new(2);
    g.add_height(0, 0).unwrap();
    g.add_height(1, 0).unwrap();
    g.add_edge(0, 1).unwrap();
    g.add_edge(0, 1).unwrap();
    assert_eq!(g.num_edges(), 1);
}

#[test]
fn slopes_are_looked_up_by_external_ids() {
    let mut g = HeightedGraph::new(2);
    g.add_stay(10, 5, 20, 6).unwrap();
    g.add_decrease(10, 7, 20, 6).unwrap();

    assert_eq!(g.get_slope(10, 20, 5, 6), Slope::Stay);
    assert_eq!(g.get_slope(10, 20, 7, 6), Slope::Downward);
    // Unknown node, height or edge: all Undefined.
    assert_eq!(g.get_slope(20, 10, 6, 5), Slope::Undefined);
    assert_eq!(g.get_slope(10, 20, 5, 99), Slope::Undefined);
    assert_eq!(g.get_slope(99, 20, 5, 6), Slope::Undefined);
}

#[test]
fn downward_wins_over_stay_on_the_same_pair() {
    let mut g = HeightedGraph::new(2);
    g.add_stay(0, 0, 1, 0).unwrap();
    g.add_decrease(0, 0, 1, 0).unwrap();
    g.add_stay(0, 0, 1, 0).unwrap();
    assert_eq!(g.get_slope(0, 1, 0, 0), Slope::Downward);
}

#[test]
fn late_heights_on_an_existing_edge_are_malformed() {
    let mut g = HeightedGraph::new(2);
    g.add_height(0, 0).unwrap();
    g.add_height(1, 0).unwrap();
    g.add_edge(0, 1).unwrap();
    // The edge relation is 1x1 now; a fifth level declared afterwards
    // cannot be related across it.
    g.add_height(0, 1).unwrap();
    let err = g.add_stay(0, 1, 1, 0).unwrap_err();
    assert!(matches!(err, CheckError::MalformedGraph(_)));
}

#[test]
fn heights_before_edges_commute() {
    // The same graph through two interleavings.
    let mut a = HeightedGraph::new(2);
    a.add_height(0, 0).unwrap();
    a.add_height(0, 1).unwrap();
    a.add_height(1, 0).unwrap();
    a.add_edge(0, 1).unwrap();
    a.add_stay(0, 0, 1, 0).unwrap();
    a.add_decrease(0, 1, 1, 0).unwrap();

    let mut b = HeightedGraph::new(2);
    b.add_height(0, 0).unwrap();
    b.add_height(0, 1).unwrap();
    b.add_stay(0, 0, 1, 0).unwrap();
    b.add_decrease(0, 1, 1, 0).unwrap();

    for &(sh, dh) in &[(0, 0), (1, 0), (0, 1)] {
        assert_eq!(a.get_slope(0, 1, sh, dh), b.get_slope(0, 1, sh, dh));
    }
    assert_eq!(a.num_nodes(), b.num_nodes());
    assert_eq!(a.num_edges(), b.num_edges());
    assert_eq!(a.trace_width(), b.trace_width());
}

#[test]
fn hgraph_macro_builds_the_described_graph() {
    let g = hgraph!(2;
        [ (0; [0, 1]); (1; [0]) ];
        [ (0 => 1; [(0, 0, stay), (1, 0, down)]);
          (1 => 0; [(0, 1, stay)]) ]
    );
    assert_eq!(g.num_nodes(), 2);
    assert_eq!(g.num_edges(), 2);
    assert_eq!(g.trace_width(), 2);
    assert_eq!(g.get_slope(0, 1, 0, 0), Slope::Stay);
    assert_eq!(g.get_slope(0, 1, 1, 0), Slope::Downward);
    assert_eq!(g.get_slope(1, 0, 0, 1), Slope::Stay);
}
