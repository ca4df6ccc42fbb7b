//! The heighted-graph builder and the check entry points.
//!
//! A [`HeightedGraph`] is built once through the `add_*` calls, then checked
//! any number of times. External node and height ids are arbitrary `u32`s;
//! internally both are mapped to dense indices in insertion order, heights
//! per node. Edge relations live in a flat row-major `max_nodes²` matrix so
//! cell access stays constant-time without chained allocations.
//!
//! ## Correctness Contract
//! Declare a node's heights before the first edge touching the node is
//! created: an edge relation's dimensions are fixed at the moment the edge
//! first appears, and a later stay/decrease referencing a height the
//! relation cannot hold is rejected as [`CheckError::MalformedGraph`].

use crate::error::CheckError;
use crate::relation::{Slope, SlopedRelation};
use crate::soundness::{self, AutomatonBackend, Flags};
use crate::stats::CheckStats;
use crate::AHashMap;

#[cfg(test)]
mod test;

/// A finite directed graph whose nodes carry height sets and whose edges
/// carry sloped relations between the height sets of their endpoints.
#[derive(Debug)]
pub struct HeightedGraph {
    max_nodes: usize,
    node_idxs: AHashMap<u32, usize>,
    /// Per internal node: external height id to dense height index.
    height_idxs: Vec<AHashMap<u32, u32>>,
    /// Flat row-major `max_nodes * max_nodes` matrix of edge relations.
    edges: Vec<Option<SlopedRelation>>,
    num_edges: usize,
    trace_width: u32,
}

impl HeightedGraph {
    /// A graph with capacity for `max_nodes` nodes. The capacity only sizes
    /// the edge matrix up front; every loop in the checkers runs over the
    /// nodes actually added.
    pub fn new(max_nodes: u32) -> Self {
        let max_nodes = max_nodes as usize;
        HeightedGraph {
            max_nodes,
            node_idxs: AHashMap::default(),
            height_idxs: Vec::new(),
            edges: {
                let mut cells = Vec::new();
                cells.resize_with(max_nodes * max_nodes, || None);
                cells
            },
            num_edges: 0,
            trace_width: 0,
        }
    }

    /// Registers a node. Idempotent.
    pub fn add_node(&mut self, node: u32) -> Result<(), CheckError> {
        if self.node_idxs.contains_key(&node) {
            return Ok(());
        }
        let next = self.node_idxs.len();
        if next >= self.max_nodes {
            return Err(CheckError::InvariantViolation(format!(
                "node {} exceeds the declared capacity of {} nodes",
                node, self.max_nodes
            )));
        }
        self.node_idxs.insert(node, next);
        self.height_idxs.push(AHashMap::default());
        Ok(())
    }

    /// Registers a height for a node, adding the node if needed. Idempotent
    /// per `(node, height)` pair.
    pub fn add_height(&mut self, node: u32, height: u32) -> Result<(), CheckError> {
        self.add_node(node)?;
        let idx = self.node_idxs[&node];
        let heights = &mut self.height_idxs[idx];
        if !heights.contains_key(&height) {
            let next = heights.len() as u32;
            heights.insert(height, next);
            if heights.len() as u32 > self.trace_width {
                self.trace_width = heights.len() as u32;
            }
        }
        Ok(())
    }

    /// Creates an edge, adding both endpoints if needed. The edge's relation
    /// is allocated empty with the endpoints' *current* height counts as its
    /// dimensions; later calls are no-ops.
    pub fn add_edge(&mut self, src: u32, dst: u32) -> Result<(), CheckError> {
        self.add_node(src)?;
        self.add_node(dst)?;
        let s = self.node_idxs[&src];
        let t = self.node_idxs[&dst];
        let cell = s * self.max_nodes + t;
        if self.edges[cell].is_none() {
            let rel = SlopedRelation::new(
                self.height_idxs[s].len() as u32,
                self.height_idxs[t].len() as u32,
            );
            self.edges[cell] = Some(rel);
            self.num_edges += 1;
        }
        Ok(())
    }

    /// Declares that `src_h` at `src` stays equal to `dst_h` at `dst` across
    /// the edge `src -> dst`, creating nodes, heights and the edge as needed.
    pub fn add_stay(&mut self, src: u32, src_h: u32, dst: u32, dst_h: u32) -> Result<(), CheckError> {
        self.add_slope(src, src_h, dst, dst_h, Slope::Stay)
    }

    /// Declares a strict decrease from `src_h` at `src` to `dst_h` at `dst`.
    pub fn add_decrease(
        &mut self,
        src: u32,
        src_h: u32,
        dst: u32,
        dst_h: u32,
    ) -> Result<(), CheckError> {
        self.add_slope(src, src_h, dst, dst_h, Slope::Downward)
    }

    fn add_slope(
        &mut self,
        src: u32,
        src_h: u32,
        dst: u32,
        dst_h: u32,
        slope: Slope,
    ) -> Result<(), CheckError> {
        // Heights first, then the edge: a fresh edge then always sees the
        // heights it is about to relate.
        self.add_height(src, src_h)?;
        self.add_height(dst, dst_h)?;
        self.add_edge(src, dst)?;

        let s = self.node_idxs[&src];
        let t = self.node_idxs[&dst];
        let sh = self.height_idxs[s][&src_h];
        let dh = self.height_idxs[t][&dst_h];
        let rel = self.edges[s * self.max_nodes + t]
            .as_mut()
            .expect("the edge was just created");
        if sh >= rel.src_heights() || dh >= rel.dst_heights() {
            return Err(CheckError::MalformedGraph(format!(
                "height pair ({}, {}) on edge {} -> {} was declared after the edge \
                 fixed its dimensions at {}x{}",
                src_h,
                dst_h,
                src,
                dst,
                rel.src_heights(),
                rel.dst_heights()
            )));
        }
        rel.add(sh, dh, slope);
        Ok(())
    }

    /// The slope between two external heights across an edge, `Undefined`
    /// when any of the four levels is unknown.
    pub fn get_slope(&self, src: u32, dst: u32, src_h: u32, dst_h: u32) -> Slope {
        let lookup = || {
            let s = *self.node_idxs.get(&src)?;
            let t = *self.node_idxs.get(&dst)?;
            let sh = *self.height_idxs[s].get(&src_h)?;
            let dh = *self.height_idxs[t].get(&dst_h)?;
            let rel = self.edges[s * self.max_nodes + t].as_ref()?;
            Some(rel.get(sh, dh))
        };
        lookup().unwrap_or(Slope::Undefined)
    }

    /// Number of nodes actually added. This, not the capacity, bounds every
    /// loop in the checkers.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.node_idxs.len()
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// The largest height count over all nodes.
    #[inline]
    pub fn trace_width(&self) -> u32 {
        self.trace_width
    }

    /// Height count of an internal node index.
    pub(crate) fn height_count(&self, node: usize) -> u32 {
        self.height_idxs[node].len() as u32
    }

    /// The edge relation between two internal node indices, if the edge
    /// exists.
    pub(crate) fn edge_relation(&self, src: usize, dst: usize) -> Option<&SlopedRelation> {
        self.edges[src * self.max_nodes + dst].as_ref()
    }

    // ------------------------------------------------------------------
    // Check entry points. All of them leave the graph untouched, so any
    // number of checks can run against the same build.
    // ------------------------------------------------------------------

    /// The legacy doubly-buffered composition-closure check.
    pub fn relational_check(&self, flags: Flags) -> Result<bool, CheckError> {
        self.relational_check_with_stats(flags, &mut CheckStats::default())
    }

    pub fn relational_check_with_stats(
        &self,
        flags: Flags,
        stats: &mut CheckStats,
    ) -> Result<bool, CheckError> {
        soundness::validate_flags(flags)?;
        soundness::iterative::check(self, flags, stats)
    }

    /// The order-reduced composition-closure check.
    pub fn order_reduced_check(&self, flags: Flags) -> Result<bool, CheckError> {
        self.order_reduced_check_with_stats(flags, &mut CheckStats::default())
    }

    pub fn order_reduced_check_with_stats(
        &self,
        flags: Flags,
        stats: &mut CheckStats,
    ) -> Result<bool, CheckError> {
        soundness::validate_flags(flags)?;
        soundness::order_reduced::check(self, flags, stats)
    }

    /// The Floyd-Warshall-Kleene composition-closure check.
    pub fn fwk_check(&self, flags: Flags) -> Result<bool, CheckError> {
        self.fwk_check_with_stats(flags, &mut CheckStats::default())
    }

    pub fn fwk_check_with_stats(
        &self,
        flags: Flags,
        stats: &mut CheckStats,
    ) -> Result<bool, CheckError> {
        soundness::validate_flags(flags)?;
        soundness::fwk::check(self, flags, stats)
    }

    /// The automata-theoretic check: language inclusion of the path
    /// automaton in the trace automaton, decided by `backend`.
    pub fn sla_automata_check<B: AutomatonBackend>(
        &self,
        backend: &mut B,
    ) -> Result<bool, CheckError> {
        soundness::sla::check(self, backend)
    }
}

/// Builds a [`HeightedGraph`] from a literal description; the fixture
/// counterpart of driving the builder by hand. Panics on a malformed
/// description, so keep it to tests and examples.
///
/// ```
/// use descent::hgraph;
///
/// let g = hgraph!(2;
///     [ (0; [0]); (1; [0]) ];
///     [ (0 => 1; [(0, 0, down)]);
///       (1 => 0; [(0, 0, stay)]) ]
/// );
/// assert_eq!(g.num_nodes(), 2);
/// ```
#[macro_export]
macro_rules! hgraph {
    ($max:expr;
     [ $( ($node:expr; [ $( $h:expr ),* $(,)? ]) );* $(;)? ];
     [ $( ($src:expr => $dst:expr; [ $( ($sh:expr, $dh:expr, $slope:ident) ),* $(,)? ]) );* $(;)? ]
    ) => {{
        let mut g = $crate::graph::HeightedGraph::new($max);
        $(
            g.add_node($node).unwrap();
            $( g.add_height($node, $h).unwrap(); )*
        )*
        $(
            g.add_edge($src, $dst).unwrap();
            $( $crate::hgraph!(@slope g, $src, $sh, $dst, $dh, $slope); )*
        )*
        g
    }};
    (@slope $g:ident, $src:expr, $sh:expr, $dst:expr, $dh:expr, stay) => {
        $g.add_stay($src, $sh, $dst, $dh).unwrap()
    };
    (@slope $g:ident, $src:expr, $sh:expr, $dst:expr, $dh:expr, down) => {
        $g.add_decrease($src, $sh, $dst, $dh).unwrap()
    };
}
