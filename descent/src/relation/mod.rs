//! Sloped relations: the value type both decision procedures rest on.
//!
//! A [`SlopedRelation`] describes how the heights of one node relate to the
//! heights of another along a path: a pair of heights is either unrelated,
//! related without getting smaller (`Stay`), or related with a strict
//! decrease somewhere along the way (`Downward`). Relations compose the way
//! paths concatenate, and a `Downward` anywhere in a chain dominates.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use ahash::AHasher;
use vob::Vob;

pub use store::{RelId, RelationStore};

mod store;

/// How one height relates to another across an edge or a path.
///
/// The order `Undefined < Stay < Downward` makes the union of two slopes a
/// plain `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slope {
    Undefined,
    Stay,
    Downward,
}

impl Slope {
    /// The union of two slopes: the most downward of the two.
    #[inline]
    pub fn join(self, other: Slope) -> Slope {
        self.max(other)
    }
}

impl Default for Slope {
    fn default() -> Self {
        Slope::Undefined
    }
}

impl fmt::Display for Slope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slope::Undefined => write!(f, "undef"),
            Slope::Stay => write!(f, "stay"),
            Slope::Downward => write!(f, "down"),
        }
    }
}

/// Outcome of comparing two relations under the slope pre-order.
///
/// `R ≤ S` holds iff every pair defined in `R` is also defined in `S`, and
/// `S` is at least as downward as `R` wherever `R` is defined. A smaller
/// relation promises less — fewer related pairs, fewer decreases — so it is
/// at least as hard to pass the descent test, which is what makes it the one
/// worth keeping under minimality pruning: whenever the smaller relation
/// provides the descending self-loop, the larger one does too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Less,
    Equal,
    Greater,
    Incomparable,
}

/// A finite partial map from height pairs to slopes, with declared
/// dimensions.
///
/// Entries are kept sorted by height pair, unique, and never hold
/// [`Slope::Undefined`] — absence *is* undefined. The sorted table doubles as
/// the per-source-row index (rows are contiguous runs found by binary
/// search), and gives the derived lexicographic `Ord` used to deduplicate
/// relations into canonical representatives.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlopedRelation {
    src_heights: u32,
    dst_heights: u32,
    entries: Vec<(u32, u32, Slope)>,
}

impl SlopedRelation {
    /// An empty relation of the given dimensions.
    pub fn new(src_heights: u32, dst_heights: u32) -> Self {
        SlopedRelation {
            src_heights,
            dst_heights,
            entries: Vec::new(),
        }
    }

    /// The identity relation of dimension `width`: every height stays equal
    /// to itself.
    pub fn new_identity(width: u32) -> Self {
        SlopedRelation {
            src_heights: width,
            dst_heights: width,
            entries: (0..width).map(|i| (i, i, Slope::Stay)).collect(),
        }
    }

    #[inline]
    pub fn src_heights(&self) -> u32 {
        self.src_heights
    }

    #[inline]
    pub fn dst_heights(&self) -> u32 {
        self.dst_heights
    }

    /// Number of defined height pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the defined entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, Slope)> + '_ {
        self.entries.iter().copied()
    }

    /// Re-dimension and clear, keeping the entry buffer's capacity. Used to
    /// recycle a scratch relation between compositions.
    pub(crate) fn reset(&mut self, src_heights: u32, dst_heights: u32) {
        self.src_heights = src_heights;
        self.dst_heights = dst_heights;
        self.entries.clear();
    }

    /// Declares `s` for the pair `(i, j)`, joining with whatever is already
    /// there. Monotone: a `Downward` is never weakened back to `Stay`.
    ///
    /// Panics if `s` is `Undefined` — pairs are undefined by omission only.
    pub fn add(&mut self, i: u32, j: u32, s: Slope) {
        debug_assert!(i < self.src_heights, "source height out of range");
        debug_assert!(j < self.dst_heights, "destination height out of range");
        assert!(s != Slope::Undefined, "only Stay and Downward can be declared");
        match self.entries.binary_search_by_key(&(i, j), |&(a, b, _)| (a, b)) {
            Ok(pos) => {
                let joined = self.entries[pos].2.join(s);
                self.entries[pos].2 = joined;
            }
            Err(pos) => self.entries.insert(pos, (i, j, s)),
        }
    }

    /// The slope at `(i, j)`, `Undefined` if the pair is not in the map.
    pub fn get(&self, i: u32, j: u32) -> Slope {
        match self.entries.binary_search_by_key(&(i, j), |&(a, b, _)| (a, b)) {
            Ok(pos) => self.entries[pos].2,
            Err(_) => Slope::Undefined,
        }
    }

    /// The contiguous run of entries whose source height is `i`.
    fn row(&self, i: u32) -> &[(u32, u32, Slope)] {
        let start = self.entries.partition_point(|&(a, _, _)| a < i);
        let end = self.entries.partition_point(|&(a, _, _)| a <= i);
        &self.entries[start..end]
    }

    /// `self ∘ other`, freshly allocated. Fails if the inner dimensions
    /// disagree.
    pub fn compose(&self, other: &SlopedRelation) -> Result<SlopedRelation, crate::CheckError> {
        let mut out = SlopedRelation::default();
        self.compose_into(other, &mut out)?;
        Ok(out)
    }

    /// `self ∘ other`, written into `out` (which is re-dimensioned and
    /// cleared first). The pair `(i, j)` is `Downward` when some middle
    /// height chains a `Downward` with anything defined, `Stay` when some
    /// middle height chains two defined slopes, undefined otherwise.
    pub fn compose_into(
        &self,
        other: &SlopedRelation,
        out: &mut SlopedRelation,
    ) -> Result<(), crate::CheckError> {
        if self.dst_heights != other.src_heights {
            return Err(crate::CheckError::dimension_mismatch(
                (self.src_heights as usize, self.dst_heights as usize),
                (other.src_heights as usize, other.dst_heights as usize),
            ));
        }
        out.reset(self.src_heights, other.dst_heights);
        for &(i, h, s1) in &self.entries {
            for &(_, j, s2) in other.row(h) {
                let s = if s1 == Slope::Downward || s2 == Slope::Downward {
                    Slope::Downward
                } else {
                    Slope::Stay
                };
                out.entries.push((i, j, s));
            }
        }
        out.normalize();
        Ok(())
    }

    /// Sorts the entry table and joins duplicate pairs. Entries pushed by
    /// composition arrive per middle height, so the same pair can occur more
    /// than once before this runs.
    fn normalize(&mut self) {
        self.entries.sort_unstable_by_key(|&(i, j, _)| (i, j));
        self.entries.dedup_by(|later, kept| {
            if later.0 == kept.0 && later.1 == kept.1 {
                kept.2 = kept.2.join(later.2);
                true
            } else {
                false
            }
        });
    }

    /// Compares under the slope pre-order (see [`Comparison`]). Relations of
    /// different dimensions are incomparable.
    pub fn compare(&self, other: &SlopedRelation) -> Comparison {
        if self.src_heights != other.src_heights || self.dst_heights != other.dst_heights {
            return Comparison::Incomparable;
        }
        // le: self ≤ other, ge: other ≤ self. One merge pass over both
        // sorted tables settles both directions.
        let mut le = true;
        let mut ge = true;
        let mut a = self.entries.iter().peekable();
        let mut b = other.entries.iter().peekable();
        loop {
            match (a.peek(), b.peek()) {
                (Some(&&(ai, aj, asl)), Some(&&(bi, bj, bsl))) => match (ai, aj).cmp(&(bi, bj)) {
                    Ordering::Less => {
                        // Defined in self only: self's domain is not covered
                        // by other's, so self ≤ other fails.
                        le = false;
                        a.next();
                    }
                    Ordering::Greater => {
                        ge = false;
                        b.next();
                    }
                    Ordering::Equal => {
                        if asl > bsl {
                            le = false;
                        }
                        if bsl > asl {
                            ge = false;
                        }
                        a.next();
                        b.next();
                    }
                },
                (Some(_), None) => {
                    le = false;
                    a.next();
                }
                (None, Some(_)) => {
                    ge = false;
                    b.next();
                }
                (None, None) => break,
            }
            if !le && !ge {
                return Comparison::Incomparable;
            }
        }
        match (le, ge) {
            (true, true) => Comparison::Equal,
            (true, false) => Comparison::Less,
            (false, true) => Comparison::Greater,
            (false, false) => Comparison::Incomparable,
        }
    }

    /// A content hash consistent with `==` (dimensions included).
    pub fn content_hash(&self) -> u64 {
        let mut hasher = AHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// The non-reflexive transitive closure: the union of `R`, `R ∘ R`,
    /// `R ∘ R ∘ R`, ... The slope lattice is finite and composition is
    /// monotone, so the fixed point exists; it is computed by Warshall-style
    /// propagation over two bit matrices (defined / downward) with the slope
    /// join folded in.
    ///
    /// ## Correctness Contract
    /// Only defined for square relations; panics otherwise. The procedures
    /// here only ever close relations sitting on a diagonal of the closure,
    /// which are square by construction.
    pub fn transitive_closure(&self) -> SlopedRelation {
        assert_eq!(
            self.src_heights, self.dst_heights,
            "transitive closure is only defined for square relations"
        );
        let n = self.src_heights as usize;
        let mut def: Vec<Vob> = vec![Vob::from_elem(n, false); n];
        let mut down: Vec<Vob> = vec![Vob::from_elem(n, false); n];
        for &(i, j, s) in &self.entries {
            def[i as usize].set(j as usize, true);
            if s == Slope::Downward {
                down[i as usize].set(j as usize, true);
            }
        }
        for k in 0..n {
            // A downward loop at k can be spliced into any path through k,
            // making the whole path downward. This is the star term of the
            // algebraic-path recurrence; the slope algebra is aperiodic, so
            // one splice is all the star can contribute.
            let k_loop_down = down[k][k];
            for i in 0..n {
                if !def[i][k] {
                    continue;
                }
                let through_down = down[i][k] || k_loop_down;
                let def_k = def[k].clone();
                let down_k = down[k].clone();
                def[i].or(&def_k);
                // i -k-> j is downward when either leg is.
                down[i].or(&down_k);
                if through_down {
                    down[i].or(&def_k);
                }
            }
        }
        let mut out = SlopedRelation::new(self.src_heights, self.dst_heights);
        for i in 0..n {
            for j in def[i].iter_set_bits(..) {
                let s = if down[i][j] { Slope::Downward } else { Slope::Stay };
                out.entries.push((i as u32, j as u32, s));
            }
        }
        out
    }

    /// True iff some height maps to itself with a `Downward` slope.
    pub fn has_self_loop(&self) -> bool {
        self.entries
            .iter()
            .any(|&(i, j, s)| i == j && s == Slope::Downward)
    }

    /// True iff the directed graph of defined entries has a strongly
    /// connected component containing a `Downward` edge. On an idempotent
    /// relation this agrees with `has_self_loop` of the transitive closure,
    /// without materializing the closure.
    ///
    /// ## Correctness Contract
    /// Square relations only; panics otherwise.
    pub fn has_downward_scc(&self) -> bool {
        assert_eq!(
            self.src_heights, self.dst_heights,
            "the SCC test is only defined for square relations"
        );
        let n = self.src_heights as usize;
        let scc_of = self.height_sccs(n);
        self.entries
            .iter()
            .any(|&(i, j, s)| s == Slope::Downward && scc_of[i as usize] == scc_of[j as usize])
    }

    /// Tarjan over the height graph, iterative because the recursion depth
    /// would otherwise be bounded only by the number of heights. Returns a
    /// component id per height.
    fn height_sccs(&self, n: usize) -> Vec<usize> {
        const UNVISITED: usize = usize::MAX;
        let mut index = vec![UNVISITED; n];
        let mut lowlink = vec![0usize; n];
        let mut on_stack = vec![false; n];
        let mut scc_of = vec![UNVISITED; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut call: Vec<(usize, usize)> = Vec::new();
        let mut next_index = 0usize;
        let mut next_scc = 0usize;

        for start in 0..n {
            if index[start] != UNVISITED {
                continue;
            }
            index[start] = next_index;
            lowlink[start] = next_index;
            next_index += 1;
            stack.push(start);
            on_stack[start] = true;
            call.push((start, 0));

            while let Some(frame) = call.last_mut() {
                let v = frame.0;
                let row = self.row(v as u32);
                if frame.1 < row.len() {
                    let w = row[frame.1].1 as usize;
                    frame.1 += 1;
                    if index[w] == UNVISITED {
                        index[w] = next_index;
                        lowlink[w] = next_index;
                        next_index += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        call.push((w, 0));
                    } else if on_stack[w] && index[w] < lowlink[v] {
                        lowlink[v] = index[w];
                    }
                } else {
                    call.pop();
                    if let Some(parent) = call.last_mut() {
                        if lowlink[v] < lowlink[parent.0] {
                            lowlink[parent.0] = lowlink[v];
                        }
                    }
                    if lowlink[v] == index[v] {
                        loop {
                            let w = stack.pop().expect("component root is on the stack");
                            on_stack[w] = false;
                            scc_of[w] = next_scc;
                            if w == v {
                                break;
                            }
                        }
                        next_scc += 1;
                    }
                }
            }
        }
        scc_of
    }
}

impl fmt::Display for SlopedRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}{{", self.src_heights, self.dst_heights)?;
        for (pos, (i, j, s)) in self.iter().enumerate() {
            if pos > 0 {
                write!(f, ", ")?;
            }
            write!(f, "({},{}):{}", i, j, s)?;
        }
        write!(f, "}}")
    }
}
