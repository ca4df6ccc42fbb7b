//! The soundness criterion and its decision procedures.
//!
//! Three strategies compute (enough of) the composition closure — the set of
//! sloped relations labelling all non-empty paths, indexed by node pair —
//! and apply the same per-relation test to every diagonal cell: a relation a
//! cycle can produce must, in its transitive closure, send some height to
//! itself with a strict decrease. A fourth strategy sidesteps the closure
//! altogether and reduces the question to a Büchi language inclusion
//! ([`sla`]).
//!
//! The strategies share the closure cell type, the check-and-add insertion
//! procedure and the self-loop test defined here.

use std::time::Instant;

use bitflags::bitflags;
use thiserror::Error;

use crate::error::CheckError;
use crate::relation::{Comparison, RelId, RelationStore, SlopedRelation};
use crate::stats::CheckStats;
use crate::AHashSet;

pub mod fwk;
pub mod iterative;
pub mod order_reduced;
pub mod sla;


pub use sla::AutomatonBackend;

bitflags! {
    /// Check options, bit-compatible with the flag word of the external
    /// interface. The lower four bits tune the closure computation, the
    /// upper bits select a check mode in the CLI.
    pub struct Flags: u32 {
        /// Test diagonal relations the moment they are added and bail out
        /// on the first failure.
        const FAIL_FAST       = 0b0_0000_0001;
        /// Self-loop test via strongly connected components instead of the
        /// transitive closure.
        const USE_SCC_CHECK   = 0b0_0000_0010;
        /// Only enforce the self-loop test on idempotent relations. Sound
        /// only when the caller independently guarantees idempotence of the
        /// closure.
        const USE_IDEMPOTENCE = 0b0_0000_0100;
        /// Keep closure cells thin: drop any relation preceded by a smaller
        /// one under the slope pre-order.
        const USE_MINIMALITY  = 0b0_0000_1000;
        const USE_SD          = 0b0_0001_0000;
        const USE_XSD         = 0b0_0010_0000;
        /// Select the order-reduced closure strategy.
        const USE_ORTL        = 0b0_0100_0000;
        /// Select the Floyd-Warshall-Kleene closure strategy.
        const USE_FWK         = 0b0_1000_0000;
        /// Select the automata-theoretic check.
        const USE_SLA         = 0b1_0000_0000;
    }
}

/// A flag letter that does not name any known option.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized flag letter '{0}'")]
pub struct UnknownFlag(pub char);

impl Flags {
    /// Parses a flag-letter string, one letter per flag, any order:
    /// `f` fail-fast, `s` SCC check, `i` idempotence, `m` minimality,
    /// `D` sd, `X` xsd, `O` order-reduced, `K` Floyd-Warshall-Kleene,
    /// `A` automata.
    pub fn from_letters(letters: &str) -> Result<Flags, UnknownFlag> {
        let mut flags = Flags::empty();
        for c in letters.chars() {
            flags |= match c {
                'f' => Flags::FAIL_FAST,
                's' => Flags::USE_SCC_CHECK,
                'i' => Flags::USE_IDEMPOTENCE,
                'm' => Flags::USE_MINIMALITY,
                'D' => Flags::USE_SD,
                'X' => Flags::USE_XSD,
                'O' => Flags::USE_ORTL,
                'K' => Flags::USE_FWK,
                'A' => Flags::USE_SLA,
                other => return Err(UnknownFlag(other)),
            };
        }
        Ok(flags)
    }
}

/// Rejects the flag combinations the optimisations cannot carry.
///
/// Minimality prunes exactly the relations the idempotence shortcut needs to
/// see, and the SCC test asks a question the idempotence mode has already
/// answered differently, so neither may be combined with it.
pub(crate) fn validate_flags(flags: Flags) -> Result<(), CheckError> {
    if flags.contains(Flags::USE_IDEMPOTENCE) && flags.contains(Flags::USE_MINIMALITY) {
        return Err(CheckError::InvariantViolation(
            "the idempotence and minimality optimisations cannot be combined".into(),
        ));
    }
    if flags.contains(Flags::USE_IDEMPOTENCE) && flags.contains(Flags::USE_SCC_CHECK) {
        return Err(CheckError::InvariantViolation(
            "the idempotence optimisation and the SCC loop check cannot be combined".into(),
        ));
    }
    Ok(())
}

/// The per-relation soundness test applied to every diagonal closure cell.
///
/// Returns true when the relation provides the descending self-loop the
/// criterion demands (or, under the idempotence shortcut, when it is not
/// idempotent and therefore not this mode's problem).
pub(crate) fn passes_self_loop_test(
    rel: &SlopedRelation,
    flags: Flags,
    stats: &mut CheckStats,
) -> Result<bool, CheckError> {
    let start = Instant::now();
    stats.loop_checks += 1;
    stats.checked_size_sum += rel.len();

    let result = if flags.contains(Flags::USE_SCC_CHECK) {
        rel.has_downward_scc()
    } else if flags.contains(Flags::USE_IDEMPOTENCE) {
        let squared = rel.compose(rel)?;
        stats.compositions += 1;
        if squared != *rel {
            // Not idempotent: trivially passes under this mode.
            stats.loop_checks -= 1;
            stats.checked_size_sum -= rel.len();
            true
        } else {
            squared.has_self_loop()
        }
    } else {
        rel.transitive_closure().has_self_loop()
    };

    stats.loop_check_time += start.elapsed();
    Ok(result)
}

/// One closure cell: the relations labelling the paths from one node to
/// another, as ids into the check's [`RelationStore`].
#[derive(Debug, Default, Clone)]
pub(crate) struct Cell {
    /// Stored order matters to the order-reduced strategy, which iterates a
    /// cell while extending it.
    pub(crate) rels: Vec<RelId>,
    members: AHashSet<RelId>,
    /// Elements preceded by a smaller relation while some cursor still had
    /// to pass them; removed in one sweep by [`Cell::finalize`].
    preceded: AHashSet<RelId>,
}

impl Cell {
    pub(crate) fn len(&self) -> usize {
        self.rels.len()
    }

    /// Applies the removals deferred by check-and-add. Call when no
    /// iteration over the cell is in flight.
    pub(crate) fn finalize(&mut self) {
        if self.preceded.is_empty() {
            return;
        }
        let preceded = std::mem::take(&mut self.preceded);
        self.rels.retain(|r| !preceded.contains(r));
        for r in &preceded {
            self.members.remove(r);
        }
    }
}

/// What became of a candidate handed to [`check_and_add`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Added,
    Rejected,
    /// The candidate was added to a diagonal cell under fail-fast and did
    /// not pass the self-loop test: the graph is unsound, stop everything.
    FailedSelfLoop,
}

/// Inserts a candidate relation into a cell.
///
/// Dedup first (same representative id means same relation); then, under
/// minimality, the cell is scanned in stored order: an existing relation at
/// or below the candidate rejects it, while existing relations above it are
/// removed — immediately when they sit at index `defer_below` or later,
/// deferred into the preceded set otherwise, so a cursor still walking the
/// cell's prefix never has the ground shift under it. Under fail-fast a
/// candidate added to a diagonal cell is self-loop-tested on the spot.
pub(crate) fn check_and_add(
    cell: &mut Cell,
    store: &RelationStore,
    rid: RelId,
    diagonal: bool,
    flags: Flags,
    defer_below: usize,
    stats: &mut CheckStats,
) -> Result<Outcome, CheckError> {
    if cell.members.contains(&rid) {
        stats.rejections += 1;
        return Ok(Outcome::Rejected);
    }

    if flags.contains(Flags::USE_MINIMALITY) {
        let start = Instant::now();
        let mut pos = 0;
        while pos < cell.rels.len() {
            let existing = cell.rels[pos];
            stats.comparisons += 1;
            match store.get(rid).compare(store.get(existing)) {
                // The existing relation is at or below the candidate:
                // thinness says nothing above the candidate remains either,
                // so reject and stop scanning.
                Comparison::Equal | Comparison::Greater => {
                    stats.rejections += 1;
                    stats.compare_time += start.elapsed();
                    return Ok(Outcome::Rejected);
                }
                Comparison::Less => {
                    stats.replacements += 1;
                    if pos < defer_below {
                        cell.preceded.insert(existing);
                        pos += 1;
                    } else {
                        cell.rels.remove(pos);
                        cell.members.remove(&existing);
                    }
                }
                Comparison::Incomparable => pos += 1,
            }
        }
        stats.compare_time += start.elapsed();
    }

    cell.rels.push(rid);
    cell.members.insert(rid);

    if flags.contains(Flags::FAIL_FAST)
        && diagonal
        && !passes_self_loop_test(store.get(rid), flags, stats)?
    {
        return Ok(Outcome::FailedSelfLoop);
    }

    Ok(Outcome::Added)
}

/// The closure under construction: a dense `n × n` matrix of cells.
#[derive(Debug, Clone)]
pub(crate) struct Closure {
    n: usize,
    cells: Vec<Cell>,
}

impl Closure {
    pub(crate) fn new(n: usize) -> Self {
        Closure {
            n,
            cells: vec![Cell::default(); n * n],
        }
    }

    pub(crate) fn cell(&self, s: usize, t: usize) -> &Cell {
        &self.cells[s * self.n + t]
    }

    pub(crate) fn cell_mut(&mut self, s: usize, t: usize) -> &mut Cell {
        &mut self.cells[s * self.n + t]
    }

    /// Total number of relations held across all cells.
    pub(crate) fn size(&self) -> usize {
        self.cells.iter().map(Cell::len).sum()
    }

    /// Runs the self-loop test over every diagonal cell. The final step of
    /// every strategy that did not fail fast.
    pub(crate) fn diagonals_pass(
        &self,
        store: &RelationStore,
        flags: Flags,
        stats: &mut CheckStats,
    ) -> Result<bool, CheckError> {
        for v in 0..self.n {
            for &rid in &self.cell(v, v).rels {
                if !passes_self_loop_test(store.get(rid), flags, stats)? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

/// Composes `left ∘ right` through the scratch buffer, interning the result.
///
/// Empty compositions are interned like any other: a cycle whose relation
/// relates no heights at all admits no trace whatsoever, which is precisely
/// a failure the diagonal scan must get to see.
pub(crate) fn compose_interned(
    store: &mut RelationStore,
    scratch: &mut SlopedRelation,
    left: RelId,
    right: RelId,
    stats: &mut CheckStats,
) -> Result<RelId, CheckError> {
    let start = Instant::now();
    store.get(left).compose_into(store.get(right), scratch)?;
    stats.compose_time += start.elapsed();
    stats.compositions += 1;
    let (rid, _adopted) = store.intern_scratch(scratch);
    Ok(rid)
}
