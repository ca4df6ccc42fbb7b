//! The order-reduced composition-closure strategy.
//!
//! One sweep over the node pairs `(s, t)` in lexicographic order. When
//! `(s, t)` is reached, every cell `(s, m)` and `(m, t)` with `m` below both
//! endpoints is already final, so their products are collected in a plain
//! double loop. What remains is the middle node equal to an endpoint —
//! "tying the loops" — where the cell under construction appears on one side
//! of the composition and grows while it is being iterated. Cursors are
//! index-based and the initial segment is snapshotted: relations appended by
//! the tie phase are composed *with* but never re-composed *from*, the
//! already-final neighbouring cells having made those products redundant.

use crate::error::CheckError;
use crate::graph::HeightedGraph;
use crate::relation::{RelationStore, SlopedRelation};
use crate::stats::CheckStats;

use super::{check_and_add, compose_interned, Closure, Flags, Outcome};

pub(crate) fn check(
    g: &HeightedGraph,
    flags: Flags,
    stats: &mut CheckStats,
) -> Result<bool, CheckError> {
    let n = g.num_nodes();
    let mut store = RelationStore::new();
    let mut closure = Closure::new(n);
    let mut scratch = SlopedRelation::default();

    for s in 0..n {
        for t in 0..n {
            // Seed with the edge relation, if the edge exists.
            if let Some(rel) = g.edge_relation(s, t) {
                stats.initial_size += 1;
                let rid = store.insert(rel.clone());
                let outcome =
                    check_and_add(closure.cell_mut(s, t), &store, rid, s == t, flags, 0, stats)?;
                if outcome == Outcome::FailedSelfLoop {
                    return Ok(false);
                }
            }

            // Middles strictly below both endpoints: both source cells are
            // final, plain products.
            for m in 0..s.min(t) {
                let lefts = closure.cell(s, m).rels.clone();
                let rights = closure.cell(m, t).rels.clone();
                for &p in &lefts {
                    for &q in &rights {
                        let rid = compose_interned(&mut store, &mut scratch, p, q, stats)?;
                        let outcome = check_and_add(
                            closure.cell_mut(s, t),
                            &store,
                            rid,
                            s == t,
                            flags,
                            0,
                            stats,
                        )?;
                        if outcome == Outcome::FailedSelfLoop {
                            return Ok(false);
                        }
                    }
                }
            }

            if !tie_the_loops(&mut closure, &mut store, &mut scratch, s, t, flags, stats)? {
                return Ok(false);
            }
            closure.cell_mut(s, t).finalize();
        }
    }

    stats.final_size = closure.size();

    if flags.contains(Flags::FAIL_FAST) {
        // Every diagonal relation was tested as it was added.
        return Ok(true);
    }
    closure.diagonals_pass(&store, flags, stats)
}

/// Handles the middle node equal to an endpoint. Returns false on a
/// fail-fast soundness failure.
fn tie_the_loops(
    closure: &mut Closure,
    store: &mut RelationStore,
    scratch: &mut SlopedRelation,
    s: usize,
    t: usize,
    flags: Flags,
    stats: &mut CheckStats,
) -> Result<bool, CheckError> {
    let snapshot = closure.cell(s, t).len();
    let diagonal = s == t;

    if s > t {
        // Middle t: the growing cell on the left, the final (t, t) cell on
        // the right. The left cursor stops at the snapshot.
        let rights = closure.cell(t, t).rels.clone();
        for l in 0..snapshot {
            let p = closure.cell(s, t).rels[l];
            for &q in &rights {
                let rid = compose_interned(store, scratch, p, q, stats)?;
                let outcome = check_and_add(
                    closure.cell_mut(s, t),
                    store,
                    rid,
                    diagonal,
                    flags,
                    snapshot,
                    stats,
                )?;
                if outcome == Outcome::FailedSelfLoop {
                    return Ok(false);
                }
            }
        }
    } else if s < t {
        // Middle s: final (s, s) on the left, the growing cell's snapshot
        // on the right.
        let lefts = closure.cell(s, s).rels.clone();
        for r in 0..snapshot {
            let q = closure.cell(s, t).rels[r];
            for &p in &lefts {
                let rid = compose_interned(store, scratch, p, q, stats)?;
                let outcome = check_and_add(
                    closure.cell_mut(s, t),
                    store,
                    rid,
                    diagonal,
                    flags,
                    snapshot,
                    stats,
                )?;
                if outcome == Outcome::FailedSelfLoop {
                    return Ok(false);
                }
            }
        }
    } else {
        // Middle s = t: the cell composes with itself. The right cursor
        // walks the growing list (appended relations included), the left
        // stays inside the snapshot; every removal is deferred while both
        // cursors are live.
        let mut r = 0;
        while r < closure.cell(s, s).len() {
            for l in 0..snapshot {
                let p = closure.cell(s, s).rels[l];
                let q = closure.cell(s, s).rels[r];
                let rid = compose_interned(store, scratch, p, q, stats)?;
                let outcome = check_and_add(
                    closure.cell_mut(s, s),
                    store,
                    rid,
                    true,
                    flags,
                    usize::MAX,
                    stats,
                )?;
                if outcome == Outcome::FailedSelfLoop {
                    return Ok(false);
                }
            }
            r += 1;
        }
    }

    Ok(true)
}
