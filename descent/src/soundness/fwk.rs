//! The Floyd-Warshall-Kleene composition-closure strategy.
//!
//! One pass over the middle nodes `k`. Each stage first asterates the
//! diagonal cell — closes `Closure[k][k]` under composition with the
//! identity thrown in — and then extends every cell `(i, j)` with
//! `P ∘ Q ∘ R` for `P` before `k`, `Q` looping at `k`, `R` after `k`,
//! reading the previous stage's buffer and writing a fresh one.
//!
//! The identity is only ever *added* to the asterate, never to a closure
//! cell: where a composition collapses onto it (`i = k` or `j = k`) it
//! would merely reproduce a relation the cell already holds, so it is
//! skipped; in the general case it is the neutral middle and contributes
//! the plain `P ∘ R` product.

use crate::error::CheckError;
use crate::graph::HeightedGraph;
use crate::relation::{RelId, RelationStore, SlopedRelation};
use crate::stats::CheckStats;

use super::{check_and_add, compose_interned, Cell, Closure, Flags, Outcome};

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
            if let Some(rel) = g.edge_relation(s, t) {
                stats.initial_size += 1;
                let rid = store.insert(rel.clone());
                let outcome =
                    check_and_add(closure.cell_mut(s, t), &store, rid, s == t, flags, 0, stats)?;
                if outcome == Outcome::FailedSelfLoop {
                    return Ok(false);
                }
            }
        }
    }

    for k in 0..n {
        let (aster, artificial) = asterate(
            &closure,
            k,
            g.height_count(k),
            &mut store,
            &mut scratch,
            flags,
            stats,
        )?;

        let mut next = closure.clone();
        for i in 0..n {
            for j in 0..n {
                let sound = update_cell(
                    &mut next,
                    &closure,
                    &aster,
                    artificial,
                    (i, j, k),
                    &mut store,
                    &mut scratch,
                    flags,
                    stats,
                )?;
                if !sound {
                    return Ok(false);
                }
            }
        }
        closure = next;
    }

    stats.final_size = closure.size();
    if flags.contains(Flags::FAIL_FAST) {
        return Ok(true);
    }
    closure.diagonals_pass(&store, flags, stats)
}

/// `Closure[k][k]*`: the diagonal cell closed under composition, with the
/// identity inserted up front iff it was not already a member. Returns the
/// asterate and the id of the artificially added identity, if any.
fn asterate(
    closure: &Closure,
    k: usize,
    width: u32,
    store: &mut RelationStore,
    scratch: &mut SlopedRelation,
    flags: Flags,
    stats: &mut CheckStats,
) -> Result<(Cell, Option<RelId>), CheckError> {
    let seeds = closure.cell(k, k).rels.clone();
    let id_rid = store.insert(SlopedRelation::new_identity(width));
    let artificial = !seeds.contains(&id_rid);

    // The asterate is not a closure cell: nothing in it is diagonal-tested
    // here. Whatever of it reaches a cell is tested on insertion there.
    let mut aster = Cell::default();
    if artificial {
        check_and_add(&mut aster, store, id_rid, false, flags, usize::MAX, stats)?;
    }
    for &c in &seeds {
        check_and_add(&mut aster, store, c, false, flags, usize::MAX, stats)?;
    }

    let mut pos = 0;
    while pos < aster.rels.len() {
        let p = aster.rels[pos];
        for &c in &seeds {
            let rid = compose_interned(store, scratch, p, c, stats)?;
            check_and_add(&mut aster, store, rid, false, flags, usize::MAX, stats)?;
        }
        pos += 1;
    }
    aster.finalize();

    Ok((aster, if artificial { Some(id_rid) } else { None }))
}

/// Stage-`k` update of one cell. Returns false on a fail-fast failure.
#[allow(clippy::too_many_arguments)]
fn update_cell(
    next: &mut Closure,
    old: &Closure,
    aster: &Cell,
    artificial: Option<RelId>,
    (i, j, k): (usize, usize, usize),
    store: &mut RelationStore,
    scratch: &mut SlopedRelation,
    flags: Flags,
    stats: &mut CheckStats,
) -> Result<bool, CheckError> {
    let diagonal = i == j;

    if i == k && j == k {
        // The triple collapses entirely: the cell becomes the asterate,
        // minus the identity it never genuinely contained.
        for &q in &aster.rels {
            if Some(q) == artificial {
                continue;
            }
            let outcome = check_and_add(next.cell_mut(k, k), store, q, true, flags, 0, stats)?;
            if outcome == Outcome::FailedSelfLoop {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    if i == k {
        let rights = old.cell(k, j).rels.clone();
        for &q in &aster.rels {
            if Some(q) == artificial {
                continue;
            }
            for &r in &rights {
                let rid = compose_interned(store, scratch, q, r, stats)?;
                let outcome =
                    check_and_add(next.cell_mut(i, j), store, rid, diagonal, flags, 0, stats)?;
                if outcome == Outcome::FailedSelfLoop {
                    return Ok(false);
                }
            }
        }
        return Ok(true);
    }

    if j == k {
        let lefts = old.cell(i, k).rels.clone();
        for &q in &aster.rels {
            if Some(q) == artificial {
                continue;
            }
            for &p in &lefts {
                let rid = compose_interned(store, scratch, p, q, stats)?;
                let outcome =
                    check_and_add(next.cell_mut(i, j), store, rid, diagonal, flags, 0, stats)?;
                if outcome == Outcome::FailedSelfLoop {
                    return Ok(false);
                }
            }
        }
        return Ok(true);
    }

    let lefts = old.cell(i, k).rels.clone();
    let rights = old.cell(k, j).rels.clone();
    if lefts.is_empty() || rights.is_empty() {
        return Ok(true);
    }
    for &q in &aster.rels {
        let neutral = Some(q) == artificial;
        for &p in &lefts {
            // The artificial identity is the neutral middle: its triple is
            // the plain P ∘ R product.
            let left = if neutral {
                p
            } else {
                compose_interned(store, scratch, p, q, stats)?
            };
            for &r in &rights {
                let rid = compose_interned(store, scratch, left, r, stats)?;
                let outcome =
                    check_and_add(next.cell_mut(i, j), store, rid, diagonal, flags, 0, stats)?;
                if outcome == Outcome::FailedSelfLoop {
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}
