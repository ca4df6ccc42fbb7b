//! The original doubly-buffered composition-closure strategy.
//!
//! Kept next to the order-reduced sweep the way one keeps the previous
//! solver around: same verdicts, simpler invariants, more work. Each cell
//! holds its relations in generations — the one being collected, the one the
//! previous round produced, and everything older. A round composes
//! new×new, old×new and new×old (old×old was already done in an earlier
//! round) and the fixed point is reached when a full round adds nothing.

use crate::error::CheckError;
use crate::graph::HeightedGraph;
use crate::relation::{Comparison, RelId, RelationStore, SlopedRelation};
use crate::stats::CheckStats;
use crate::AHashSet;

use super::{compose_interned, passes_self_loop_test, Flags};

#[derive(Debug, Default)]
struct GenCell {
    /// Newest generation first; `gens[0]` collects the current round.
    gens: Vec<Vec<RelId>>,
    members: AHashSet<RelId>,
}

impl GenCell {
    /// Opens a fresh collector generation, dropping an exhausted one rather
    /// than piling up empties.
    fn open_generation(&mut self) {
        if self.gens.len() > 1 {
            if self.gens[0].is_empty() && self.gens[1].is_empty() {
                return;
            }
            if !self.gens[0].is_empty() && self.gens[1].is_empty() {
                self.gens.remove(1);
            }
        }
        self.gens.insert(0, Vec::new());
    }

    fn newest_closed(&self) -> Vec<RelId> {
        self.gens.get(1).cloned().unwrap_or_default()
    }

    fn older(&self) -> Vec<RelId> {
        if self.gens.len() > 2 {
            self.gens[2..].concat()
        } else {
            Vec::new()
        }
    }

    fn iter_all(&self) -> impl Iterator<Item = RelId> + '_ {
        self.gens.iter().flatten().copied()
    }
}

pub(crate) fn check(
    g: &HeightedGraph,
    flags: Flags,
    stats: &mut CheckStats,
) -> Result<bool, CheckError> {
    let n = g.num_nodes();
    let mut store = RelationStore::new();
    let mut scratch = SlopedRelation::default();
    let mut cells: Vec<GenCell> = (0..n * n).map(|_| GenCell::default()).collect();

    for s in 0..n {
        for t in 0..n {
            if let Some(rel) = g.edge_relation(s, t) {
                stats.initial_size += 1;
                let rid = store.insert(rel.clone());
                let cell = &mut cells[s * n + t];
                cell.gens.push(vec![rid]);
                cell.members.insert(rid);
            }
        }
    }

    // Under fail-fast the seeds themselves need checking before any
    // composition happens.
    if flags.contains(Flags::FAIL_FAST) {
        for v in 0..n {
            let diag: Vec<RelId> = cells[v * n + v].iter_all().collect();
            for rid in diag {
                if !passes_self_loop_test(store.get(rid), flags, stats)? {
                    return Ok(false);
                }
            }
        }
    }

    let mut done = false;
    while !done {
        done = true;
        for cell in cells.iter_mut() {
            cell.open_generation();
        }

        for source in 0..n {
            for sink in 0..n {
                let mut additions = 0;
                for middle in 0..n {
                    let left = &cells[source * n + middle];
                    let right = &cells[middle * n + sink];
                    if left.gens.len() <= 1 || right.gens.len() <= 1 {
                        continue;
                    }
                    let left_new = left.newest_closed();
                    let right_new = right.newest_closed();
                    if left_new.is_empty() && right_new.is_empty() {
                        continue;
                    }
                    let left_old = left.older();
                    let right_old = right.older();

                    // new×new, then old×new, then new×old. Old×old pairs
                    // were composed the round both sides were new.
                    let pairings: [(&[RelId], &[RelId]); 3] = [
                        (left_new.as_slice(), right_new.as_slice()),
                        (left_old.as_slice(), right_new.as_slice()),
                        (left_new.as_slice(), right_old.as_slice()),
                    ];
                    for (lefts, rights) in pairings.iter() {
                        for &p in lefts.iter() {
                            for &q in rights.iter() {
                                let rid =
                                    compose_interned(&mut store, &mut scratch, p, q, stats)?;
                                let added = matches!(
                                    insert_candidate(
                                        &mut cells[source * n + sink],
                                        &store,
                                        rid,
                                        flags,
                                        stats,
                                    ),
                                    Inserted::Added
                                );
                                if added {
                                    additions += 1;
                                    if flags.contains(Flags::FAIL_FAST)
                                        && source == sink
                                        && !passes_self_loop_test(store.get(rid), flags, stats)?
                                    {
                                        return Ok(false);
                                    }
                                }
                            }
                        }
                    }
                }
                if additions > 0 {
                    done = false;
                }
            }
        }
    }

    stats.final_size = cells.iter().map(|c| c.iter_all().count()).sum();

    if flags.contains(Flags::FAIL_FAST) {
        return Ok(true);
    }
    for v in 0..n {
        let diag: Vec<RelId> = cells[v * n + v].iter_all().collect();
        for rid in diag {
            if !passes_self_loop_test(store.get(rid), flags, stats)? {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

enum Inserted {
    Added,
    Rejected,
}

/// The generation-aware rendition of check-and-add. No deferred removals
/// here: the source generations are snapshotted before composing, so the
/// cell can mutate freely.
fn insert_candidate(
    cell: &mut GenCell,
    store: &RelationStore,
    rid: RelId,
    flags: Flags,
    stats: &mut CheckStats,
) -> Inserted {
    if cell.members.contains(&rid) {
        stats.rejections += 1;
        return Inserted::Rejected;
    }

    if flags.contains(Flags::USE_MINIMALITY) {
        let start = std::time::Instant::now();
        for gen in cell.gens.iter_mut() {
            let mut pos = 0;
            while pos < gen.len() {
                let existing = gen[pos];
                stats.comparisons += 1;
                match store.get(rid).compare(store.get(existing)) {
                    Comparison::Equal | Comparison::Greater => {
                        stats.rejections += 1;
                        stats.compare_time += start.elapsed();
                        return Inserted::Rejected;
                    }
                    Comparison::Less => {
                        stats.replacements += 1;
                        cell.members.remove(&existing);
                        gen.remove(pos);
                    }
                    Comparison::Incomparable => pos += 1,
                }
            }
        }
        stats.compare_time += start.elapsed();
    }

    cell.gens[0].push(rid);
    cell.members.insert(rid);
    Inserted::Added
}
