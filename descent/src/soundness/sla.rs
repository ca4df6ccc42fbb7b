//! The automata-theoretic check.
//!
//! Instead of closing the relations under composition, build two ω-automata
//! over a shared alphabet of atomic propositions — one accepting the
//! infinite paths of the graph (projected to the sloped relations they
//! traverse), one accepting the words along which some trace of heights
//! descends infinitely often — and ask the backend whether the first
//! language is contained in the second.
//!
//! The alphabet letter of a relation is the binary encoding of its dedup
//! index over `⌈log₂ |U|⌉` propositions, a `0` bit reading as the positive
//! literal. The same encoding is used on both automata; nothing else about
//! the polarity matters.

use crate::error::CheckError;
use crate::graph::HeightedGraph;
use crate::relation::{RelId, RelationStore, Slope};
use crate::AHashMap;

/// The ω-automaton capability the check consumes: Büchi automata with
/// BDD-labelled edges over a shared dictionary of atomic propositions, and
/// a language-inclusion decision.
///
/// Register every proposition before building any label from the same
/// dictionary.
pub trait AutomatonBackend {
    type Label: Clone;
    type Automaton;

    /// A fresh automaton sharing this backend's proposition dictionary.
    fn new_automaton(&mut self) -> Self::Automaton;

    /// Registers an atomic proposition and returns its variable number.
    fn register_atomic_proposition(&mut self, name: &str) -> usize;

    /// The label holding exactly the valuations with `var` set.
    fn bdd_ithvar(&self, var: usize) -> Self::Label;

    fn bdd_true(&self) -> Self::Label;
    fn bdd_false(&self) -> Self::Label;
    fn bdd_not(&self, x: &Self::Label) -> Self::Label;
    fn bdd_and(&self, x: &Self::Label, y: &Self::Label) -> Self::Label;
    fn bdd_or(&self, x: &Self::Label, y: &Self::Label) -> Self::Label;

    /// Appends `count` fresh states, numbered on from the current count.
    fn new_states(&mut self, aut: &mut Self::Automaton, count: usize);

    fn set_init_state(&mut self, aut: &mut Self::Automaton, state: usize);

    /// Adds an edge; `accepting` marks membership in Büchi acceptance set 0.
    fn new_edge(
        &mut self,
        aut: &mut Self::Automaton,
        src: usize,
        dst: usize,
        label: &Self::Label,
        accepting: bool,
    );

    /// Decides `L(b) ⊆ L(a)`.
    fn contains(&mut self, a: &Self::Automaton, b: &Self::Automaton) -> bool;
}

pub(crate) fn check<B: AutomatonBackend>(
    g: &HeightedGraph,
    backend: &mut B,
) -> Result<bool, CheckError> {
    let n = g.num_nodes();

    // The alphabet: one letter per distinct edge relation.
    let mut store = RelationStore::new();
    let mut alphabet: Vec<RelId> = Vec::new();
    let mut index_of: AHashMap<RelId, usize> = AHashMap::default();
    let mut edge_letters: Vec<(usize, usize, usize)> = Vec::new();
    for u in 0..n {
        for v in 0..n {
            if let Some(rel) = g.edge_relation(u, v) {
                let rid = store.insert(rel.clone());
                let next = alphabet.len();
                let idx = *index_of.entry(rid).or_insert(next);
                if idx == next {
                    alphabet.push(rid);
                }
                edge_letters.push((u, v, idx));
            }
        }
    }

    if alphabet.is_empty() {
        // No edges, no infinite paths: the inclusion holds vacuously.
        return Ok(true);
    }

    let mut bits = 0;
    while (1usize << bits) < alphabet.len() {
        bits += 1;
    }

    let props: Vec<B::Label> = (0..bits)
        .map(|b| {
            let var = backend.register_atomic_proposition(&format!("p{}", b));
            backend.bdd_ithvar(var)
        })
        .collect();

    // letter(idx): the conjunction of one literal per proposition, positive
    // where the index bit is 0.
    let mut letters: Vec<B::Label> = Vec::with_capacity(alphabet.len());
    for idx in 0..alphabet.len() {
        let mut acc = backend.bdd_true();
        for (b, p) in props.iter().enumerate() {
            let lit = if (idx >> b) & 1 == 0 {
                p.clone()
            } else {
                backend.bdd_not(p)
            };
            acc = backend.bdd_and(&acc, &lit);
        }
        letters.push(acc);
    }

    // Path automaton: one state per node plus a fresh initial state. A run
    // sits on the node it has reached, having just read the relation of the
    // edge it arrived by; every edge is accepting.
    let mut path = backend.new_automaton();
    backend.new_states(&mut path, n + 1);
    backend.set_init_state(&mut path, n);
    for &(u, v, idx) in &edge_letters {
        backend.new_edge(&mut path, u, v, &letters[idx], true);
    }
    let mut incoming: Vec<Option<B::Label>> = vec![None; n];
    for &(_, v, idx) in &edge_letters {
        let l = match incoming[v].take() {
            Some(acc) => backend.bdd_or(&acc, &letters[idx]),
            None => letters[idx].clone(),
        };
        incoming[v] = Some(l);
    }
    for (v, label) in incoming.iter().enumerate() {
        if let Some(l) = label {
            backend.new_edge(&mut path, n, v, l, true);
        }
    }

    // Trace automaton: one state per height index plus a fresh initial
    // state that idles (and jumps) on anything. Following a stay is silent;
    // following a decrease is accepting. A word is accepted iff some height
    // trace decreases infinitely often.
    let tw = g.trace_width() as usize;
    let mut trace = backend.new_automaton();
    backend.new_states(&mut trace, tw + 1);
    backend.set_init_state(&mut trace, tw);
    let tru = backend.bdd_true();
    backend.new_edge(&mut trace, tw, tw, &tru, false);
    for h in 0..tw {
        backend.new_edge(&mut trace, tw, h, &tru, false);
    }
    for h1 in 0..tw {
        for h2 in 0..tw {
            let mut stay: Option<B::Label> = None;
            let mut down: Option<B::Label> = None;
            for (idx, &rid) in alphabet.iter().enumerate() {
                let acc = match store.get(rid).get(h1 as u32, h2 as u32) {
                    Slope::Stay => &mut stay,
                    Slope::Downward => &mut down,
                    Slope::Undefined => continue,
                };
                *acc = Some(match acc.take() {
                    Some(l) => backend.bdd_or(&l, &letters[idx]),
                    None => letters[idx].clone(),
                });
            }
            if let Some(l) = stay {
                backend.new_edge(&mut trace, h1, h2, &l, false);
            }
            if let Some(l) = down {
                backend.new_edge(&mut trace, h1, h2, &l, true);
            }
        }
    }

    Ok(backend.contains(&trace, &path))
}
