//! Ramsey-style Büchi language inclusion.
//!
//! No complementation construction: the procedure works with *transition
//! profiles* of finite words. The profile of a word records, for every
//! state pair `(p, q)`, whether the automaton can run from `p` to `q` over
//! the word, and whether some such run crosses an accepting edge. Profiles
//! compose the way words concatenate, and the profiles of all non-empty
//! words are the closure of the single-letter profiles under composition —
//! a finite monoid.
//!
//! By Ramsey's theorem every infinite word has an ultimately periodic
//! witness shaped `u · v^ω` with the profile pair `(g, h)` *proper*
//! (`g∘h = g`, `h∘h = h`), and for a proper pair the automaton accepts
//! `u · v^ω` iff some state `q` is reachable from the initial state under
//! `g` and loops on itself under `h` through an accepting edge. The
//! inclusion `L(A) ⊆ L(B)` therefore fails iff some proper pair passes
//! that lasso test on `A` and fails it on `B`. Both automata's profiles
//! are tracked in lockstep so the pair always speaks about the same words.

use fnv::FnvHashSet;

use crate::buchi::Buchi;

/// Reachability of one state from another over the runs on some word:
/// `0` none, `1` a run, `2` a run crossing an accepting edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ReachMatrix {
    n: usize,
    cells: Vec<u8>,
}

impl ReachMatrix {
    fn empty(n: usize) -> Self {
        ReachMatrix {
            n,
            cells: vec![0; n * n],
        }
    }

    #[inline]
    fn get(&self, p: usize, q: usize) -> u8 {
        self.cells[p * self.n + q]
    }

    #[inline]
    fn join(&mut self, p: usize, q: usize, v: u8) {
        let cell = &mut self.cells[p * self.n + q];
        if v > *cell {
            *cell = v;
        }
    }

    fn compose(&self, other: &ReachMatrix) -> ReachMatrix {
        let mut out = ReachMatrix::empty(self.n);
        for p in 0..self.n {
            for m in 0..self.n {
                let first = self.get(p, m);
                if first == 0 {
                    continue;
                }
                for q in 0..self.n {
                    let second = other.get(m, q);
                    if second == 0 {
                        continue;
                    }
                    out.join(p, q, first.max(second));
                }
            }
        }
        out
    }

    fn is_zero(&self) -> bool {
        self.cells.iter().all(|&c| c == 0)
    }

    /// The lasso test: some state reachable from `init` loops on itself
    /// through an accepting edge.
    fn lasso(&self, loop_part: &ReachMatrix, init: usize) -> bool {
        (0..self.n).any(|q| self.get(init, q) > 0 && loop_part.get(q, q) == 2)
    }
}

/// The profiles of one word on both automata, in lockstep.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Profile {
    sub: ReachMatrix,
    sup: ReachMatrix,
}

impl Profile {
    fn compose(&self, other: &Profile) -> Profile {
        Profile {
            sub: self.sub.compose(&other.sub),
            sup: self.sup.compose(&other.sup),
        }
    }
}

/// Decides `L(sub) ⊆ L(sup)`.
///
/// Both automata must carry labels from the same dictionary width; an
/// automaton without edges accepts nothing.
pub fn contains(sup: &Buchi, sub: &Buchi) -> bool {
    if sub.edges().is_empty() {
        return true;
    }
    let valuations = sub.edges()[0].label.num_valuations();
    for edge in sub.edges().iter().chain(sup.edges()) {
        assert_eq!(
            edge.label.num_valuations(),
            valuations,
            "labels from different dictionary widths cannot be compared"
        );
    }

    // One profile per letter the subject automaton can read at all. A
    // letter it cannot read appears in none of its words, so it cannot
    // appear in a counterexample either.
    let mut letters: Vec<Profile> = Vec::new();
    let mut seen: FnvHashSet<Profile> = FnvHashSet::default();
    for v in 0..valuations {
        let mut profile = Profile {
            sub: ReachMatrix::empty(sub.num_states()),
            sup: ReachMatrix::empty(sup.num_states()),
        };
        for edge in sub.edges() {
            if edge.label.holds_for(v) {
                profile.sub.join(edge.src, edge.dst, if edge.accepting { 2 } else { 1 });
            }
        }
        if profile.sub.is_zero() {
            continue;
        }
        for edge in sup.edges() {
            if edge.label.holds_for(v) {
                profile.sup.join(edge.src, edge.dst, if edge.accepting { 2 } else { 1 });
            }
        }
        if seen.insert(profile.clone()) {
            letters.push(profile);
        }
    }

    // Close under composition: the monoid of word profiles.
    let mut profiles = letters;
    let mut pos = 0;
    while pos < profiles.len() {
        let mut fresh = Vec::new();
        for other in &profiles {
            let left = profiles[pos].compose(other);
            if seen.insert(left.clone()) {
                fresh.push(left);
            }
            let right = other.compose(&profiles[pos]);
            if seen.insert(right.clone()) {
                fresh.push(right);
            }
        }
        profiles.extend(fresh);
        pos += 1;
    }

    // Hunt for a counterexample lasso over the proper pairs.
    for h in &profiles {
        if h.compose(h) != *h {
            continue;
        }
        for g in &profiles {
            let prefix = g.compose(h);
            if prefix.sub.lasso(&h.sub, sub.init_state())
                && !prefix.sup.lasso(&h.sup, sup.init_state())
            {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bdd::BddDict;

    /// One proposition; the two letters are `a` and `¬a`.
    fn letter_dict() -> (BddDict, crate::bdd::Bdd, crate::bdd::Bdd) {
        let mut dict = BddDict::new();
        let a = dict.register_ap("a");
        let pa = dict.ithvar(a);
        let na = pa.not();
        (dict, pa, na)
    }

    #[test]
    fn an_automaton_contains_itself() {
        let (_dict, pa, na) = letter_dict();
        let mut aut = Buchi::new();
        aut.new_states(2);
        aut.set_init_state(0);
        aut.new_edge(0, 1, pa, true);
        aut.new_edge(1, 0, na, false);
        assert!(contains(&aut, &aut));
    }

    #[test]
    fn edgeless_subject_is_contained_in_anything() {
        let (_dict, _pa, _na) = letter_dict();
        let mut sub = Buchi::new();
        sub.new_states(1);
        sub.set_init_state(0);
        let sup = Buchi::new();
        assert!(contains(&sup, &sub));
    }

    #[test]
    fn subject_without_accepting_edges_is_contained_in_anything() {
        let (_dict, pa, _na) = letter_dict();
        let mut sub = Buchi::new();
        sub.new_states(1);
        sub.set_init_state(0);
        sub.new_edge(0, 0, pa, false);

        let mut sup = Buchi::new();
        sup.new_states(1);
        sup.set_init_state(0);
        assert!(contains(&sup, &sub));
    }

    #[test]
    fn restricting_the_alphabet_is_containment() {
        let (dict, pa, _na) = letter_dict();
        let mut sub = Buchi::new();
        sub.new_states(1);
        sub.set_init_state(0);
        sub.new_edge(0, 0, pa, true);

        let mut sup = Buchi::new();
        sup.new_states(1);
        sup.set_init_state(0);
        sup.new_edge(0, 0, dict.mk_true(), true);

        assert!(contains(&sup, &sub));
        // The other way round the superset accepts words the subject
        // cannot even read.
        assert!(!contains(&sub, &sup));
    }

    #[test]
    fn acceptance_marks_are_respected() {
        let (_dict, pa, na) = letter_dict();
        // Accepts the words with infinitely many `a`s.
        let mut inf_a = Buchi::new();
        inf_a.new_states(1);
        inf_a.set_init_state(0);
        inf_a.new_edge(0, 0, pa.clone(), true);
        inf_a.new_edge(0, 0, na.clone(), false);

        // Accepts exactly (¬a)^ω.
        let mut only_na = Buchi::new();
        only_na.new_states(1);
        only_na.set_init_state(0);
        only_na.new_edge(0, 0, na.clone(), true);

        // Accepts a · (¬a)^ω.
        let mut lasso = Buchi::new();
        lasso.new_states(2);
        lasso.set_init_state(0);
        lasso.new_edge(0, 1, pa.clone(), true);
        lasso.new_edge(1, 1, na.clone(), true);

        assert!(!contains(&inf_a, &only_na));
        assert!(!contains(&inf_a, &lasso));

        // Accepts the words with infinitely many ¬a.
        let mut inf_na = Buchi::new();
        inf_na.new_states(1);
        inf_na.set_init_state(0);
        inf_na.new_edge(0, 0, pa, false);
        inf_na.new_edge(0, 0, na.clone(), true);

        assert!(contains(&inf_na, &only_na));
        assert!(contains(&inf_na, &lasso));
    }

    #[test]
    fn unreachable_accepting_loops_do_not_help() {
        let (_dict, pa, _na) = letter_dict();
        let mut sub = Buchi::new();
        sub.new_states(1);
        sub.set_init_state(0);
        sub.new_edge(0, 0, pa.clone(), true);

        // The accepting loop exists but cannot be reached from the initial
        // state.
        let mut sup = Buchi::new();
        sup.new_states(2);
        sup.set_init_state(0);
        sup.new_edge(1, 1, pa, true);

        assert!(!contains(&sup, &sub));
    }

    #[test]
    fn no_propositions_means_a_single_letter() {
        let dict = BddDict::new();
        let mut sub = Buchi::new();
        sub.new_states(1);
        sub.set_init_state(0);
        sub.new_edge(0, 0, dict.mk_true(), true);

        let mut quiet_sup = Buchi::new();
        quiet_sup.new_states(1);
        quiet_sup.set_init_state(0);
        quiet_sup.new_edge(0, 0, dict.mk_true(), false);

        assert!(!contains(&quiet_sup, &sub));
        assert!(contains(&sub, &sub));
    }
}
