//! The checker-facing backend: wires this crate's automata into the
//! `descent` checker's automata-theoretic mode.

use descent::AutomatonBackend;

use crate::bdd::{Bdd, BddDict};
use crate::buchi::Buchi;
use crate::inclusion;

/// An [`AutomatonBackend`] over this crate's dictionary, automata and
/// inclusion procedure. One backend value is one proposition dictionary;
/// use a fresh backend per check.
#[derive(Debug, Default)]
pub struct OmegaBackend {
    dict: BddDict,
}

impl OmegaBackend {
    pub fn new() -> Self {
        Default::default()
    }
}

impl AutomatonBackend for OmegaBackend {
    type Label = Bdd;
    type Automaton = Buchi;

    fn new_automaton(&mut self) -> Buchi {
        Buchi::new()
    }

    fn register_atomic_proposition(&mut self, name: &str) -> usize {
        self.dict.register_ap(name)
    }

    fn bdd_ithvar(&self, var: usize) -> Bdd {
        self.dict.ithvar(var)
    }

    fn bdd_true(&self) -> Bdd {
        self.dict.mk_true()
    }

    fn bdd_false(&self) -> Bdd {
        self.dict.mk_false()
    }

    fn bdd_not(&self, x: &Bdd) -> Bdd {
        x.not()
    }

    fn bdd_and(&self, x: &Bdd, y: &Bdd) -> Bdd {
        x.and(y)
    }

    fn bdd_or(&self, x: &Bdd, y: &Bdd) -> Bdd {
        x.or(y)
    }

    fn new_states(&mut self, aut: &mut Buchi, count: usize) {
        aut.new_states(count);
    }

    fn set_init_state(&mut self, aut: &mut Buchi, state: usize) {
        aut.set_init_state(state);
    }

    fn new_edge(&mut self, aut: &mut Buchi, src: usize, dst: usize, label: &Bdd, accepting: bool) {
        aut.new_edge(src, dst, label.clone(), accepting);
    }

    fn contains(&mut self, a: &Buchi, b: &Buchi) -> bool {
        inclusion::contains(a, b)
    }
}
