//! # A small ω-automaton library
//!
//! ## Description
//! Büchi automata with BDD-labelled edges over a shared dictionary of
//! atomic propositions, and a decision procedure for language inclusion.
//! Built as the automaton backend for the descent checker's
//! automata-theoretic mode, but nothing here knows about heighted graphs.
//!
//! ## Idea
//! Labels are truth tables over the registered propositions ([`bdd`]): for
//! the proposition counts the inclusion reduction produces (logarithmic in
//! the number of distinct edge relations) a dense table is small, exact and
//! trivially canonical. Acceptance is transition-based: an automaton
//! accepts the infinite words along which some run crosses an accepting
//! edge infinitely often.
//!
//! Inclusion ([`inclusion`]) is decided Ramsey-style, by composing
//! transition profiles of finite words rather than complementing: the same
//! compose-until-closed shape as the relational checker it serves.
//!
//! ## Limitations
//! Everything enumerates the full valuation space of the dictionary, so
//! keep the proposition count modest (a few dozen distinct letters). That
//! is the regime the checker lives in.

pub mod backend;
pub mod bdd;
pub mod buchi;
pub mod inclusion;

pub use backend::OmegaBackend;
pub use bdd::{Bdd, BddDict};
pub use buchi::Buchi;
pub use inclusion::contains;
