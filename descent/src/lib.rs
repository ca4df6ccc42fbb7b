//! # Infinite-descent soundness checking for heighted graphs
//!
//! ## Description
//! Data types and decision procedures for the soundness condition used by
//! cyclic proof systems: given a finite directed graph whose nodes carry
//! finite sets of ordinal heights, and whose edges describe how the heights
//! of one node relate to the heights of the next (stay equal, or strictly
//! decrease), decide whether every infinite path through the graph admits a
//! trace of heights that decreases infinitely often.
//!
//! ## Idea
//! The heart of the library is the [`SlopedRelation`](relation::SlopedRelation):
//! a partial map from height pairs to slopes. Relations compose along paths,
//! and the set of relations labelling all non-empty paths between two nodes
//! is finite, so it can be computed as a fixed point (the composition
//! closure). The graph is sound iff every relation a cycle can produce
//! relates some height to itself with a strict decrease somewhere along the
//! way. Three closure strategies and a handful of optimisations are provided
//! in [`soundness`], together with an alternative route that reduces the
//! whole question to a Büchi language inclusion.
//!
//! ## Limitations
//! Checks are sequential; run independent checks on independent
//! [`HeightedGraph`](graph::HeightedGraph) instances if you want parallelism.

use std::collections::{HashMap, HashSet};
use std::hash::BuildHasherDefault;

use ahash::AHasher;

pub mod error;
pub mod graph;
pub mod relation;
pub mod soundness;
pub mod stats;

pub use error::CheckError;
pub use graph::HeightedGraph;
pub use relation::{Slope, SlopedRelation};
pub use soundness::{AutomatonBackend, Flags, UnknownFlag};
pub use stats::CheckStats;

/// A `HashMap` using `AHasher` to hash, as the maps here are keyed by small
/// integers and content hashes, not attacker-controlled input.
pub type AHashMap<K, V> = HashMap<K, V, BuildHasherDefault<AHasher>>;
/// A `HashSet` using `AHasher` to hash.
pub type AHashSet<K> = HashSet<K, BuildHasherDefault<AHasher>>;
