use std::mem;

use crate::AHashMap;

use super::SlopedRelation;

/// Handle to a canonical relation inside a [`RelationStore`].
///
/// Two ids from the same store are equal iff the relations they name are
/// extensionally equal, so closure cells compare representatives by id alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelId(u32);

impl RelId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owns every sloped relation created during one check.
///
/// Interning returns one canonical [`RelId`] per distinct relation; closure
/// cells hold ids only and borrow the relation back on demand. The store is
/// private to a single check and dropped with it, which is what releases
/// every relation the check produced, early exit included.
#[derive(Debug, Default)]
pub struct RelationStore {
    rels: Vec<SlopedRelation>,
    /// Content-hash buckets; collisions are resolved by full comparison.
    index: AHashMap<u64, Vec<RelId>>,
}

impl RelationStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Number of distinct relations interned so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    #[inline]
    pub fn get(&self, id: RelId) -> &SlopedRelation {
        &self.rels[id.index()]
    }

    /// Interns a relation by value, returning its canonical id.
    pub fn insert(&mut self, mut rel: SlopedRelation) -> RelId {
        self.intern_scratch(&mut rel).0
    }

    /// Interns the relation currently held in `scratch`.
    ///
    /// If the relation is new, the buffer is adopted into the store and
    /// `scratch` is left empty (a fresh buffer for the caller). If an equal
    /// relation already exists, `scratch` is untouched and can be cleared
    /// and reused for the next composition. The second component reports
    /// which of the two happened.
    pub fn intern_scratch(&mut self, scratch: &mut SlopedRelation) -> (RelId, bool) {
        let hash = scratch.content_hash();
        if let Some(bucket) = self.index.get(&hash) {
            for &id in bucket {
                if self.rels[id.index()] == *scratch {
                    return (id, false);
                }
            }
        }
        let id = RelId(self.rels.len() as u32);
        self.rels.push(mem::take(scratch));
        self.index.entry(hash).or_insert_with(Vec::new).push(id);
        (id, true)
    }

    /// Looks a relation up without interning it.
    pub fn find(&self, rel: &SlopedRelation) -> Option<RelId> {
        let bucket = self.index.get(&rel.content_hash())?;
        bucket
            .iter()
            .copied()
            .find(|&id| self.rels[id.index()] == *rel)
    }
}
