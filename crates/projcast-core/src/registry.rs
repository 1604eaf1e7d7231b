//! Surface identity and the registration table.

use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity for a target surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub fn fresh() -> Self {
        SurfaceId(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Insertion-ordered registration records keyed by surface identity.
///
/// One record holds everything attached to a surface, so removing a surface
/// can never strand partner state. Target counts are small in practice;
/// lookups are linear scans.
#[derive(Debug)]
pub struct RegistrationTable<T> {
    entries: SmallVec<[(SurfaceId, T); 4]>,
}

impl<T> Default for RegistrationTable<T> {
    fn default() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }
}

impl<T> RegistrationTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.entries.iter().any(|(key, _)| *key == id)
    }

    /// Insert a record; a duplicate id is a no-op and returns false (the
    /// offered record is dropped).
    pub fn insert(&mut self, id: SurfaceId, record: T) -> bool {
        if self.contains(id) {
            return false;
        }
        self.entries.push((id, record));
        true
    }

    /// Remove a record; an unknown id is a no-op and returns None.
    pub fn remove(&mut self, id: SurfaceId) -> Option<T> {
        let index = self.entries.iter().position(|(key, _)| *key == id)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, id: SurfaceId) -> Option<&T> {
        self.entries
            .iter()
            .find(|(key, _)| *key == id)
            .map(|(_, record)| record)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SurfaceId, &T)> {
        self.entries.iter().map(|(id, record)| (*id, record))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (SurfaceId, &mut T)> {
        self.entries.iter_mut().map(|(id, record)| (*id, record))
    }

    /// Empty the table, yielding every record for release.
    pub fn drain(&mut self) -> impl Iterator<Item = (SurfaceId, T)> + '_ {
        self.entries.drain(..)
    }
}
