use super::codec::Key;
use super::types::PlayerId;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Cells that are lethal to enter.
///
/// Every snake contributes all of its segments except its head. Each cell
/// carries a reference count so overlapping footprints from two snakes do not
/// clear each other.
#[derive(Debug, Default)]
pub struct OccupancyModel {
    cells: HashMap<Key, u32>,
}

impl OccupancyModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_occupied(&mut self, key: Key) {
        *self.cells.entry(key).or_insert(0) += 1;
    }

    pub fn clear_occupied(&mut self, key: Key) {
        if let Entry::Occupied(mut entry) = self.cells.entry(key) {
            if *entry.get() <= 1 {
                entry.remove();
            } else {
                *entry.get_mut() -= 1;
            }
        }
    }

    pub fn is_occupied(&self, key: Key) -> bool {
        self.cells.contains_key(&key)
    }

    /// Drops a peer's previous footprint and installs the new one.
    pub fn replace_all(
        &mut self,
        peer_id: PlayerId,
        old_keys: impl IntoIterator<Item = Key>,
        new_keys: impl IntoIterator<Item = Key>,
    ) {
        let mut cleared = 0usize;
        for key in old_keys {
            self.clear_occupied(key);
            cleared += 1;
        }
        let mut marked = 0usize;
        for key in new_keys {
            self.mark_occupied(key);
            marked += 1;
        }
        tracing::trace!(peer_id, cleared, marked, "replaced peer footprint");
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.cells.keys().copied()
    }
}
