//! Per-slot candidate sets, along with a trail of every change made to them so that speculative
//! pruning can be rolled back cheaply. Rather than copying every domain before trying a choice, we
//! take a `Checkpoint` (just a position in the trail) and later replay the trail backwards to it.

use bit_set::BitSet;

use crate::grid_config::SlotId;
use crate::word_list::{WordId, WordList};

/// A single recorded change to one slot's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrailEntry {
    Removed(SlotId, WordId),
    Inserted(SlotId, WordId),
}

/// A position in the trail that `DomainStore::restore` can roll back to. Checkpoints nest, and
/// must be restored innermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    trail_len: usize,
    generation: usize,
}

/// The live set of options for every slot.
#[derive(Debug, Clone)]
pub struct DomainStore {
    domains: Vec<BitSet>,

    /// Cached `domains[slot_id].len()`, since `BitSet::len` has to scan the whole set.
    sizes: Vec<usize>,

    trail: Vec<TrailEntry>,

    /// Bumped by `commit`, so that checkpoints taken before it can be recognized as stale.
    generation: usize,
}

impl DomainStore {
    /// Start every slot off with the entire word list, regardless of length.
    pub fn initialize(word_list: &WordList, slot_count: usize) -> DomainStore {
        let full: BitSet = (0..word_list.len()).collect();

        DomainStore {
            domains: vec![full; slot_count],
            sizes: vec![word_list.len(); slot_count],
            trail: vec![],
            generation: 0,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.domains.len()
    }

    /// The words currently available for this slot, in `WordId` order.
    pub fn domain(&self, slot_id: SlotId) -> impl Iterator<Item = WordId> + '_ {
        self.domains[slot_id].iter()
    }

    pub fn len(&self, slot_id: SlotId) -> usize {
        self.sizes[slot_id]
    }

    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.sizes[slot_id] == 0
    }

    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.domains[slot_id].contains(word_id)
    }

    /// If this slot has been narrowed down to exactly one word, return it.
    pub fn single_option(&self, slot_id: SlotId) -> Option<WordId> {
        if self.sizes[slot_id] == 1 {
            self.domains[slot_id].iter().next()
        } else {
            None
        }
    }

    /// Remove a word from a slot's domain, returning whether it was there to begin with.
    pub fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        if !self.domains[slot_id].remove(word_id) {
            return false;
        }
        self.sizes[slot_id] -= 1;
        self.trail.push(TrailEntry::Removed(slot_id, word_id));
        true
    }

    fn insert(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        if !self.domains[slot_id].insert(word_id) {
            return false;
        }
        self.sizes[slot_id] += 1;
        self.trail.push(TrailEntry::Inserted(slot_id, word_id));
        true
    }

    /// Replace a slot's domain with exactly the given words.
    pub fn restrict<I>(&mut self, slot_id: SlotId, word_ids: I)
    where
        I: IntoIterator<Item = WordId>,
    {
        let new_domain: BitSet = word_ids.into_iter().collect();

        let removed: Vec<WordId> = self.domains[slot_id].difference(&new_domain).collect();
        let added: Vec<WordId> = new_domain.difference(&self.domains[slot_id]).collect();

        for word_id in removed {
            self.remove(slot_id, word_id);
        }
        for word_id in added {
            self.insert(slot_id, word_id);
        }
    }

    /// Record the current state so that it can be returned to with `restore`.
    pub fn snapshot(&self) -> Checkpoint {
        Checkpoint {
            trail_len: self.trail.len(),
            generation: self.generation,
        }
    }

    /// Undo every change made since the checkpoint was taken.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        if checkpoint.generation != self.generation || checkpoint.trail_len > self.trail.len() {
            panic!("Restoring a checkpoint that is no longer valid: {:?}", checkpoint);
        }

        while self.trail.len() > checkpoint.trail_len {
            match self.trail.pop() {
                Some(TrailEntry::Removed(slot_id, word_id)) => {
                    self.domains[slot_id].insert(word_id);
                    self.sizes[slot_id] += 1;
                }
                Some(TrailEntry::Inserted(slot_id, word_id)) => {
                    self.domains[slot_id].remove(word_id);
                    self.sizes[slot_id] -= 1;
                }
                None => break,
            }
        }
    }

    /// Make every change so far permanent. Any checkpoint taken before this call becomes invalid.
    pub fn commit(&mut self) {
        self.trail.clear();
        self.generation += 1;
    }

    /// The number of changes that could currently be rolled back.
    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::domain_store::DomainStore;
    use crate::word_list::WordList;

    fn domains(store: &DomainStore) -> Vec<Vec<usize>> {
        (0..store.slot_count()).map(|slot_id| store.domain(slot_id).collect()).collect()
    }

    #[test]
    fn test_initialize_uses_whole_word_list() {
        let word_list = WordList::new(["cat", "dog", "horse"]);
        let store = DomainStore::initialize(&word_list, 2);

        assert_eq!(domains(&store), vec![vec![0, 1, 2], vec![0, 1, 2]]);
        assert_eq!(store.len(1), 3);
    }

    #[test]
    fn test_restrict_replaces_domain() {
        let word_list = WordList::new(["cat", "dog", "horse"]);
        let mut store = DomainStore::initialize(&word_list, 1);

        store.restrict(0, [2]);
        assert_eq!(domains(&store), vec![vec![2]]);
        assert_eq!(store.single_option(0), Some(2));

        store.restrict(0, [0, 1]);
        assert_eq!(domains(&store), vec![vec![0, 1]]);
        assert_eq!(store.len(0), 2);
        assert_eq!(store.single_option(0), None);
    }

    #[test]
    fn test_restore_undoes_nested_changes() {
        let word_list = WordList::new(["cat", "dog", "cow", "pig"]);
        let mut store = DomainStore::initialize(&word_list, 3);
        store.remove(2, 3);

        let before = domains(&store);
        let outer = store.snapshot();
        store.restrict(0, [1]);
        store.remove(1, 0);

        let middle = domains(&store);
        let inner = store.snapshot();
        store.remove(1, 1);
        store.restrict(2, [3]);
        assert_eq!(domains(&store)[2], vec![3]);

        store.restore(inner);
        assert_eq!(domains(&store), middle);

        store.restore(outer);
        assert_eq!(domains(&store), before);
        assert_eq!(store.len(0), 4);
        assert_eq!(store.len(2), 3);
    }

    #[test]
    fn test_remove_missing_word_is_not_recorded() {
        let word_list = WordList::new(["cat"]);
        let mut store = DomainStore::initialize(&word_list, 1);

        assert!(store.remove(0, 0));
        assert!(!store.remove(0, 0));
        assert_eq!(store.trail_len(), 1);
    }

    #[test]
    #[should_panic]
    fn test_commit_invalidates_checkpoints() {
        let word_list = WordList::new(["cat", "dog"]);
        let mut store = DomainStore::initialize(&word_list, 1);

        let checkpoint = store.snapshot();
        store.remove(0, 0);
        store.commit();
        store.restore(checkpoint);
    }
}
