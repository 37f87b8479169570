//! This module implements grid-filling as a depth-first backtracking search. Slots are chosen with
//! the minimum-remaining-values heuristic (breaking ties by degree), words are tried in
//! least-constraining-value order, and every tentative choice is followed by a round of arc
//! consistency so that dead ends are detected before we recurse into them.

use bit_set::BitSet;
use instant::{Duration, Instant};
use log::trace;
use std::cmp::Reverse;

use crate::arc_consistency::{ac3, arcs_into};
use crate::domain_store::DomainStore;
use crate::grid_config::{GridConfig, SlotId};
use crate::util::build_glyph_counts;
use crate::word_list::{WordId, WordList};

/// How many states should we visit between checks of whether we've passed our deadline?
pub const INTERRUPT_FREQUENCY: usize = 10;

/// How much of the grid should be re-checked after each tentative choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Inference {
    /// Run AC-3 over every arc in the grid.
    #[default]
    Global,

    /// Run AC-3 starting only from the arcs that point at the slot we just chose. This reaches the
    /// same fixpoint as `Global`, since the grid was already arc-consistent before the choice.
    Incremental,
}

/// Settings controlling a fill attempt.
#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    pub inference: Inference,

    /// Give up after visiting this many search states.
    pub max_states: Option<usize>,

    /// Give up once this much time has passed since the fill started.
    pub timeout: Option<Duration>,
}

impl FillOptions {
    pub fn with_inference(mut self, inference: Inference) -> FillOptions {
        self.inference = inference;
        self
    }

    pub fn with_max_states(mut self, max_states: usize) -> FillOptions {
        self.max_states = Some(max_states);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> FillOptions {
        self.timeout = Some(timeout);
        self
    }
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: usize,
    pub backtracks: usize,
    pub wipeouts: usize,
    pub duration: Duration,
}

/// A struct recording a slot assignment made during the filling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// The choices made so far along the current search path, at most one per slot.
#[derive(Debug, Clone)]
pub struct Assignment {
    word_ids_by_slot: Vec<Option<WordId>>,
    used_word_ids: BitSet,
    len: usize,
}

impl Assignment {
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            word_ids_by_slot: vec![None; slot_count],
            used_word_ids: BitSet::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_complete(&self) -> bool {
        self.len == self.word_ids_by_slot.len()
    }

    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.word_ids_by_slot[slot_id]
    }

    pub fn contains_slot(&self, slot_id: SlotId) -> bool {
        self.word_ids_by_slot[slot_id].is_some()
    }

    /// Is this word already in use by some slot?
    pub fn uses_word(&self, word_id: WordId) -> bool {
        self.used_word_ids.contains(word_id)
    }

    /// Assign a word to a slot, replacing any word it previously had.
    pub fn insert(&mut self, slot_id: SlotId, word_id: WordId) {
        if let Some(previous) = self.word_ids_by_slot[slot_id].replace(word_id) {
            self.used_word_ids.remove(previous);
        } else {
            self.len += 1;
        }
        self.used_word_ids.insert(word_id);
    }

    pub fn remove(&mut self, slot_id: SlotId) -> Option<WordId> {
        let previous = self.word_ids_by_slot[slot_id].take()?;
        self.used_word_ids.remove(previous);
        self.len -= 1;
        Some(previous)
    }

    /// The assigned slots, in slot id order.
    pub fn choices(&self) -> impl Iterator<Item = Choice> + '_ {
        self.word_ids_by_slot
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| Choice { slot_id, word_id }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FillFailure {
    #[error("no fill exists for this grid and word list")]
    HardFailure,

    #[error("timed out before finding a fill")]
    Timeout,

    #[error("gave up after visiting {0} states")]
    ExceededStateLimit(usize),
}

/// The live state of a single search: the grid and word list being filled, the domains being
/// narrowed, and the bookkeeping needed to enforce the options.
pub struct Search<'a> {
    config: &'a GridConfig,
    word_list: &'a WordList,
    domains: &'a mut DomainStore,
    options: &'a FillOptions,
    deadline: Option<Instant>,
    pub statistics: Statistics,
}

impl<'a> Search<'a> {
    /// Set up a search. `domains` is expected to be node- and arc-consistent already.
    pub fn new(
        config: &'a GridConfig,
        word_list: &'a WordList,
        domains: &'a mut DomainStore,
        options: &'a FillOptions,
        start: Instant,
    ) -> Search<'a> {
        Search {
            config,
            word_list,
            domains,
            options,
            deadline: options.timeout.map(|timeout| start + timeout),
            statistics: Statistics::default(),
        }
    }

    /// Choose the unassigned slot with the fewest remaining options, preferring slots with more
    /// crossings when there's a tie.
    pub fn select_unassigned_slot(&self, assignment: &Assignment) -> Option<SlotId> {
        (0..self.config.slot_count())
            .filter(|&slot_id| !assignment.contains_slot(slot_id))
            .min_by_key(|&slot_id| (self.domains.len(slot_id), Reverse(self.config.degree(slot_id))))
    }

    /// Return the options for a slot, ordered so that the ones ruling out the fewest options for
    /// unassigned crossing slots come first.
    pub fn order_domain_values(&self, slot_id: SlotId, assignment: &Assignment) -> Vec<WordId> {
        // For each unfilled crossing, count how many of its options put each glyph in the shared
        // cell. A candidate eliminates every option that doesn't match its own glyph there.
        let crossing_counts: Vec<(usize, usize, Vec<u32>)> = self
            .config
            .crossings(slot_id)
            .iter()
            .filter(|crossing| !assignment.contains_slot(crossing.other_slot_id))
            .map(|crossing| {
                let counts = build_glyph_counts(
                    self.word_list,
                    self.domains.domain(crossing.other_slot_id),
                    crossing.other_slot_cell,
                );
                (crossing.cell, self.domains.len(crossing.other_slot_id), counts)
            })
            .collect();

        let mut options: Vec<WordId> = self.domains.domain(slot_id).collect();

        options.sort_by_cached_key(|&word_id| {
            let word = self.word_list.word(word_id);

            crossing_counts
                .iter()
                .map(|(cell, option_count, counts)| {
                    let compatible = word.glyphs.get(*cell).map(|&glyph| counts[glyph]).unwrap_or(0);
                    option_count - compatible as usize
                })
                .sum::<usize>()
        });

        options
    }

    /// Could this word be added to the assignment for this slot without breaking any rules?
    pub fn is_consistent(&self, assignment: &Assignment, slot_id: SlotId, word_id: WordId) -> bool {
        let word = self.word_list.word(word_id);

        if assignment.get(slot_id) != Some(word_id) && assignment.uses_word(word_id) {
            return false;
        }

        if word.len() != self.config.slot(slot_id).length {
            return false;
        }

        self.config.crossings(slot_id).iter().all(|crossing| {
            match assignment.get(crossing.other_slot_id) {
                Some(other_word_id) => {
                    let other_word = self.word_list.word(other_word_id);
                    word.glyphs.get(crossing.cell) == other_word.glyphs.get(crossing.other_slot_cell)
                }
                None => true,
            }
        })
    }

    /// After narrowing `slot_id` to a single word, bring the rest of the grid back into
    /// arc consistency. Returns false if some slot ran out of options.
    fn propagate_choice(&mut self, slot_id: SlotId) -> bool {
        let result = match self.options.inference {
            Inference::Global => ac3(self.config, self.word_list, self.domains, None),
            Inference::Incremental => {
                let arcs = arcs_into(self.config, slot_id);
                ac3(self.config, self.word_list, self.domains, Some(&arcs))
            }
        };

        result.is_ok()
    }

    fn check_limits(&self) -> Result<(), FillFailure> {
        if let Some(max_states) = self.options.max_states {
            if self.statistics.states >= max_states {
                return Err(FillFailure::ExceededStateLimit(self.statistics.states));
            }
        }

        if self.statistics.states % INTERRUPT_FREQUENCY == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(FillFailure::Timeout);
                }
            }
        }

        Ok(())
    }

    /// Try to extend the assignment into a complete one. Returns `Ok(true)` with the assignment
    /// complete if we succeeded, or `Ok(false)` with the assignment and domains back in the state
    /// they were in when we were called if there's no way to do it.
    pub fn backtrack(&mut self, assignment: &mut Assignment) -> Result<bool, FillFailure> {
        if assignment.is_complete() {
            return Ok(true);
        }

        self.check_limits()?;
        self.statistics.states += 1;

        let Some(slot_id) = self.select_unassigned_slot(assignment) else {
            return Ok(true);
        };

        for word_id in self.order_domain_values(slot_id, assignment) {
            if !self.is_consistent(assignment, slot_id, word_id) {
                continue;
            }

            let checkpoint = self.domains.snapshot();
            self.domains.restrict(slot_id, [word_id]);

            if self.propagate_choice(slot_id) {
                assignment.insert(slot_id, word_id);
                if self.backtrack(assignment)? {
                    return Ok(true);
                }
                assignment.remove(slot_id);
                self.statistics.backtracks += 1;
                trace!("Backtracking from word {} in slot {}", word_id, slot_id);
            } else {
                self.statistics.wipeouts += 1;
            }

            self.domains.restore(checkpoint);
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use instant::Instant;

    use crate::arc_consistency::{ac3, enforce_node_consistency};
    use crate::backtracking_search::{Assignment, FillOptions, Search};
    use crate::domain_store::DomainStore;
    use crate::grid_config::{GridConfig, Slot};
    use crate::word_list::WordList;

    fn prepared_domains(config: &GridConfig, word_list: &WordList) -> DomainStore {
        let mut domains = DomainStore::initialize(word_list, config.slot_count());
        enforce_node_consistency(config, word_list, &mut domains);
        ac3(config, word_list, &mut domains, None).unwrap();
        domains.commit();
        domains
    }

    #[test]
    fn test_assignment_tracks_used_words() {
        let mut assignment = Assignment::new(3);

        assignment.insert(0, 5);
        assignment.insert(2, 7);
        assert_eq!(assignment.len(), 2);
        assert!(assignment.uses_word(5));

        assignment.insert(0, 6);
        assert_eq!(assignment.len(), 2);
        assert!(!assignment.uses_word(5));
        assert!(assignment.uses_word(6));

        assert_eq!(assignment.remove(2), Some(7));
        assert_eq!(assignment.remove(2), None);
        assert_eq!(assignment.choices().map(|choice| choice.slot_id).collect::<Vec<_>>(), vec![0]);
        assert!(!assignment.is_complete());
    }

    #[test]
    fn test_select_prefers_fewest_options_then_degree() {
        // The long across slot crosses both down slots, so it has the highest degree.
        let config = GridConfig::from_slots(&[
            Slot::down(0, 0, 3),
            Slot::across(0, 0, 3),
            Slot::down(0, 2, 3),
        ])
        .unwrap();
        let word_list = WordList::new(["aaa", "aab", "baa", "bab"]);
        let mut domains = prepared_domains(&config, &word_list);
        let options = FillOptions::default();

        {
            let search = Search::new(&config, &word_list, &mut domains, &options, Instant::now());
            let assignment = Assignment::new(config.slot_count());
            assert_eq!(search.select_unassigned_slot(&assignment), Some(1));
        }

        domains.restrict(2, [0, 1]);
        let search = Search::new(&config, &word_list, &mut domains, &options, Instant::now());
        let mut assignment = Assignment::new(config.slot_count());
        assert_eq!(search.select_unassigned_slot(&assignment), Some(2));

        assignment.insert(2, 0);
        assert_eq!(search.select_unassigned_slot(&assignment), Some(1));
    }

    #[test]
    fn test_least_constraining_value_comes_first() {
        let config = GridConfig::from_slots(&[Slot::across(0, 0, 3), Slot::down(0, 0, 3)]).unwrap();
        let word_list = WordList::new(["xyz", "cat", "cow", "cub", "xod"]);
        let mut domains = prepared_domains(&config, &word_list);
        let options = FillOptions::default();
        let search = Search::new(&config, &word_list, &mut domains, &options, Instant::now());
        let assignment = Assignment::new(config.slot_count());

        let ordered = search.order_domain_values(0, &assignment);
        let strings: Vec<&str> = ordered.iter().map(|&word_id| word_list.word(word_id).string.as_str()).collect();

        // Words starting with "c" leave three options for the down slot; words starting with "x"
        // leave only two.
        assert_eq!(strings, vec!["cat", "cow", "cub", "xyz", "xod"]);
    }

    #[test]
    fn test_consistency_check() {
        let config = GridConfig::from_slots(&[Slot::across(0, 0, 3), Slot::down(0, 0, 3)]).unwrap();
        let word_list = WordList::new(["cat", "cow", "dog", "ox"]);
        let mut domains = DomainStore::initialize(&word_list, config.slot_count());
        let options = FillOptions::default();
        let search = Search::new(&config, &word_list, &mut domains, &options, Instant::now());
        let mut assignment = Assignment::new(config.slot_count());
        assignment.insert(0, word_list.word_id("cat").unwrap());

        // Already used by the across slot.
        assert!(!search.is_consistent(&assignment, 1, word_list.word_id("cat").unwrap()));
        // Wrong length.
        assert!(!search.is_consistent(&assignment, 1, word_list.word_id("ox").unwrap()));
        // Disagrees at the shared cell.
        assert!(!search.is_consistent(&assignment, 1, word_list.word_id("dog").unwrap()));
        assert!(search.is_consistent(&assignment, 1, word_list.word_id("cow").unwrap()));
    }

    #[test]
    fn test_backtrack_restores_domains_on_failure() {
        // Every word for the across slot is compatible with the down slot on its own, but the
        // only candidates are identical, so the search has to fail after trying each one.
        let config = GridConfig::from_slots(&[Slot::across(0, 0, 3), Slot::down(0, 0, 3)]).unwrap();
        let word_list = WordList::new(["cat"]);
        let mut domains = prepared_domains(&config, &word_list);
        let before: Vec<Vec<usize>> = (0..2).map(|slot_id| domains.domain(slot_id).collect()).collect();
        let options = FillOptions::default();

        let found = {
            let mut search = Search::new(&config, &word_list, &mut domains, &options, Instant::now());
            let mut assignment = Assignment::new(config.slot_count());
            let found = search.backtrack(&mut assignment).unwrap();
            assert!(assignment.is_empty());
            found
        };

        assert!(!found);
        let after: Vec<Vec<usize>> = (0..2).map(|slot_id| domains.domain(slot_id).collect()).collect();
        assert_eq!(before, after);
        assert_eq!(domains.trail_len(), 0);
    }
}
