//! Constraint propagation for the fill process. The unary constraint (every word must fit its
//! slot's length) is handled once by `enforce_node_consistency`; the binary constraints (crossing
//! slots must agree on the shared letter) are handled by the AC-3 implementation in `ac3`, which
//! keeps revising arcs until no more eliminations are possible or some slot runs out of options.

use bit_set::BitSet;
use log::trace;
use std::collections::VecDeque;

use crate::domain_store::DomainStore;
use crate::grid_config::{GridConfig, SlotId};
use crate::util::{build_glyph_set, glyph_at};
use crate::word_list::{WordId, WordList};

/// An ordered pair of crossing slots `(x, y)`: revising it makes `x` consistent with `y`.
pub type Arc = (SlotId, SlotId);

/// Result from a successful call to `ac3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArcConsistencySuccess {
    /// How many arcs were revised.
    pub revisions: usize,
    /// How many words were eliminated in total.
    pub removals: usize,
}

/// Result from a failed call to `ac3`, naming the slot whose domain was wiped out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub emptied_slot_id: SlotId,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Remove every option whose length doesn't match its slot. Returns the number of words removed.
pub fn enforce_node_consistency(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut DomainStore,
) -> usize {
    let mut removed = 0;

    for slot_config in &config.slot_configs {
        let to_remove: Vec<WordId> = domains
            .domain(slot_config.id)
            .filter(|&word_id| word_list.word(word_id).len() != slot_config.length())
            .collect();

        for word_id in to_remove {
            if domains.remove(slot_config.id, word_id) {
                removed += 1;
            }
        }
    }

    removed
}

/// Remove every option from `slot_id` that doesn't share a letter with at least one option for
/// `other_slot_id` at their crossing, returning how many were removed.
fn revise_counting(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut DomainStore,
    slot_id: SlotId,
    other_slot_id: SlotId,
) -> usize {
    // If there's no overlap, there's no constraint.
    let Some((cell, other_slot_cell)) = config.overlap(slot_id, other_slot_id) else {
        return 0;
    };

    // Rather than comparing every pair of words, collect the letters the other slot can still put
    // in the shared cell and check each of our options against that.
    let supported_glyphs = build_glyph_set(word_list, domains.domain(other_slot_id), other_slot_cell);

    let to_remove: Vec<WordId> = domains
        .domain(slot_id)
        .filter(|&word_id| {
            glyph_at(word_list, word_id, cell)
                .map(|glyph| !supported_glyphs.contains(glyph))
                .unwrap_or(true)
        })
        .collect();

    for &word_id in &to_remove {
        domains.remove(slot_id, word_id);
    }

    to_remove.len()
}

/// Make `slot_id` arc-consistent with `other_slot_id`. Returns whether anything was removed.
pub fn revise(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut DomainStore,
    slot_id: SlotId,
    other_slot_id: SlotId,
) -> bool {
    revise_counting(config, word_list, domains, slot_id, other_slot_id) > 0
}

/// Every ordered pair of crossing slots, in both directions.
pub fn all_arcs(config: &GridConfig) -> Vec<Arc> {
    (0..config.slot_count())
        .flat_map(move |slot_id| {
            config.neighbors(slot_id).map(move |other_slot_id| (slot_id, other_slot_id))
        })
        .collect()
}

/// The arcs pointing at `slot_id` from each of its neighbors. If the grid was arc-consistent
/// before `slot_id`'s domain shrank, these are the only arcs that can need revising.
pub fn arcs_into(config: &GridConfig, slot_id: SlotId) -> Vec<Arc> {
    config.neighbors(slot_id).map(|other_slot_id| (other_slot_id, slot_id)).collect()
}

/// Queue of arcs waiting to be revised. An arc that's already waiting isn't added twice.
struct ArcQueue {
    queue: VecDeque<Arc>,
    queued: BitSet,
    slot_count: usize,
}

impl ArcQueue {
    fn new(slot_count: usize) -> ArcQueue {
        ArcQueue {
            queue: VecDeque::new(),
            queued: BitSet::with_capacity(slot_count * slot_count),
            slot_count,
        }
    }

    fn enqueue(&mut self, arc: Arc) {
        if self.queued.insert(arc.0 * self.slot_count + arc.1) {
            self.queue.push_back(arc);
        }
    }

    fn pop_front(&mut self) -> Option<Arc> {
        let arc = self.queue.pop_front()?;
        self.queued.remove(arc.0 * self.slot_count + arc.1);
        Some(arc)
    }
}

/// Run AC-3 starting from the given arcs, or from every arc in the grid if `arcs` is `None`.
pub fn ac3(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut DomainStore,
    arcs: Option<&[Arc]>,
) -> ArcConsistencyResult {
    let mut queue = ArcQueue::new(config.slot_count());
    match arcs {
        Some(arcs) => arcs.iter().for_each(|&arc| queue.enqueue(arc)),
        None => all_arcs(config).into_iter().for_each(|arc| queue.enqueue(arc)),
    }

    let mut success = ArcConsistencySuccess::default();

    while let Some((slot_id, other_slot_id)) = queue.pop_front() {
        success.revisions += 1;

        let removed = revise_counting(config, word_list, domains, slot_id, other_slot_id);
        if removed == 0 {
            continue;
        }
        success.removals += removed;

        if domains.is_empty(slot_id) {
            trace!("Arc consistency emptied slot {} while revising against {}", slot_id, other_slot_id);
            return Err(ArcConsistencyFailure { emptied_slot_id: slot_id });
        }

        // Shrinking this slot may have taken away the only support some of its other neighbors
        // had, so they need to be checked again.
        for neighbor_id in config.neighbors(slot_id) {
            if neighbor_id != other_slot_id {
                queue.enqueue((neighbor_id, slot_id));
            }
        }
    }

    Ok(success)
}
