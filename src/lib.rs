pub mod arc_consistency;
pub mod backtracking_search;
pub mod domain_store;
pub mod grid_config;
pub mod util;
pub mod word_list;

use instant::Instant;
use log::debug;
use std::collections::BTreeMap;

use crate::arc_consistency::{ac3, enforce_node_consistency};
use crate::backtracking_search::{Assignment, Search};
use crate::domain_store::DomainStore;
use crate::grid_config::{GridConfig, Slot};
use crate::word_list::{WordId, WordList};

pub use crate::backtracking_search::{FillFailure, FillOptions, Inference, Statistics};
pub use crate::grid_config::{Direction, GridConfigError};

/// The expected maximum number of distinct characters/rebuses/whatever appearing in a grid.
pub const MAX_GLYPH_COUNT: usize = 256;

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

/// A struct representing the results of a fill operation.
#[derive(Debug, Clone)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

impl FillSuccess {
    /// The chosen word for every slot.
    pub fn entries<'a>(&self, config: &GridConfig, word_list: &'a WordList) -> BTreeMap<Slot, &'a str> {
        self.assignment
            .choices()
            .map(|choice| (config.slot(choice.slot_id), word_list.word(choice.word_id).string.as_str()))
            .collect()
    }
}

/// Build a domain store for the grid and apply the unary and binary constraints that hold
/// regardless of any choices. Returns `None` if that alone proves the grid can't be filled.
fn build_consistent_domains(config: &GridConfig, word_list: &WordList) -> Option<DomainStore> {
    let mut domains = DomainStore::initialize(word_list, config.slot_count());

    let removed = enforce_node_consistency(config, word_list, &mut domains);
    debug!(
        "Node consistency removed {} options across {} slots ({} words in list)",
        removed,
        config.slot_count(),
        word_list.len(),
    );

    if let Some(slot_id) = (0..config.slot_count()).find(|&slot_id| domains.is_empty(slot_id)) {
        debug!("No words of the right length for slot {:?}", config.slot(slot_id));
        return None;
    }

    match ac3(config, word_list, &mut domains, None) {
        Ok(success) => {
            debug!(
                "Initial arc consistency removed {} options in {} revisions",
                success.removals, success.revisions,
            );
        }
        Err(failure) => {
            debug!(
                "Initial arc consistency wiped out slot {:?}",
                config.slot(failure.emptied_slot_id),
            );
            return None;
        }
    }

    // Nothing removed so far depends on a choice, so it never needs to be undone.
    domains.commit();
    Some(domains)
}

/// Return the options for each slot that survive node consistency and a global arc consistency
/// pass, or `None` if the grid is unfillable.
pub fn eliminate_options(config: &GridConfig, word_list: &WordList) -> Option<Vec<Vec<WordId>>> {
    let domains = build_consistent_domains(config, word_list)?;

    Some((0..config.slot_count()).map(|slot_id| domains.domain(slot_id).collect()).collect())
}

/// Search for a valid fill for the given grid.
pub fn find_fill(config: &GridConfig, word_list: &WordList) -> Result<FillSuccess, FillFailure> {
    find_fill_with_options(config, word_list, &FillOptions::default())
}

/// Search for a valid fill for the given grid, subject to the given options.
pub fn find_fill_with_options(
    config: &GridConfig,
    word_list: &WordList,
    options: &FillOptions,
) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();

    let Some(mut domains) = build_consistent_domains(config, word_list) else {
        return Err(FillFailure::HardFailure);
    };

    let mut search = Search::new(config, word_list, &mut domains, options, start);
    let mut assignment = Assignment::new(config.slot_count());
    let outcome = search.backtrack(&mut assignment);

    let mut statistics = search.statistics.clone();
    statistics.duration = start.elapsed();

    match outcome {
        Ok(true) => {
            debug!("Found a fill: {:?}", statistics);
            Ok(FillSuccess { statistics, assignment })
        }
        Ok(false) => {
            debug!("Search exhausted without a fill: {:?}", statistics);
            Err(FillFailure::HardFailure)
        }
        Err(failure) => {
            debug!("Search stopped early ({}): {:?}", failure, statistics);
            Err(failure)
        }
    }
}
