//! The static shape of a puzzle: which slots exist, where they sit, and how they cross each other.
//! Everything here is computed once up front and never changes during filling.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

/// An identifier for a given slot, based on its index in the GridConfig's `slot_configs` field.
pub type SlotId = usize;

/// Zero-indexed row and column for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// A run of cells requiring one word. Two slots with the same position, length, and direction are
/// the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub row: usize,
    pub column: usize,
    pub length: usize,
    pub direction: Direction,
}

impl Slot {
    pub fn new(row: usize, column: usize, length: usize, direction: Direction) -> Slot {
        Slot { row, column, length, direction }
    }

    pub fn across(row: usize, column: usize, length: usize) -> Slot {
        Slot::new(row, column, length, Direction::Across)
    }

    pub fn down(row: usize, column: usize, length: usize) -> Slot {
        Slot::new(row, column, length, Direction::Down)
    }

    /// Generate the coords for each cell of this slot.
    pub fn cell_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(move |cell_idx| match self.direction {
            Direction::Across => (self.row, self.column + cell_idx),
            Direction::Down => (self.row + cell_idx, self.column),
        })
    }
}

/// A struct representing a crossing between one slot and another, referencing the cell in this
/// slot, the other slot's id, and the location of the intersection within the other slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub cell: usize,
    pub other_slot_id: SlotId,
    pub other_slot_cell: usize,
}

/// A struct representing the aspects of a slot in the grid that are static during filling.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub id: SlotId,
    pub slot: Slot,
    pub crossings: SmallVec<[Crossing; 8]>,
}

impl SlotConfig {
    pub fn length(&self) -> usize {
        self.slot.length
    }
}

/// Problems with a puzzle structure that would make any fill for it meaningless.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridConfigError {
    #[error("slot {0:?} has length 0")]
    EmptySlot(Slot),

    #[error("slot {0:?} appears more than once")]
    DuplicateSlot(Slot),

    #[error("overlap references unknown slot {0:?}")]
    UnknownSlot(Slot),

    #[error("slot {0:?} can't overlap itself")]
    SelfOverlap(Slot),

    #[error("overlap index {index} is out of bounds for slot {slot:?} of length {length}")]
    OverlapOutOfBounds { slot: Slot, index: usize, length: usize },

    #[error("slots {first:?} and {second:?} have conflicting overlaps")]
    ConflictingOverlap { first: Slot, second: Slot },

    #[error("slots {first:?} and {second:?} run in the same direction but share cell {cell:?}")]
    ParallelSlotsShareCell { first: Slot, second: Slot, cell: GridCoord },

    #[error("more than two slots cross at cell {0:?}")]
    TooManySlotsInCell(GridCoord),
}

/// A struct representing the aspects of a grid that are static during filling.
pub struct GridConfig {
    pub slot_configs: Vec<SlotConfig>,
    slot_ids_by_slot: HashMap<Slot, SlotId>,
}

impl Debug for GridConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridConfig")
            .field("slot_configs", &self.slot_configs)
            .finish()
    }
}

impl GridConfig {
    /// Set up slot configs with no crossings yet, checking for empty and duplicate slots.
    fn build_slot_configs(slots: &[Slot]) -> Result<GridConfig, GridConfigError> {
        let mut slot_ids_by_slot: HashMap<Slot, SlotId> = HashMap::with_capacity(slots.len());
        let mut slot_configs: Vec<SlotConfig> = Vec::with_capacity(slots.len());

        for &slot in slots {
            if slot.length == 0 {
                return Err(GridConfigError::EmptySlot(slot));
            }
            if slot_ids_by_slot.insert(slot, slot_configs.len()).is_some() {
                return Err(GridConfigError::DuplicateSlot(slot));
            }
            slot_configs.push(SlotConfig {
                id: slot_configs.len(),
                slot,
                crossings: SmallVec::new(),
            });
        }

        Ok(GridConfig { slot_configs, slot_ids_by_slot })
    }

    /// Record the crossing in both directions, unless it's already there. A different crossing
    /// for the same pair of slots is an error.
    fn add_crossing(
        &mut self,
        slot_id: SlotId,
        cell: usize,
        other_slot_id: SlotId,
        other_slot_cell: usize,
    ) -> Result<(), GridConfigError> {
        if let Some(existing) = self.overlap(slot_id, other_slot_id) {
            if existing == (cell, other_slot_cell) {
                return Ok(());
            }
            return Err(GridConfigError::ConflictingOverlap {
                first: self.slot(slot_id),
                second: self.slot(other_slot_id),
            });
        }

        self.slot_configs[slot_id].crossings.push(Crossing {
            cell,
            other_slot_id,
            other_slot_cell,
        });
        self.slot_configs[other_slot_id].crossings.push(Crossing {
            cell: other_slot_cell,
            other_slot_id: slot_id,
            other_slot_cell: cell,
        });

        Ok(())
    }

    /// Keep neighbor iteration order independent of the order crossings were discovered in.
    fn sort_crossings(&mut self) {
        for slot_config in &mut self.slot_configs {
            slot_config.crossings.sort_by_key(|crossing| crossing.other_slot_id);
        }
    }

    /// Generate a GridConfig for the given slots, working out crossings from their positions.
    pub fn from_slots(slots: &[Slot]) -> Result<GridConfig, GridConfigError> {
        let mut config = GridConfig::build_slot_configs(slots)?;

        // Build a map from cell location to (slot id, cell index within slot), which we can then
        // use to calculate crossings.
        let mut entries_by_loc: HashMap<GridCoord, SmallVec<[(SlotId, usize); 2]>> =
            HashMap::new();
        for slot_config in &config.slot_configs {
            for (cell_idx, loc) in slot_config.slot.cell_coords().enumerate() {
                entries_by_loc.entry(loc).or_default().push((slot_config.id, cell_idx));
            }
        }

        let mut shared_cells: Vec<(GridCoord, SmallVec<[(SlotId, usize); 2]>)> = entries_by_loc
            .into_iter()
            .filter(|(_, entries)| entries.len() > 1)
            .collect();
        shared_cells.sort_by_key(|&(loc, _)| loc);

        for (loc, entries) in shared_cells {
            if entries.len() > 2 {
                return Err(GridConfigError::TooManySlotsInCell(loc));
            }

            let (slot_id, cell) = entries[0];
            let (other_slot_id, other_slot_cell) = entries[1];
            let (first, second) = (config.slot(slot_id), config.slot(other_slot_id));
            if first.direction == second.direction {
                return Err(GridConfigError::ParallelSlotsShareCell { first, second, cell: loc });
            }

            config.add_crossing(slot_id, cell, other_slot_id, other_slot_cell)?;
        }

        config.sort_crossings();
        Ok(config)
    }

    /// Generate a GridConfig from slots and an externally computed list of overlaps, each given as
    /// `(slot, other_slot, index_in_slot, index_in_other_slot)`. Overlaps may be listed in either
    /// orientation, or both.
    pub fn with_overlaps<I>(slots: &[Slot], overlaps: I) -> Result<GridConfig, GridConfigError>
    where
        I: IntoIterator<Item = (Slot, Slot, usize, usize)>,
    {
        let mut config = GridConfig::build_slot_configs(slots)?;

        for (slot, other_slot, cell, other_slot_cell) in overlaps {
            let slot_id = config.slot_id(&slot).ok_or(GridConfigError::UnknownSlot(slot))?;
            let other_slot_id = config
                .slot_id(&other_slot)
                .ok_or(GridConfigError::UnknownSlot(other_slot))?;

            if slot_id == other_slot_id {
                return Err(GridConfigError::SelfOverlap(slot));
            }
            for (slot, index) in [(slot, cell), (other_slot, other_slot_cell)] {
                if index >= slot.length {
                    return Err(GridConfigError::OverlapOutOfBounds {
                        slot,
                        index,
                        length: slot.length,
                    });
                }
            }

            config.add_crossing(slot_id, cell, other_slot_id, other_slot_cell)?;
        }

        config.sort_crossings();
        Ok(config)
    }

    /// Generate a GridConfig representing a square grid with no blocks.
    pub fn square(size: usize) -> Result<GridConfig, GridConfigError> {
        let slots: Vec<Slot> = (0..size)
            .flat_map(|idx| [Slot::across(idx, 0, size), Slot::down(0, idx, size)])
            .collect();

        GridConfig::from_slots(&slots)
    }

    pub fn slot_count(&self) -> usize {
        self.slot_configs.len()
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.slot_configs.iter().map(|slot_config| &slot_config.slot)
    }

    pub fn slot(&self, slot_id: SlotId) -> Slot {
        self.slot_configs[slot_id].slot
    }

    pub fn slot_id(&self, slot: &Slot) -> Option<SlotId> {
        self.slot_ids_by_slot.get(slot).copied()
    }

    pub fn crossings(&self, slot_id: SlotId) -> &[Crossing] {
        &self.slot_configs[slot_id].crossings
    }

    /// The ids of every slot sharing a cell with the given one.
    pub fn neighbors(&self, slot_id: SlotId) -> impl Iterator<Item = SlotId> + '_ {
        self.slot_configs[slot_id]
            .crossings
            .iter()
            .map(|crossing| crossing.other_slot_id)
    }

    pub fn degree(&self, slot_id: SlotId) -> usize {
        self.slot_configs[slot_id].crossings.len()
    }

    /// If the two slots cross, return the index of the shared cell within each of them.
    pub fn overlap(&self, slot_id: SlotId, other_slot_id: SlotId) -> Option<(usize, usize)> {
        self.slot_configs[slot_id]
            .crossings
            .iter()
            .find(|crossing| crossing.other_slot_id == other_slot_id)
            .map(|crossing| (crossing.cell, crossing.other_slot_cell))
    }
}
