use bit_set::BitSet;

use crate::word_list::{GlyphId, WordId, WordList};

/// For a given cell position, how many of a set of words place each glyph there? Indexed by
/// `GlyphId`. Words too short to reach the cell aren't counted.
pub type GlyphCounts = Vec<u32>;

/// Count the glyphs appearing at `cell_idx` across the given words.
pub fn build_glyph_counts<I>(word_list: &WordList, word_ids: I, cell_idx: usize) -> GlyphCounts
where
    I: IntoIterator<Item = WordId>,
{
    let mut result: GlyphCounts = vec![0; word_list.glyph_count()];

    for word_id in word_ids {
        if let Some(&glyph) = word_list.word(word_id).glyphs.get(cell_idx) {
            result[glyph] += 1;
        }
    }

    result
}

/// The set of glyphs appearing at `cell_idx` in at least one of the given words.
pub fn build_glyph_set<I>(word_list: &WordList, word_ids: I, cell_idx: usize) -> BitSet
where
    I: IntoIterator<Item = WordId>,
{
    let mut result = BitSet::with_capacity(word_list.glyph_count());

    for word_id in word_ids {
        if let Some(&glyph) = word_list.word(word_id).glyphs.get(cell_idx) {
            result.insert(glyph);
        }
    }

    result
}

/// The glyph a word places at a given cell, if it's long enough to reach it.
#[inline]
pub fn glyph_at(word_list: &WordList, word_id: WordId, cell_idx: usize) -> Option<GlyphId> {
    word_list.word(word_id).glyphs.get(cell_idx).copied()
}
