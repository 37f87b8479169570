use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use crate::MAX_SLOT_LENGTH;

/// An identifier for a given letter or whatever, based on its index in the WordList's `glyphs`
/// field.
pub type GlyphId = usize;

/// An identifier for a given word, based on its index in the WordList's `words` field.
pub type WordId = usize;

/// A struct representing a word that can be chosen for a given slot.
#[derive(Debug, Clone)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// The length of the word in chars, which is what gets compared against slot lengths.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// The dictionary used for filling: an immutable, deduplicated set of words, each interned as a
/// `WordId` and broken down into glyphs.
pub struct WordList {
    pub glyphs: SmallVec<[char; crate::MAX_GLYPH_COUNT]>,
    pub words: Vec<Word>,
    word_ids_by_string: HashMap<String, WordId>,
}

impl Debug for WordList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordList")
            .field("glyphs", &self.glyphs)
            .field("words", &(["(", &self.words.len().to_string(), " entries)"].join("")))
            .finish()
    }
}

impl WordList {
    /// Build a word list from the given entries. Duplicate entries are collapsed, and glyph ids
    /// are assigned in order of first appearance so that the result doesn't depend on hashing.
    pub fn new<I, S>(entries: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut word_list = WordList {
            glyphs: SmallVec::new(),
            words: vec![],
            word_ids_by_string: HashMap::new(),
        };
        let mut glyph_ids_by_char: HashMap<char, GlyphId> = HashMap::new();

        for entry in entries {
            let entry = entry.as_ref();
            if word_list.word_ids_by_string.contains_key(entry) {
                continue;
            }

            let glyphs = entry
                .chars()
                .map(|c| {
                    *glyph_ids_by_char.entry(c).or_insert_with(|| {
                        word_list.glyphs.push(c);
                        word_list.glyphs.len() - 1
                    })
                })
                .collect();

            word_list.word_ids_by_string.insert(entry.to_string(), word_list.words.len());
            word_list.words.push(Word { string: entry.to_string(), glyphs });
        }

        word_list
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    /// Look up the id of a word by its string, if it's in the list.
    pub fn word_id(&self, string: &str) -> Option<WordId> {
        self.word_ids_by_string.get(string).copied()
    }
}

impl<S: AsRef<str>> FromIterator<S> for WordList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        WordList::new(iter)
    }
}
