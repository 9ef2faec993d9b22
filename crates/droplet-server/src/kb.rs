//! Matching chat messages against a chunk store
//!
//! Chat handlers for knowledge-base agents pick the first chunk whose text or
//! brand contains any sufficiently long word of the message. First match in
//! file order wins; there is no ranking.

use droplet_store::{ChunkStore, DrinkChunk};

/// Words shorter than this are too generic to search with ("is", "the", ...).
const MIN_WORD_LEN: usize = 4;

pub fn first_match<'a>(store: &'a ChunkStore, message: &str) -> Option<&'a DrinkChunk> {
    for word in message
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.len() >= MIN_WORD_LEN)
    {
        if let Some(chunk) = store.search(word).into_iter().next() {
            return Some(chunk);
        }
    }
    None
}
