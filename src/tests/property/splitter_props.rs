//! Property-based tests for the document splitter

use proptest::prelude::*;

use crate::core::preprocess::{DocumentSplitter, SplitBy, SplitterConfig};

fn arb_words() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z]{1,8}", 0..60)
}

fn arb_window() -> impl Strategy<Value = (usize, usize)> {
    (1usize..12).prop_flat_map(|length| (Just(length), 0..length))
}

fn word_splitter(length: usize, overlap: usize) -> DocumentSplitter {
    DocumentSplitter::new(SplitterConfig {
        split_by: SplitBy::Word,
        split_length: length,
        split_overlap: overlap,
        ..SplitterConfig::default()
    })
    .expect("valid window")
}

proptest! {
    /// Property: Chunks respect the window length and cover every word in order
    #[test]
    fn prop_chunks_cover_input((length, overlap) in arb_window(), words in arb_words()) {
        let splitter = word_splitter(length, overlap);
        let chunks = splitter.split_text(&words.join("  "));

        if words.is_empty() {
            prop_assert!(chunks.is_empty());
            return Ok(());
        }

        let mut rebuilt: Vec<String> = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let units: Vec<&str> = chunk.split(' ').collect();
            prop_assert!(units.len() <= length);
            let fresh = if i == 0 { 0 } else { overlap.min(units.len()) };
            rebuilt.extend(units[fresh..].iter().map(|s| s.to_string()));
            if i + 1 < chunks.len() {
                prop_assert_eq!(units.len(), length);
            }
        }
        prop_assert_eq!(rebuilt, words);
    }

    /// Property: Consecutive chunks share exactly `overlap` words
    #[test]
    fn prop_overlap_is_shared((length, overlap) in arb_window(), words in arb_words()) {
        let splitter = word_splitter(length, overlap);
        let chunks = splitter.split_text(&words.join(" "));

        for pair in chunks.windows(2) {
            let prev: Vec<&str> = pair[0].split(' ').collect();
            let next: Vec<&str> = pair[1].split(' ').collect();
            prop_assert_eq!(&prev[prev.len() - overlap..], &next[..overlap]);
        }
    }
}
