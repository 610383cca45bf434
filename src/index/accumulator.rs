use crate::models::BuildPosting;
use ahash::AHashMap;
use std::collections::BTreeMap;

// Rough per-token map overhead on top of the key bytes and posting payload.
const TOKEN_OVERHEAD: usize = 48;
const POSTING_SIZE: usize = std::mem::size_of::<BuildPosting>();

/// In-memory partial inverted index with a byte-budgeted flush policy.
///
/// Tokens map to posting lists kept in a `BTreeMap`, so a spill writes records
/// in token order without a sort pass. The caller must feed documents in
/// ascending `doc_id` order; posting lists then stay sorted by construction.
#[derive(Debug, Default)]
pub struct PostingAccumulator {
    postings: BTreeMap<String, Vec<BuildPosting>>,
    approx_bytes: usize,
    threshold: usize,
}

impl PostingAccumulator {
    pub fn new(threshold: usize) -> Self {
        Self {
            postings: BTreeMap::new(),
            approx_bytes: 0,
            threshold,
        }
    }

    /// Folds one document's token stream into the index: `tf` counts
    /// occurrences, `importance` sums the tag weights of those occurrences.
    pub fn ingest(&mut self, doc_id: u32, tokens: &[(String, u32)]) {
        let mut by_token: AHashMap<&str, (u32, u32)> = AHashMap::new();
        for (stem, weight) in tokens {
            let entry = by_token.entry(stem.as_str()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += *weight;
        }

        for (stem, (tf, importance)) in by_token {
            let posting = BuildPosting {
                doc_id,
                tf,
                importance,
            };
            match self.postings.get_mut(stem) {
                Some(list) => list.push(posting),
                None => {
                    self.approx_bytes += stem.len() + TOKEN_OVERHEAD;
                    self.postings.insert(stem.to_string(), vec![posting]);
                }
            }
            self.approx_bytes += POSTING_SIZE;
        }
    }

    /// True once the tracked heap footprint exceeds the configured threshold.
    pub fn should_flush(&self) -> bool {
        self.approx_bytes > self.threshold
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Number of distinct tokens currently held.
    pub fn token_count(&self) -> usize {
        self.postings.len()
    }

    /// Hands out the accumulated state and resets to empty.
    pub fn drain(&mut self) -> BTreeMap<String, Vec<BuildPosting>> {
        self.approx_bytes = 0;
        std::mem::take(&mut self.postings)
    }
}
