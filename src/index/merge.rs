use crate::index::partial::RecordReader;
use crate::models::BuildPosting;
use anyhow::{Context, Result};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One source's current record, keyed for the min-heap.
struct HeapEntry {
    token: String,
    postings: Vec<BuildPosting>,
    source: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token && self.source == other.source
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Token ascending; ties resolved by source order so equal tokens pop
        // in the order their partials were written.
        self.token
            .cmp(&other.token)
            .then(self.source.cmp(&other.source))
    }
}

/// k-way streaming merge over sorted record sources.
///
/// Holds one record per source in a min-heap. Each `next()` pops the smallest
/// token, concatenates the posting lists of every source currently on that
/// token (in source order; partials cover disjoint ascending doc-id ranges,
/// so concatenation keeps the global list sorted), and refills the heap from
/// each consumed source. Memory stays at one record per source.
pub struct MergingIterator {
    heap: BinaryHeap<Reverse<HeapEntry>>,
    sources: Vec<RecordReader>,
    failed: bool,
}

impl MergingIterator {
    pub fn new(sources: Vec<RecordReader>) -> Result<Self> {
        let mut iter = Self {
            heap: BinaryHeap::new(),
            sources,
            failed: false,
        };
        for source in 0..iter.sources.len() {
            iter.refill_from_source(source)?;
        }
        Ok(iter)
    }

    fn refill_from_source(&mut self, source: usize) -> Result<()> {
        if let Some(record) = self.sources[source].next() {
            let (token, postings) = record?;
            self.heap.push(Reverse(HeapEntry {
                token,
                postings,
                source,
            }));
        }
        Ok(())
    }
}

impl Iterator for MergingIterator {
    type Item = Result<(String, Vec<BuildPosting>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let Reverse(mut head) = self.heap.pop()?;
        if let Err(err) = self.refill_from_source(head.source) {
            self.failed = true;
            return Some(Err(err));
        }

        // Fold in every other source currently holding the same token.
        loop {
            match self.heap.peek() {
                Some(Reverse(entry)) if entry.token == head.token => {}
                _ => break,
            }
            let Some(Reverse(next)) = self.heap.pop() else {
                break;
            };
            head.postings.extend(next.postings);
            if let Err(err) = self.refill_from_source(next.source) {
                self.failed = true;
                return Some(Err(err));
            }
        }

        Some(Ok((head.token, head.postings)))
    }
}

/// Merges the partial index files into one unified sorted record file.
/// Returns the number of records written. Any malformed partial is fatal.
pub fn merge_partials(partials: &[PathBuf], out: &Path) -> Result<u64> {
    let mut sources = Vec::with_capacity(partials.len());
    for path in partials {
        sources.push(RecordReader::open(path)?);
    }

    let file = File::create(out)
        .with_context(|| format!("failed to create unified index {}", out.display()))?;
    let mut writer = BufWriter::new(file);
    let mut records = 0u64;

    for record in MergingIterator::new(sources)? {
        let (token, postings) = record?;
        let payload = serde_json::to_string(&postings)?;
        writeln!(writer, "{token}\t{payload}")
            .with_context(|| format!("failed to write unified index {}", out.display()))?;
        records += 1;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush unified index {}", out.display()))?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::partial::write_records;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn posting(doc_id: u32, tf: u32, importance: u32) -> BuildPosting {
        BuildPosting {
            doc_id,
            tf,
            importance,
        }
    }

    fn write_partial(dir: &TempDir, seq: usize, records: &[(&str, Vec<BuildPosting>)]) -> PathBuf {
        let path = dir.path().join(format!("partial_{seq}.jsonl"));
        let map: BTreeMap<String, Vec<BuildPosting>> = records
            .iter()
            .map(|(token, postings)| (token.to_string(), postings.clone()))
            .collect();
        write_records(&path, &map).unwrap();
        path
    }

    fn drain(paths: Vec<PathBuf>) -> Vec<(String, Vec<BuildPosting>)> {
        let sources = paths
            .iter()
            .map(|p| RecordReader::open(p).unwrap())
            .collect();
        MergingIterator::new(sources)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_merge_interleaves_disjoint_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_partial(
            &dir,
            0,
            &[
                ("apple", vec![posting(0, 1, 1)]),
                ("cherry", vec![posting(1, 1, 1)]),
            ],
        );
        let b = write_partial(
            &dir,
            1,
            &[
                ("banana", vec![posting(2, 1, 1)]),
                ("date", vec![posting(3, 1, 1)]),
            ],
        );

        let merged = drain(vec![a, b]);
        let tokens: Vec<&str> = merged.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tokens, vec!["apple", "banana", "cherry", "date"]);
    }

    #[test]
    fn test_shared_tokens_concatenate_in_source_order() {
        let dir = tempfile::tempdir().unwrap();
        // Partials cover disjoint ascending doc-id ranges, as the spill
        // discipline guarantees.
        let a = write_partial(&dir, 0, &[("dog", vec![posting(0, 1, 1), posting(1, 3, 3)])]);
        let b = write_partial(&dir, 1, &[("dog", vec![posting(5, 2, 2)])]);
        let c = write_partial(&dir, 2, &[("dog", vec![posting(9, 1, 7)])]);

        let merged = drain(vec![a, b, c]);
        assert_eq!(merged.len(), 1);
        let doc_ids: Vec<u32> = merged[0].1.iter().map(|p| p.doc_id).collect();
        assert_eq!(doc_ids, vec![0, 1, 5, 9]);
    }

    #[test]
    fn test_merge_partials_writes_sorted_unified_file() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_partial(
            &dir,
            0,
            &[
                ("cat", vec![posting(0, 3, 12)]),
                ("dog", vec![posting(0, 1, 1)]),
            ],
        );
        let b = write_partial(&dir, 1, &[("dog", vec![posting(1, 3, 3)])]);

        let out = dir.path().join("unified.jsonl");
        let records = merge_partials(&[a, b], &out).unwrap();
        assert_eq!(records, 2);

        let unified: Vec<(String, Vec<BuildPosting>)> = RecordReader::open(&out)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(unified[0].0, "cat");
        assert_eq!(unified[1].0, "dog");
        assert_eq!(unified[1].1, vec![posting(0, 1, 1), posting(1, 3, 3)]);
    }

    #[test]
    fn test_empty_input_set_produces_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("unified.jsonl");
        assert_eq!(merge_partials(&[], &out).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "");
    }

    #[test]
    fn test_malformed_partial_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_partial(&dir, 0, &[("cat", vec![posting(0, 1, 1)])]);
        let bad = dir.path().join("partial_1.jsonl");
        std::fs::write(&bad, "no separator here\n").unwrap();

        let out = dir.path().join("unified.jsonl");
        assert!(merge_partials(&[good, bad], &out).is_err());
    }
}
