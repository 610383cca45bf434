use crate::index::{load_urls, INDEX_FILE, META_INDEX_FILE, URLS_FILE};
use crate::models::{MetaSpan, ScoredPosting, SearchHit};
use crate::search::errors::EngineError;
use crate::tokenize::tokenize_query;
use ahash::{AHashMap, AHashSet};
use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Number of results returned when the caller does not ask for more.
pub const DEFAULT_TOP_K: usize = 5;

/// Read-only query engine over the artifacts of one indexing run.
///
/// The meta-index and URL registry are loaded once at startup and never
/// mutated, so a single engine can serve queries from multiple threads
/// through `&self`. Posting lists are never scanned: each query term costs
/// one seek plus one bounded read of the final index file.
#[derive(Debug)]
pub struct SearchEngine {
    index_path: PathBuf,
    meta: AHashMap<String, MetaSpan>,
    urls: Vec<String>,
}

impl SearchEngine {
    /// Loads the meta-index and URL registry from `storage` and verifies the
    /// final index is readable.
    pub fn open(storage: &Path) -> Result<Self, EngineError> {
        let meta_path = storage.join(META_INDEX_FILE);
        let meta_file = File::open(&meta_path).map_err(|source| EngineError::MetaIndexLoad {
            path: meta_path.clone(),
            source: source.into(),
        })?;
        let meta: AHashMap<String, MetaSpan> = serde_json::from_reader(BufReader::new(meta_file))
            .map_err(|source| EngineError::MetaIndexLoad {
            path: meta_path,
            source: source.into(),
        })?;

        let urls = load_urls(storage).map_err(|source| EngineError::UrlRegistryLoad {
            path: storage.join(URLS_FILE),
            source,
        })?;

        let index_path = storage.join(INDEX_FILE);
        File::open(&index_path).map_err(|source| EngineError::IndexOpen {
            path: index_path.clone(),
            source,
        })?;

        Ok(Self {
            index_path,
            meta,
            urls,
        })
    }

    /// Number of indexed documents.
    pub fn doc_count(&self) -> usize {
        self.urls.len()
    }

    /// Scores the query against the index and returns the top `k` documents
    /// by descending TF-IDF sum, ties broken by ascending doc id.
    ///
    /// Query terms absent from the index contribute nothing; an empty or
    /// all-absent query yields an empty result, not an error.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        // Dedup and sort so the accumulation order (and thus every float
        // rounding) is invariant under permutation of the query.
        let unique: AHashSet<String> = tokenize_query(query).into_iter().collect();
        let mut terms: Vec<String> = unique.into_iter().collect();
        terms.sort();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut index = File::open(&self.index_path)
            .with_context(|| format!("failed to open index file {}", self.index_path.display()))?;

        let mut scores: AHashMap<u32, f64> = AHashMap::new();
        for term in &terms {
            let Some(span) = self.meta.get(term) else {
                continue;
            };
            for posting in self.read_postings(&mut index, term, span)? {
                *scores.entry(posting.doc_id).or_insert(0.0) += posting.tf_idf;
            }
        }

        let mut ranked: Vec<(u32, f64)> = scores
            .into_iter()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| match b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });
        ranked.truncate(k);

        ranked
            .into_iter()
            .map(|(doc_id, score)| {
                let url = self
                    .urls
                    .get(doc_id as usize)
                    .cloned()
                    .with_context(|| format!("doc id {doc_id} missing from url registry"))?;
                Ok(SearchHit { doc_id, score, url })
            })
            .collect()
    }

    /// Seeks to one token's recorded byte span and parses its posting list.
    fn read_postings(
        &self,
        index: &mut File,
        term: &str,
        span: &MetaSpan,
    ) -> Result<Vec<ScoredPosting>> {
        index
            .seek(SeekFrom::Start(span.offset))
            .with_context(|| format!("failed to seek index record for '{term}'"))?;
        let mut buf = vec![0u8; span.length as usize];
        index
            .read_exact(&mut buf)
            .with_context(|| format!("failed to read index record for '{term}'"))?;

        let mut record: AHashMap<String, Vec<ScoredPosting>> = serde_json::from_slice(&buf)
            .with_context(|| format!("corrupt index record for '{term}'"))?;
        record.remove(term).with_context(|| {
            format!(
                "index record at offset {} does not belong to '{term}'",
                span.offset
            )
        })
    }
}
