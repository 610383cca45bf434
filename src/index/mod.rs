//! The indexing pipeline: corpus walk, tag-weighted tokenization, memory-bounded
//! accumulation with spill-to-disk, external k-way merge, and the TF-IDF scoring
//! pass that produces the final index and its meta-index.

mod accumulator;
mod merge;
mod partial;
mod registry;
mod rewrite;

pub use accumulator::PostingAccumulator;
pub use merge::{merge_partials, MergingIterator};
pub use partial::{write_records, RecordReader};
pub use registry::{corpus_files, load_urls, read_corpus_file, DocumentRegistry};
pub use rewrite::{rewrite_with_scores, RewriteSummary};

use crate::tokenize::tokenize_html;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Final index: one JSON record per line, sorted by token.
pub const INDEX_FILE: &str = "index.jsonl";
/// Token-to-byte-span map into the final index.
pub const META_INDEX_FILE: &str = "meta_index.json";
/// One URL per line; line `k` (1-indexed) is doc id `k - 1`.
pub const URLS_FILE: &str = "urls.txt";

// Transient build artifacts, removed once the final index is written.
const UNIFIED_FILE: &str = "unified.jsonl";
const PARTIAL_PREFIX: &str = "partial_";
const PARTIAL_SUFFIX: &str = ".jsonl";

/// Default in-memory accumulator budget before a spill (256 MB).
pub const DEFAULT_SPILL_THRESHOLD: usize = 256 * 1024 * 1024;

// Documents tokenized per rayon batch before sequential ingestion.
const TOKENIZE_BATCH: usize = 64;

/// Parameters for one indexing run.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Directory of crawled corpus items (`<subdir>/<name>.json`).
    pub corpus_path: PathBuf,
    /// Directory receiving `index.jsonl`, `meta_index.json`, and `urls.txt`.
    pub storage_path: PathBuf,
    /// Accumulator heap budget in bytes before spilling a partial index.
    pub spill_threshold: usize,
}

/// Statistics from a completed indexing run.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexSummary {
    pub documents: u32,
    pub unique_tokens: usize,
    pub partials: usize,
    pub skipped: usize,
}

/// Runs the full indexing pipeline over a corpus directory.
///
/// Malformed corpus items are skipped with a warning and consume no doc id;
/// every other failure aborts the run. On success the storage directory holds
/// exactly the three long-lived artifacts, with all transients removed.
pub fn build_index(options: &IndexOptions) -> Result<IndexSummary> {
    fs::create_dir_all(&options.storage_path).with_context(|| {
        format!(
            "failed to create index storage {}",
            options.storage_path.display()
        )
    })?;
    clear_transients(&options.storage_path)?;

    let files = corpus_files(&options.corpus_path)?;
    info!(
        "indexing {} corpus files from {}",
        files.len(),
        options.corpus_path.display()
    );

    let mut registry = DocumentRegistry::create(&options.storage_path)?;
    let mut accumulator = PostingAccumulator::new(options.spill_threshold);
    let mut partials: Vec<PathBuf> = Vec::new();
    let mut batch: Vec<(u32, String)> = Vec::new();
    let mut skipped = 0usize;

    for path in &files {
        let doc = match read_corpus_file(path) {
            Ok(doc) => doc,
            Err(err) => {
                warn!("skipping corpus item {}: {err:#}", path.display());
                skipped += 1;
                continue;
            }
        };
        let doc_id = registry.assign(&doc.url)?;
        batch.push((doc_id, doc.content));
        if batch.len() >= TOKENIZE_BATCH {
            ingest_batch(
                &mut batch,
                &mut accumulator,
                &mut partials,
                &options.storage_path,
            )?;
        }
    }
    ingest_batch(
        &mut batch,
        &mut accumulator,
        &mut partials,
        &options.storage_path,
    )?;
    if !accumulator.is_empty() {
        spill(&mut accumulator, &mut partials, &options.storage_path)?;
    }
    let documents = registry.finish()?;

    let unified = options.storage_path.join(UNIFIED_FILE);
    info!("merging {} partial files", partials.len());
    merge_partials(&partials, &unified)?;

    info!("scoring postings across {documents} documents");
    let rewrite = rewrite_with_scores(
        &unified,
        &options.storage_path.join(INDEX_FILE),
        &options.storage_path.join(META_INDEX_FILE),
        documents,
    )?;

    for path in &partials {
        fs::remove_file(path)
            .with_context(|| format!("failed to remove partial index {}", path.display()))?;
    }
    fs::remove_file(&unified)
        .with_context(|| format!("failed to remove unified index {}", unified.display()))?;

    info!(
        "indexed {documents} documents, {} unique tokens",
        rewrite.unique_tokens
    );
    Ok(IndexSummary {
        documents,
        unique_tokens: rewrite.unique_tokens,
        partials: partials.len(),
        skipped,
    })
}

/// Tokenizes a batch of documents on the rayon pool, then feeds the single
/// accumulator in ascending doc-id order (the indexed collect preserves input
/// order). The flush check runs after each document, so a spill never splits
/// one and partials cover disjoint ascending doc-id ranges.
fn ingest_batch(
    batch: &mut Vec<(u32, String)>,
    accumulator: &mut PostingAccumulator,
    partials: &mut Vec<PathBuf>,
    storage: &Path,
) -> Result<()> {
    if batch.is_empty() {
        return Ok(());
    }
    let documents = std::mem::take(batch);
    let tokenized: Vec<(u32, Vec<(String, u32)>)> = documents
        .into_par_iter()
        .map(|(doc_id, html)| (doc_id, tokenize_html(&html)))
        .collect();

    for (doc_id, tokens) in &tokenized {
        accumulator.ingest(*doc_id, tokens);
        if accumulator.should_flush() {
            spill(accumulator, partials, storage)?;
        }
    }
    Ok(())
}

fn spill(
    accumulator: &mut PostingAccumulator,
    partials: &mut Vec<PathBuf>,
    storage: &Path,
) -> Result<()> {
    let path = storage.join(format!("{PARTIAL_PREFIX}{}{PARTIAL_SUFFIX}", partials.len()));
    let records = accumulator.drain();
    info!("spilling {} tokens to {}", records.len(), path.display());
    write_records(&path, &records)?;
    partials.push(path);
    Ok(())
}

/// Removes partial and unified files left behind by an aborted earlier run,
/// so a rebuild never merges records from two runs.
fn clear_transients(storage: &Path) -> Result<()> {
    for entry in fs::read_dir(storage)
        .with_context(|| format!("failed to read index storage {}", storage.display()))?
    {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let is_partial = name.starts_with(PARTIAL_PREFIX) && name.ends_with(PARTIAL_SUFFIX);
        if is_partial || name == UNIFIED_FILE {
            fs::remove_file(entry.path()).with_context(|| {
                format!("failed to remove stale artifact {}", entry.path().display())
            })?;
        }
    }
    Ok(())
}
