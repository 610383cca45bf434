use crate::index::partial::RecordReader;
use crate::models::{BuildPosting, MetaSpan, ScoredPosting};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Statistics from the scoring pass.
#[derive(Debug, Clone, Copy)]
pub struct RewriteSummary {
    pub unique_tokens: usize,
}

/// Weighted TF-IDF of one construction posting.
///
/// `tf >= 1` always, so the frequency factor never drops below 1; a token
/// present in every document gets `idf = 0` and scores zero while remaining
/// in the index.
fn score(posting: &BuildPosting, idf: f64) -> f64 {
    posting.importance as f64 * (1.0 + (posting.tf as f64).log10()) * idf
}

fn inverse_document_frequency(doc_count: u32, df: usize) -> f64 {
    if df as u64 == doc_count as u64 {
        return 0.0;
    }
    (doc_count as f64 / df as f64).log10()
}

/// Streams the unified index once, writing the final scored index and the
/// meta-index that records each token's byte span inside it.
///
/// Each output line is a one-key JSON object `{"token": [postings]}`. The
/// byte offset is tracked while writing, so a later reader can seek straight
/// to a record without scanning.
pub fn rewrite_with_scores(
    unified: &Path,
    index_path: &Path,
    meta_path: &Path,
    doc_count: u32,
) -> Result<RewriteSummary> {
    let reader = RecordReader::open(unified)?;
    let file = File::create(index_path)
        .with_context(|| format!("failed to create final index {}", index_path.display()))?;
    let mut writer = BufWriter::new(file);

    let mut meta: BTreeMap<String, MetaSpan> = BTreeMap::new();
    let mut offset = 0u64;

    for record in reader {
        let (token, postings) = record?;
        let idf = inverse_document_frequency(doc_count, postings.len());
        let scored: Vec<ScoredPosting> = postings
            .iter()
            .map(|posting| ScoredPosting {
                doc_id: posting.doc_id,
                tf_idf: score(posting, idf),
            })
            .collect();

        let line = serde_json::to_string(&BTreeMap::from([(token.as_str(), &scored)]))?;
        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .with_context(|| format!("failed to write final index {}", index_path.display()))?;

        meta.insert(
            token,
            MetaSpan {
                offset,
                length: line.len() as u32,
            },
        );
        offset += line.len() as u64 + 1;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush final index {}", index_path.display()))?;

    let meta_file = File::create(meta_path)
        .with_context(|| format!("failed to create meta index {}", meta_path.display()))?;
    let mut meta_writer = BufWriter::new(meta_file);
    serde_json::to_writer(&mut meta_writer, &meta)
        .with_context(|| format!("failed to write meta index {}", meta_path.display()))?;
    meta_writer
        .flush()
        .with_context(|| format!("failed to flush meta index {}", meta_path.display()))?;

    Ok(RewriteSummary {
        unique_tokens: meta.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::partial::write_records;
    use ahash::AHashMap;
    use std::collections::BTreeMap;

    #[test]
    fn test_score_formula() {
        let posting = BuildPosting {
            doc_id: 0,
            tf: 3,
            importance: 12,
        };
        let idf = inverse_document_frequency(2, 1);
        let expected = 12.0 * (1.0 + 3f64.log10()) * 2f64.log10();
        assert!((score(&posting, idf) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_idf_zero_when_token_is_everywhere() {
        assert_eq!(inverse_document_frequency(2, 2), 0.0);
        assert!(inverse_document_frequency(2, 1) > 0.0);
    }

    #[test]
    fn test_rewrite_records_spans_and_scores() {
        let dir = tempfile::tempdir().unwrap();
        let unified = dir.path().join("unified.jsonl");
        let index_path = dir.path().join("index.jsonl");
        let meta_path = dir.path().join("meta_index.json");

        let mut records = BTreeMap::new();
        records.insert(
            "cat".to_string(),
            vec![BuildPosting {
                doc_id: 0,
                tf: 3,
                importance: 12,
            }],
        );
        records.insert(
            "dog".to_string(),
            vec![
                BuildPosting {
                    doc_id: 0,
                    tf: 1,
                    importance: 1,
                },
                BuildPosting {
                    doc_id: 1,
                    tf: 3,
                    importance: 3,
                },
            ],
        );
        write_records(&unified, &records).unwrap();

        let summary = rewrite_with_scores(&unified, &index_path, &meta_path, 2).unwrap();
        assert_eq!(summary.unique_tokens, 2);

        let meta: BTreeMap<String, MetaSpan> =
            serde_json::from_str(&std::fs::read_to_string(&meta_path).unwrap()).unwrap();
        let index_bytes = std::fs::read(&index_path).unwrap();

        // Every recorded span must cut out exactly that token's record.
        for (token, span) in &meta {
            let start = span.offset as usize;
            let end = start + span.length as usize;
            let record: AHashMap<String, Vec<ScoredPosting>> =
                serde_json::from_slice(&index_bytes[start..end]).unwrap();
            assert!(record.contains_key(token));
        }

        let cat_span = meta["cat"];
        let record: AHashMap<String, Vec<ScoredPosting>> = serde_json::from_slice(
            &index_bytes[cat_span.offset as usize..(cat_span.offset + cat_span.length as u64) as usize],
        )
        .unwrap();
        let expected = 12.0 * (1.0 + 3f64.log10()) * 2f64.log10();
        assert!((record["cat"][0].tf_idf - expected).abs() < 1e-9);

        // "dog" is in both of the 2 documents, so its postings score zero
        // but are still present.
        let dog_span = meta["dog"];
        let record: AHashMap<String, Vec<ScoredPosting>> = serde_json::from_slice(
            &index_bytes[dog_span.offset as usize..(dog_span.offset + dog_span.length as u64) as usize],
        )
        .unwrap();
        assert_eq!(record["dog"].len(), 2);
        assert_eq!(record["dog"][0].tf_idf, 0.0);
        assert_eq!(record["dog"][1].tf_idf, 0.0);
    }
}
