use serde::{Deserialize, Serialize};

/// One corpus item as produced by the crawler: a JSON file holding the page
/// URL and its raw HTML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlFile {
    pub url: String,
    pub content: String,
}

/// Construction-phase posting: raw term statistics for one document.
///
/// `tf` counts occurrences of the token in the document; `importance` is the
/// sum of the tag weights of those occurrences, so a term that appears both
/// in the title and in body text accumulates weight from each occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPosting {
    pub doc_id: u32,
    pub tf: u32,
    pub importance: u32,
}

/// Final-phase posting: the precomputed weighted TF-IDF contribution of a
/// document for one token. This is the shape stored in `index.jsonl`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredPosting {
    #[serde(rename = "docID")]
    pub doc_id: u32,
    pub tf_idf: f64,
}

/// Byte range of one token's record inside the final index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaSpan {
    pub offset: u64,
    pub length: u32,
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub doc_id: u32,
    pub score: f64,
    pub url: String,
}
