use crate::index::URLS_FILE;
use crate::models::CrawlFile;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Enumerates the corpus JSON files in deterministic sorted traversal order.
/// Doc-id assignment depends on this order being stable across runs.
pub fn corpus_files(root: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_path(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry =
            entry.with_context(|| format!("failed to walk corpus directory {}", root.display()))?;
        let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
        if is_file && entry.path().extension().is_some_and(|ext| ext == "json") {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Parses one corpus item. Callers treat failure as a skippable per-document
/// error, not a fatal one.
pub fn read_corpus_file(path: &Path) -> Result<CrawlFile> {
    let file =
        File::open(path).with_context(|| format!("failed to open corpus file {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse corpus file {}", path.display()))
}

/// Assigns dense monotonically increasing doc ids and persists the id-to-URL
/// map: line `k` (1-indexed) of `urls.txt` is the URL of doc id `k - 1`.
pub struct DocumentRegistry {
    writer: BufWriter<File>,
    path: PathBuf,
    next_id: u32,
}

impl DocumentRegistry {
    /// Creates (truncating) the URL registry file under `storage`.
    pub fn create(storage: &Path) -> Result<Self> {
        let path = storage.join(URLS_FILE);
        let file = File::create(&path)
            .with_context(|| format!("failed to create url registry {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
            next_id: 0,
        })
    }

    /// Appends a URL and returns the doc id it was assigned.
    pub fn assign(&mut self, url: &str) -> Result<u32> {
        let doc_id = self.next_id;
        writeln!(self.writer, "{url}")
            .with_context(|| format!("failed to append url registry {}", self.path.display()))?;
        self.next_id += 1;
        Ok(doc_id)
    }

    /// Flushes the registry and returns the total document count `N`.
    pub fn finish(mut self) -> Result<u32> {
        self.writer
            .flush()
            .with_context(|| format!("failed to flush url registry {}", self.path.display()))?;
        Ok(self.next_id)
    }
}

/// Loads the URL registry into memory; index `i` holds the URL of doc id `i`.
pub fn load_urls(storage: &Path) -> io::Result<Vec<String>> {
    let file = File::open(storage.join(URLS_FILE))?;
    BufReader::new(file).lines().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_corpus_walk_is_sorted_and_json_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b.site")).unwrap();
        fs::create_dir_all(dir.path().join("a.site")).unwrap();
        fs::write(dir.path().join("b.site/2.json"), "{}").unwrap();
        fs::write(dir.path().join("b.site/1.json"), "{}").unwrap();
        fs::write(dir.path().join("a.site/9.json"), "{}").unwrap();
        fs::write(dir.path().join("a.site/README.md"), "not corpus").unwrap();

        let files = corpus_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| {
                p.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["a.site/9.json", "b.site/1.json", "b.site/2.json"]);
    }

    #[test]
    fn test_registry_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = DocumentRegistry::create(dir.path()).unwrap();
        assert_eq!(registry.assign("https://a/").unwrap(), 0);
        assert_eq!(registry.assign("https://b/").unwrap(), 1);
        assert_eq!(registry.finish().unwrap(), 2);

        let urls = load_urls(dir.path()).unwrap();
        assert_eq!(urls, vec!["https://a/", "https://b/"]);
    }

    #[test]
    fn test_read_corpus_file_rejects_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, r#"{"url": "https://a/"}"#).unwrap();
        assert!(read_corpus_file(&path).is_err());
    }
}
