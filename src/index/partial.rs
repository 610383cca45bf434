use crate::models::BuildPosting;
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

/// Serializes an accumulator snapshot as a line-delimited record file.
///
/// Each line is `token<TAB><json posting array>`; lines are written in token
/// order because the snapshot is an ordered map.
pub fn write_records(path: &Path, records: &BTreeMap<String, Vec<BuildPosting>>) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create partial index {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for (token, postings) in records {
        let payload = serde_json::to_string(postings)?;
        writeln!(writer, "{token}\t{payload}")
            .with_context(|| format!("failed to write partial index {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush partial index {}", path.display()))
}

/// Streaming reader for the line-delimited record format shared by partial
/// files and the unified index. Yields one parsed record per line; any
/// malformed line is an error carrying the file path and line number.
pub struct RecordReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl RecordReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open index records {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }
}

impl Iterator for RecordReader {
    type Item = Result<(String, Vec<BuildPosting>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(err) => {
                return Some(Err(err).with_context(|| {
                    format!("failed to read index records {}", self.path.display())
                }))
            }
        };
        self.line_no += 1;
        Some(parse_record(&line).with_context(|| {
            format!(
                "malformed index record at {}:{}",
                self.path.display(),
                self.line_no
            )
        }))
    }
}

fn parse_record(line: &str) -> Result<(String, Vec<BuildPosting>)> {
    let Some((token, payload)) = line.split_once('\t') else {
        bail!("missing field separator");
    };
    if token.is_empty() {
        bail!("empty token");
    }
    let postings: Vec<BuildPosting> =
        serde_json::from_str(payload).context("unparseable posting payload")?;
    Ok((token.to_string(), postings))
}
