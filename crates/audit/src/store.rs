//! Document access for the scan loop.
//!
//! The dashboard's document database sits behind the [`DocumentStore`] seam;
//! its client library is an external collaborator and is deliberately not a
//! dependency of this tool. The shipped implementation, [`JsonlStore`],
//! reads and writes JSON Lines collection exports: one JSON object per line,
//! each carrying an `_id` field (a plain string, or the `{"$oid": ...}`
//! shape produced by database exports).
//!
//! [`JsonlStore`] never modifies the source file in place. In write mode all
//! output streams to a sibling temp file which replaces the source in a
//! single rename at [`finish`](DocumentStore::finish); a cancelled or failed
//! run leaves the source untouched. A line that is not valid JSON aborts the
//! scan — the tool never rewrites what it cannot parse.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tracing::debug;

/// One document of a collection, as seen by the scanner.
#[derive(Debug, Clone)]
pub struct Document {
    /// Stable identifier used in violation reports and logs.
    pub id: String,
    /// The document body; declared fields are encrypted in place here.
    pub body: Value,
}

/// Paged access to one collection.
pub trait DocumentStore {
    /// Fetch the next batch of at most `limit` documents. An empty batch
    /// means the collection is exhausted.
    async fn next_batch(&mut self, limit: usize) -> Result<Vec<Document>>;

    /// Persist a processed batch. `modified` lists the ids whose bodies were
    /// changed in place; implementations that write per document may ignore
    /// the rest of the batch.
    async fn commit_batch(&mut self, batch: Vec<Document>, modified: &[String]) -> Result<()>;

    /// Close the store. With `commit` false, all pending writes are
    /// discarded and the underlying collection is left untouched.
    async fn finish(&mut self, commit: bool) -> Result<()>;
}

struct TempWriter {
    tmp_path: PathBuf,
    out: BufWriter<File>,
    /// Whether any committed batch actually contained modified documents.
    dirty: bool,
}

/// JSON Lines file store. See the module docs for the commit protocol.
pub struct JsonlStore {
    source: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: u64,
    writer: Option<TempWriter>,
}

impl JsonlStore {
    /// Open `path` for scanning. With `write_mode`, a temp output file is
    /// created next to it to receive the rewritten collection.
    pub async fn open(path: &Path, write_mode: bool) -> Result<Self> {
        let file = File::open(path)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;
        let lines = BufReader::new(file).lines();

        let writer = if write_mode {
            let tmp_path = tmp_path_for(path);
            let out = File::create(&tmp_path)
                .await
                .with_context(|| format!("failed to create {}", tmp_path.display()))?;
            Some(TempWriter {
                tmp_path,
                out: BufWriter::new(out),
                dirty: false,
            })
        } else {
            None
        };

        Ok(Self {
            source: path.to_owned(),
            lines,
            line_no: 0,
            writer,
        })
    }
}

impl DocumentStore for JsonlStore {
    async fn next_batch(&mut self, limit: usize) -> Result<Vec<Document>> {
        let mut batch = Vec::with_capacity(limit);
        while batch.len() < limit {
            let Some(line) = self.lines.next_line().await? else {
                break;
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let body: Value = serde_json::from_str(&line).with_context(|| {
                format!(
                    "line {} of {} is not valid JSON",
                    self.line_no,
                    self.source.display()
                )
            })?;
            let id = document_id(&body, self.line_no);
            batch.push(Document { id, body });
        }
        Ok(batch)
    }

    async fn commit_batch(&mut self, batch: Vec<Document>, modified: &[String]) -> Result<()> {
        let Some(writer) = &mut self.writer else {
            return Ok(());
        };
        writer.dirty |= !modified.is_empty();
        for doc in &batch {
            let line = serde_json::to_string(&doc.body)?;
            writer.out.write_all(line.as_bytes()).await?;
            writer.out.write_all(b"\n").await?;
        }
        Ok(())
    }

    async fn finish(&mut self, commit: bool) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        if commit && writer.dirty {
            writer.out.flush().await?;
            tokio::fs::rename(&writer.tmp_path, &self.source)
                .await
                .with_context(|| {
                    format!("failed to replace {} with rewrite", self.source.display())
                })?;
            debug!(path = %self.source.display(), "collection file replaced");
        } else {
            // Nothing changed, or the run was cancelled: keep the source as-is.
            drop(writer.out);
            tokio::fs::remove_file(&writer.tmp_path).await.ok();
        }
        Ok(())
    }
}

impl Drop for JsonlStore {
    fn drop(&mut self) {
        // finish() was never reached (early error): discard the partial temp file.
        if let Some(writer) = self.writer.take() {
            std::fs::remove_file(&writer.tmp_path).ok();
        }
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Extract a display identifier from a document body.
fn document_id(body: &Value, line_no: u64) -> String {
    match body.get("_id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(map)) => map
            .get("$oid")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("line-{line_no}")),
        _ => format!("line-{line_no}"),
    }
}

// ---------------------------------------------------------------------------
// In-memory store used by scan tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) struct MemoryStore {
    docs: Vec<Document>,
    cursor: usize,
    pub writes: usize,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new(docs: Vec<Document>) -> Self {
        Self {
            docs,
            cursor: 0,
            writes: 0,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }
}

#[cfg(test)]
impl DocumentStore for MemoryStore {
    async fn next_batch(&mut self, limit: usize) -> Result<Vec<Document>> {
        let end = (self.cursor + limit).min(self.docs.len());
        let batch = self.docs[self.cursor..end].to_vec();
        self.cursor = end;
        Ok(batch)
    }

    async fn commit_batch(&mut self, batch: Vec<Document>, modified: &[String]) -> Result<()> {
        for doc in batch {
            if modified.contains(&doc.id) {
                if let Some(slot) = self.docs.iter_mut().find(|d| d.id == doc.id) {
                    *slot = doc;
                    self.writes += 1;
                }
            }
        }
        Ok(())
    }

    async fn finish(&mut self, _commit: bool) -> Result<()> {
        Ok(())
    }
}
