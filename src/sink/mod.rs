//! Incremental persistence of accumulated records

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use csv::WriterBuilder;
use tracing::{debug, error, info};

use crate::models::Record;
use crate::traits::RecordSink;

/// The run's ordered, append-only record sequence and the sinks it is flushed to
pub struct RunAccumulator {
    records: Vec<Record>,
    sinks: Vec<Box<dyn RecordSink>>,
}

impl RunAccumulator {
    pub fn new(sinks: Vec<Box<dyn RecordSink>>) -> Self {
        Self {
            records: Vec::new(),
            sinks,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Appends `batch` and hands the whole sequence to every sink.
    pub async fn append_and_flush(&mut self, batch: Vec<Record>) {
        self.records.extend(batch);
        self.flush().await;
    }

    /// Flushes every sink. A failing sink is logged and skipped; the records
    /// stay in memory for the next flush.
    pub async fn flush(&mut self) {
        for sink in &mut self.sinks {
            match sink.flush(&self.records).await {
                Ok(()) => info!(
                    sink = sink.name(),
                    records = self.records.len(),
                    "saved records"
                ),
                Err(e) => error!(sink = sink.name(), error = %e, "failed to save records"),
            }
        }
    }
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

/// Tabular sink.
///
/// The first flush of a run truncates the file and writes the header with
/// every row; later flushes append only rows past those already written.
pub struct CsvSink {
    path: PathBuf,
    persisted: usize,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            persisted: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_rows(&self, rows: &[Record], truncate: bool) -> Result<()> {
        let file = if truncate {
            std::fs::File::create(&self.path)?
        } else {
            OpenOptions::new().append(true).create(true).open(&self.path)?
        };

        let mut writer = WriterBuilder::new().has_headers(truncate).from_writer(file);
        if truncate && rows.is_empty() {
            writer.write_record(crate::models::RECORD_COLUMNS)?;
        }
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl RecordSink for CsvSink {
    fn name(&self) -> &str {
        "csv"
    }

    async fn flush(&mut self, records: &[Record]) -> Result<()> {
        ensure_parent(&self.path).await?;

        let written = if self.persisted == 0 || records.len() < self.persisted {
            self.write_rows(records, true)
                .with_context(|| format!("writing {}", self.path.display()))
        } else if records.len() > self.persisted {
            self.write_rows(&records[self.persisted..], false)
                .with_context(|| format!("appending to {}", self.path.display()))
        } else {
            debug!(path = %self.path.display(), "no new rows to append");
            Ok(())
        };

        // A failed write may have left part of the batch on disk, so the
        // next flush rewrites the whole file
        if written.is_err() {
            self.persisted = 0;
        }
        written?;

        self.persisted = records.len();
        Ok(())
    }
}

/// Structured sink: rewrites the file with the full sequence on every flush
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSink for JsonSink {
    fn name(&self) -> &str {
        "json"
    }

    async fn flush(&mut self, records: &[Record]) -> Result<()> {
        ensure_parent(&self.path).await?;
        let body = serde_json::to_vec_pretty(records)?;
        tokio::fs::write(&self.path, body)
            .await
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}
