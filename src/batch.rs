//! Batch processing and output bundling
//!
//! Each input document is processed independently: a document that fails to
//! parse is reported and contributes no outputs, while the rest of the batch
//! carries on. Output naming and zip bundling operate on the extracted bytes
//! only and know nothing about the document format.

use std::io::{Cursor, Write};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::Result;
use crate::extract::{extract_tables, ExtractOptions, ExtractedTable, NO_TABLES_MESSAGE};

/// Name of the archive that gathers the outputs of every document in a batch
pub const COMBINED_BUNDLE_NAME: &str = "all_split_tables.zip";

#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    Split { tables: Vec<ExtractedTable> },
    NoTables { message: String },
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub file_name: String,
    #[serde(flatten)]
    pub outcome: DocumentOutcome,
}

impl DocumentReport {
    pub fn failed(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            outcome: DocumentOutcome::Failed {
                message: message.into(),
            },
        }
    }

    pub fn tables(&self) -> &[ExtractedTable] {
        match &self.outcome {
            DocumentOutcome::Split { tables } => tables,
            _ => &[],
        }
    }

    /// `(output file name, bytes)` for every extracted table
    pub fn named_outputs(&self) -> Vec<(String, &[u8])> {
        self.tables()
            .iter()
            .map(|table| {
                (
                    output_file_name(&self.file_name, &table.name),
                    table.content.as_slice(),
                )
            })
            .collect()
    }
}

pub fn process_document(input: &DocumentInput, options: &ExtractOptions) -> DocumentReport {
    let outcome = match extract_tables(&input.bytes, options) {
        Ok(tables) if tables.is_empty() => {
            info!(file = %input.file_name, "no top-level tables");
            DocumentOutcome::NoTables {
                message: NO_TABLES_MESSAGE.to_string(),
            }
        }
        Ok(tables) => {
            info!(file = %input.file_name, count = tables.len(), "split document");
            DocumentOutcome::Split { tables }
        }
        Err(err) => {
            warn!(file = %input.file_name, error = %err, "failed to split document");
            DocumentOutcome::Failed {
                message: err.to_string(),
            }
        }
    };

    DocumentReport {
        file_name: input.file_name.clone(),
        outcome,
    }
}

/// Process every document; reports come back in input order
pub fn process_batch(inputs: &[DocumentInput], options: &ExtractOptions) -> Vec<DocumentReport> {
    inputs
        .par_iter()
        .map(|input| process_document(input, options))
        .collect()
}

/// File name without its last extension (`report.v2.docx` -> `report.v2`)
pub fn file_stem(file_name: &str) -> &str {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    }
}

/// `<source stem>_<table name>`, e.g. `report_table_1.docx`
pub fn output_file_name(source_file_name: &str, table_name: &str) -> String {
    format!("{}_{table_name}", file_stem(source_file_name))
}

/// Name of the per-document archive, e.g. `report_tables.zip`
pub fn document_bundle_name(source_file_name: &str) -> String {
    format!("{}_tables.zip", file_stem(source_file_name))
}

/// Deflate-compressed zip of `(file name, bytes)` entries
pub fn bundle_zip<'a>(entries: impl IntoIterator<Item = (String, &'a [u8])>) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for (name, bytes) in entries {
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// One archive with the outputs of every successfully split document
pub fn combined_bundle(reports: &[DocumentReport]) -> Result<Vec<u8>> {
    bundle_zip(reports.iter().flat_map(DocumentReport::named_outputs))
}
