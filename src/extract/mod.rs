//! Table extraction
//!
//! This module coordinates the per-table pipeline: every target table gets a
//! fresh parse of the original bytes, which is pruned down to that table,
//! reduced to its dependency closure and serialized as a standalone package.
//! No parsed state is shared between targets, so extractions run in parallel.

pub mod closure;
pub mod prune;
pub mod topology;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::package::{DocumentKind, DocxPackage};

pub use closure::{
    apply_minimal, collect_closure, retain_dependencies, unresolved_references, ReferenceKind,
    ReferenceSet, RetentionPolicy, UnresolvedReference,
};
pub use prune::prune_to_table;
pub use topology::{locate, top_level_tables, TableLocator, TopologyPolicy};

/// Message reported for a well-formed document without top-level tables
pub const NO_TABLES_MESSAGE: &str = "No tables found in the document.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    pub retention: RetentionPolicy,
    pub topology: TopologyPolicy,
    /// Extract the tables of one document on the rayon pool
    pub parallel: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            retention: RetentionPolicy::default(),
            topology: TopologyPolicy::default(),
            parallel: true,
        }
    }
}

/// One standalone document holding a single table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedTable {
    /// `table_<n>.<ext>`
    pub name: String,
    /// 1-based position of the table in the source document
    pub ordinal: usize,
    /// Policy actually applied (minimal may fall back to conservative)
    pub retention: RetentionPolicy,
    #[serde(skip)]
    pub content: Vec<u8>,
}

/// Deterministic output name for the table at `ordinal`
pub fn table_file_name(ordinal: usize, kind: DocumentKind) -> String {
    format!("table_{ordinal}.{}", kind.extension())
}

/// Number of top-level tables in a document
pub fn count_tables(bytes: &[u8], topology: TopologyPolicy) -> Result<usize> {
    let docx = DocxPackage::from_bytes(bytes)?;
    Ok(top_level_tables(docx.body()?, docx.namespaces(), topology).len())
}

/// Extract the top-level table at `ordinal` (1-based) into its own package
pub fn extract_table(bytes: &[u8], ordinal: usize, options: &ExtractOptions) -> Result<ExtractedTable> {
    let mut docx = DocxPackage::from_bytes(bytes)?;
    let namespaces = docx.namespaces().clone();
    prune_to_table(docx.body_mut()?, ordinal, &namespaces, options.topology)?;

    let (docx, retention) = retain_dependencies(docx, options.retention);
    let content = docx.to_bytes()?;
    debug!(
        ordinal,
        ?retention,
        parts = docx.package().len(),
        bytes = content.len(),
        "extracted table"
    );

    Ok(ExtractedTable {
        name: table_file_name(ordinal, docx.kind()),
        ordinal,
        retention,
        content,
    })
}

/// Extract every top-level table; an empty vector means the document has none
pub fn extract_tables(bytes: &[u8], options: &ExtractOptions) -> Result<Vec<ExtractedTable>> {
    let count = count_tables(bytes, options.topology)?;
    debug!(count, "found top-level tables");
    if count == 0 {
        return Ok(Vec::new());
    }

    if options.parallel {
        (1..=count)
            .into_par_iter()
            .map(|ordinal| extract_table(bytes, ordinal, options))
            .collect()
    } else {
        (1..=count)
            .map(|ordinal| extract_table(bytes, ordinal, options))
            .collect()
    }
}

/// Extract tables for a caller that wants results or an explanation, never both.
///
/// Returns `(tables, None)` on success and `([], Some(message))` when the
/// document has no tables or cannot be read.
pub fn split_document(bytes: &[u8], options: &ExtractOptions) -> (Vec<ExtractedTable>, Option<String>) {
    match extract_tables(bytes, options) {
        Ok(tables) if tables.is_empty() => (Vec::new(), Some(NO_TABLES_MESSAGE.to_string())),
        Ok(tables) => (tables, None),
        Err(err) => (Vec::new(), Some(err.to_string())),
    }
}
