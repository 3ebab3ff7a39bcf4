//! tblsplit: split Word documents into one document per top-level table
//!
//! This library takes a `.docx` package, finds the tables that are direct
//! children of the document body, and produces for each of them a standalone
//! package that contains only that table together with the styles,
//! numbering, relationships and media it needs.

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod package;
pub mod verify;

use serde::{Deserialize, Serialize};

/// How extracted documents are written out
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleMode {
    /// One file per table
    None,
    /// One file for single-table documents, a zip per document otherwise
    #[default]
    PerDocument,
    /// A single zip holding the tables of every document
    Combined,
}

// Re-export commonly used types
pub use error::{Result, SplitError};
pub use extract::{
    count_tables, extract_table, extract_tables, split_document, ExtractOptions, ExtractedTable,
    RetentionPolicy, TopologyPolicy, NO_TABLES_MESSAGE,
};
pub use package::DocxPackage;
