//! Output verification
//!
//! Re-opens extracted packages and compares them with the source document:
//! exactly one top-level table, the same table shape (rows, grid columns,
//! cell text, merges), nothing else in the body, and no reference that the
//! source could resolve left dangling. References are checked across the
//! whole main document and the footnotes, endnotes, comments and settings
//! parts that travel with it.

use serde::Serialize;

use crate::error::{Result, SplitError};
use crate::extract::{
    locate, top_level_tables, unresolved_references, ExtractedTable, TopologyPolicy,
    UnresolvedReference,
};
use crate::package::{DocxPackage, Namespaces, XmlElement};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellShape {
    pub text: String,
    pub grid_span: usize,
    /// `restart` or `continue` for vertically merged cells
    pub vertical_merge: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableShape {
    pub rows: usize,
    pub columns: usize,
    pub cells: Vec<Vec<CellShape>>,
}

impl TableShape {
    pub fn from_table(table: &XmlElement, ns: &Namespaces) -> Self {
        let cells: Vec<Vec<CellShape>> = wrapped_children(table, ns, "tr")
            .into_iter()
            .map(|row| {
                wrapped_children(row, ns, "tc")
                    .into_iter()
                    .map(|cell| cell_shape(cell, ns))
                    .collect()
            })
            .collect();

        let grid_columns = table
            .child_elements()
            .find(|e| ns.is_wml(e, "tblGrid"))
            .map(|grid| grid.child_elements().filter(|e| ns.is_wml(e, "gridCol")).count())
            .unwrap_or(0);
        let spanned_columns = cells
            .iter()
            .map(|row| row.iter().map(|c| c.grid_span).sum::<usize>())
            .max()
            .unwrap_or(0);

        Self {
            rows: cells.len(),
            columns: grid_columns.max(spanned_columns),
            cells,
        }
    }
}

/// Direct children named `local`, looking through row/cell-level content controls
fn wrapped_children<'a>(parent: &'a XmlElement, ns: &Namespaces, local: &str) -> Vec<&'a XmlElement> {
    let mut out = Vec::new();
    for child in parent.child_elements() {
        if ns.is_wml(child, local) {
            out.push(child);
        } else if ns.is_wml(child, "sdt") {
            if let Some(content) = child.child_elements().find(|e| ns.is_wml(e, "sdtContent")) {
                out.extend(wrapped_children(content, ns, local));
            }
        }
    }
    out
}

fn cell_shape(cell: &XmlElement, ns: &Namespaces) -> CellShape {
    let mut text = String::new();
    cell.walk(&mut |e| {
        if ns.is_wml(e, "t") {
            text.push_str(&e.text());
        }
    });

    let properties = cell.child_elements().find(|e| ns.is_wml(e, "tcPr"));
    let grid_span = properties
        .and_then(|p| p.child_elements().find(|e| ns.is_wml(e, "gridSpan")))
        .and_then(|span| ns.wml_attr(span, "val"))
        .and_then(|val| val.parse().ok())
        .unwrap_or(1);
    let vertical_merge = properties
        .and_then(|p| p.child_elements().find(|e| ns.is_wml(e, "vMerge")))
        .map(|merge| ns.wml_attr(merge, "val").unwrap_or_else(|| "continue".to_string()));

    CellShape {
        text,
        grid_span,
        vertical_merge,
    }
}

/// Shapes of the top-level tables of a document, in order
pub fn table_shapes(bytes: &[u8], topology: TopologyPolicy) -> Result<Vec<TableShape>> {
    let docx = DocxPackage::from_bytes(bytes)?;
    let body = docx.body()?;
    let ns = docx.namespaces();

    Ok(top_level_tables(body, ns, topology)
        .iter()
        .filter_map(|locator| locate(body, ns, locator))
        .map(|table| TableShape::from_table(table, ns))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum VerificationIssue {
    /// The output does not hold exactly one top-level table
    TableCount { found: usize },
    /// The output body holds elements besides the extracted table
    StrayContent { elements: usize },
    /// The table differs from the source table at the same position
    ShapeMismatch,
    /// A reference the source could resolve has no target in the output
    Unresolved { reference: UnresolvedReference },
}

impl std::fmt::Display for VerificationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationIssue::TableCount { found } => {
                write!(f, "expected 1 top-level table, found {found}")
            }
            VerificationIssue::StrayContent { elements } => {
                write!(f, "body holds {elements} elements instead of 1")
            }
            VerificationIssue::ShapeMismatch => write!(f, "table differs from the source table"),
            VerificationIssue::Unresolved { reference } => {
                write!(f, "unresolved {reference}")
            }
        }
    }
}

/// Check one extracted table against its source document
pub fn verify_extraction(
    original: &[u8],
    table: &ExtractedTable,
    topology: TopologyPolicy,
) -> Result<Vec<VerificationIssue>> {
    let mut issues = Vec::new();

    let output = DocxPackage::from_bytes(&table.content)?;
    let body = output.body()?;
    let found = top_level_tables(body, output.namespaces(), topology).len();
    if found != 1 {
        issues.push(VerificationIssue::TableCount { found });
    }
    let elements = body.child_elements().count();
    if elements != 1 {
        issues.push(VerificationIssue::StrayContent { elements });
    }

    let source_shapes = table_shapes(original, topology)?;
    let output_shapes = table_shapes(&table.content, topology)?;
    let expected = source_shapes.get(table.ordinal.saturating_sub(1));
    if expected.is_none() || output_shapes.first() != expected {
        issues.push(VerificationIssue::ShapeMismatch);
    }

    let baseline = unresolved_references(&DocxPackage::from_bytes(original)?)?;
    for reference in unresolved_references(&output)? {
        if !baseline.contains(&reference) {
            issues.push(VerificationIssue::Unresolved { reference });
        }
    }

    Ok(issues)
}

/// Open a package with `docx-rs` and count the tables it sees in the body
pub fn open_with_docx_rs(bytes: &[u8]) -> Result<usize> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|err| SplitError::MalformedPackage(format!("docx-rs could not read output: {err}")))?;
    Ok(docx
        .document
        .children
        .iter()
        .filter(|child| matches!(child, docx_rs::DocumentChild::Table(_)))
        .count())
}
