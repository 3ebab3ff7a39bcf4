//! Top-level table classification
//!
//! Only the body's direct children are inspected. Tables nested in cells,
//! text boxes or inline controls are part of their container's subtree and
//! are never enumerated on their own.

use serde::{Deserialize, Serialize};

use crate::package::{Namespaces, XmlElement};

/// Which body-level elements count as top-level tables
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyPolicy {
    /// Only `w:tbl` elements that are direct children of `w:body`
    #[default]
    Direct,
    /// Also tables that are the direct content of a body-level block content control
    Controls,
}

/// Position of a top-level table in the body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLocator {
    /// 1-based position among top-level tables, in document order
    pub ordinal: usize,
    /// Index among the body's element children
    pub body_index: usize,
    /// Index among the wrapping control's `w:sdtContent` element children
    pub control_index: Option<usize>,
}

/// Ordered top-level tables of `body`; empty when the document has none
pub fn top_level_tables(
    body: &XmlElement,
    ns: &Namespaces,
    policy: TopologyPolicy,
) -> Vec<TableLocator> {
    let mut tables = Vec::new();

    for (body_index, child) in body.child_elements().enumerate() {
        if ns.is_wml(child, "tbl") {
            tables.push(TableLocator {
                ordinal: tables.len() + 1,
                body_index,
                control_index: None,
            });
        } else if policy == TopologyPolicy::Controls && ns.is_wml(child, "sdt") {
            for control_index in control_table_indices(child, ns) {
                tables.push(TableLocator {
                    ordinal: tables.len() + 1,
                    body_index,
                    control_index: Some(control_index),
                });
            }
        }
    }

    tables
}

/// The table element a locator points at
pub fn locate<'a>(
    body: &'a XmlElement,
    ns: &Namespaces,
    locator: &TableLocator,
) -> Option<&'a XmlElement> {
    let child = body.child_elements().nth(locator.body_index)?;
    match locator.control_index {
        None => Some(child),
        Some(index) => content_of(child, ns)?.child_elements().nth(index),
    }
}

/// Indices of the tables directly inside a block control's `w:sdtContent`
pub(crate) fn control_table_indices(sdt: &XmlElement, ns: &Namespaces) -> Vec<usize> {
    content_of(sdt, ns)
        .map(|content| {
            content
                .child_elements()
                .enumerate()
                .filter(|(_, e)| ns.is_wml(e, "tbl"))
                .map(|(i, _)| i)
                .collect()
        })
        .unwrap_or_default()
}

fn content_of<'a>(sdt: &'a XmlElement, ns: &Namespaces) -> Option<&'a XmlElement> {
    sdt.child_elements().find(|e| ns.is_wml(e, "sdtContent"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::XmlDocument;

    fn body(inner: &str) -> XmlDocument {
        XmlDocument::parse(
            format!(
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{inner}</w:body></w:document>"#
            )
            .as_bytes(),
        )
        .unwrap()
    }

    fn classify(doc: &XmlDocument, policy: TopologyPolicy) -> Vec<TableLocator> {
        let root = doc.root().unwrap();
        let ns = Namespaces::from_root(root);
        top_level_tables(root.find_child("body").unwrap(), &ns, policy)
    }

    const NESTED: &str = "<w:tbl><w:tr><w:tc><w:tbl><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl><w:p/></w:tc></w:tr></w:tbl>";

    #[test]
    fn test_nested_tables_are_not_enumerated() {
        let doc = body(&format!("<w:p/>{NESTED}<w:p/><w:tbl/>"));
        let tables = classify(&doc, TopologyPolicy::Direct);

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].body_index, 1);
        assert_eq!(tables[1].body_index, 3);
        assert_eq!(tables[1].ordinal, 2);
    }

    #[test]
    fn test_control_wrapped_table_depends_on_policy() {
        let doc = body("<w:sdt><w:sdtPr/><w:sdtContent><w:p/><w:tbl/></w:sdtContent></w:sdt><w:tbl/>");

        let direct = classify(&doc, TopologyPolicy::Direct);
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].body_index, 1);

        let controls = classify(&doc, TopologyPolicy::Controls);
        assert_eq!(controls.len(), 2);
        assert_eq!(
            controls[0],
            TableLocator {
                ordinal: 1,
                body_index: 0,
                control_index: Some(1)
            }
        );
    }

    #[test]
    fn test_locate_returns_table_element() {
        let doc = body("<w:sdt><w:sdtContent><w:tbl><w:tblPr/></w:tbl></w:sdtContent></w:sdt>");
        let root = doc.root().unwrap();
        let ns = Namespaces::from_root(root);
        let body = root.find_child("body").unwrap();

        let tables = top_level_tables(body, &ns, TopologyPolicy::Controls);
        let table = locate(body, &ns, &tables[0]).unwrap();
        assert!(ns.is_wml(table, "tbl"));
    }

    #[test]
    fn test_paragraph_only_body_has_no_tables() {
        let doc = body("<w:p/><w:p/><w:sectPr/>");
        assert!(classify(&doc, TopologyPolicy::Controls).is_empty());
    }
}
