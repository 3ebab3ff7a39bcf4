//! Body pruning
//!
//! Works on a fresh clone of the package: every body-level node except the
//! target table is removed. The retained subtree is moved back untouched.

use super::topology::{control_table_indices, TopologyPolicy};
use crate::error::{Result, SplitError};
use crate::package::{Namespaces, XmlElement, XmlNode};

/// Reduce `body` to the single top-level table with the given 1-based ordinal
pub fn prune_to_table(
    body: &mut XmlElement,
    ordinal: usize,
    ns: &Namespaces,
    policy: TopologyPolicy,
) -> Result<()> {
    // Snapshot the children; the body is rebuilt from what survives
    let children = std::mem::take(&mut body.children);
    let mut seen = 0;
    let mut kept = None;

    for node in children {
        let XmlNode::Element(mut element) = node else {
            continue;
        };

        if ns.is_wml(&element, "tbl") {
            seen += 1;
            if seen == ordinal {
                kept = Some(element);
            }
        } else if policy == TopologyPolicy::Controls && ns.is_wml(&element, "sdt") {
            let indices = control_table_indices(&element, ns);
            if seen < ordinal && ordinal <= seen + indices.len() {
                let target = indices[ordinal - seen - 1];
                keep_only_control_child(&mut element, target, ns);
                kept = Some(element);
            }
            seen += indices.len();
        }
    }

    match kept {
        Some(element) => {
            body.children.push(XmlNode::Element(element));
            Ok(())
        }
        None => Err(SplitError::TableNotFound(ordinal)),
    }
}

/// Keep the control's properties but only the `index`-th element of its content
fn keep_only_control_child(sdt: &mut XmlElement, index: usize, ns: &Namespaces) {
    let Some(content) = sdt
        .child_elements_mut()
        .find(|e| ns.is_wml(e, "sdtContent"))
    else {
        return;
    };

    let children = std::mem::take(&mut content.children);
    content.children = children
        .into_iter()
        .filter(|node| node.as_element().is_some())
        .enumerate()
        .filter_map(|(i, node)| (i == index).then_some(node))
        .collect();
}
