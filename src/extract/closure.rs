//! Dependency closure of a pruned package
//!
//! References are enumerated by kind rather than by reflecting over
//! attributes: style IDs, numbering instance IDs, abstract numbering IDs and
//! relationship IDs. The walk starts at the main part's root, so
//! document-level content such as `w:background` counts alongside the body,
//! and takes in the style and numbering references of the parts that are
//! always retained (footnotes, endnotes, comments, settings). The minimal policy filters `styles.xml`, `numbering.xml`,
//! the main part's relationships and the part set down to that closure; the
//! conservative policy keeps the package as it was.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::package::constants::{part_name, rel_type};
use crate::package::{
    ContentTypes, DocxPackage, Namespaces, Package, Relationships, XmlDocument, XmlElement,
    XmlNode,
};

/// How much of the source package travels with an extracted table
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionPolicy {
    /// Keep every part, relationship, style and numbering definition
    #[default]
    Conservative,
    /// Keep only what the retained table references
    Minimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Style,
    Numbering,
    AbstractNumbering,
    Relationship,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceKind::Style => "style",
            ReferenceKind::Numbering => "numbering",
            ReferenceKind::AbstractNumbering => "abstract numbering",
            ReferenceKind::Relationship => "relationship",
        };
        f.write_str(name)
    }
}

/// A reference with no definition or part behind it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnresolvedReference {
    pub kind: ReferenceKind,
    pub id: String,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.id)
    }
}

/// Elements whose `w:val` names a style
const STYLE_REFERENCES: &[&str] = &[
    "pStyle",
    "rStyle",
    "tblStyle",
    "basedOn",
    "link",
    "next",
    "styleLink",
    "numStyleLink",
    "defaultTableStyle",
    "clickAndTypeStyle",
];

/// Always-retained WML parts whose style and numbering references join the closure
const REFERENCING_PARTS: &[&str] = &["footnotes", "endnotes", "comments", "settings"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceSet {
    pub styles: BTreeSet<String>,
    pub numbering: BTreeSet<String>,
    pub abstract_numbering: BTreeSet<String>,
    pub relationships: BTreeSet<String>,
}

impl ReferenceSet {
    /// Every reference made by `root` and its descendants, relationships included
    pub fn collect(root: &XmlElement, ns: &Namespaces) -> Self {
        let mut refs = Self::default();
        refs.scan(root, ns, true);
        refs
    }

    pub fn len(&self) -> usize {
        self.styles.len()
            + self.numbering.len()
            + self.abstract_numbering.len()
            + self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scan content of a part other than the main document. Relationship IDs
    /// found there belong to that part's own rels, so they are skipped.
    fn scan_definition(&mut self, definition: &XmlElement, ns: &Namespaces) {
        self.scan(definition, ns, false);
    }

    fn scan(&mut self, root: &XmlElement, ns: &Namespaces, relationships: bool) {
        root.walk(&mut |element| {
            if STYLE_REFERENCES.iter().any(|local| ns.is_wml(element, local)) {
                if let Some(id) = ns.wml_attr(element, "val") {
                    self.styles.insert(id);
                }
            } else if ns.is_wml(element, "numId") {
                // numId 0 removes numbering and has no definition
                if let Some(id) = ns.wml_attr(element, "val").filter(|id| id != "0") {
                    self.numbering.insert(id);
                }
            } else if ns.is_wml(element, "abstractNumId") {
                if let Some(id) = ns.wml_attr(element, "val") {
                    self.abstract_numbering.insert(id);
                }
            }

            if relationships {
                for (key, value) in element.attributes() {
                    if ns.is_relationship_attr(&key) && !value.is_empty() {
                        self.relationships.insert(value);
                    }
                }
            }
        });
    }
}

/// A parsed WML part the main document relates to (`styles.xml`, `numbering.xml`,
/// `footnotes.xml`, ...)
#[derive(Debug, Clone)]
struct DefinitionPart {
    name: String,
    xml: XmlDocument,
    ns: Namespaces,
}

impl DefinitionPart {
    fn load(package: &Package, rels: Option<&Relationships>, short_type: &str) -> Result<Option<Self>> {
        let Some(rels) = rels else {
            return Ok(None);
        };
        let Some(name) = rels
            .find_by_type(short_type)
            .and_then(|rel| rels.target_part(&rel))
        else {
            return Ok(None);
        };
        let Some(bytes) = package.part(&name) else {
            return Ok(None);
        };

        let xml = XmlDocument::parse(bytes)?;
        let ns = xml.root().map(Namespaces::from_root).unwrap_or_default();
        Ok(Some(Self { name, xml, ns }))
    }

    fn definitions<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.xml
            .root()
            .into_iter()
            .flat_map(|root| root.child_elements())
            .filter(move |e| self.ns.is_wml(e, local))
    }

    fn ids(&self, local: &str, id_attr: &str) -> HashSet<String> {
        self.definitions(local)
            .filter_map(|e| self.ns.wml_attr(e, id_attr))
            .collect()
    }

    fn retain(&mut self, mut keep: impl FnMut(&XmlElement, &Namespaces) -> bool) {
        let ns = self.ns.clone();
        if let Some(root) = self.xml.root_mut() {
            root.children.retain(|node| match node {
                XmlNode::Element(e) => keep(e, &ns),
                _ => true,
            });
        }
    }
}

fn is_on(value: Option<String>) -> bool {
    matches!(value.as_deref(), Some("1" | "true" | "on"))
}

/// Auxiliary parts the main document's references point into
struct AuxiliaryParts {
    rels: Option<Relationships>,
    styles: Option<DefinitionPart>,
    numbering: Option<DefinitionPart>,
    referencing: Vec<DefinitionPart>,
}

impl AuxiliaryParts {
    fn load(docx: &DocxPackage) -> Result<Self> {
        let rels = docx.main_relationships()?;
        let styles = DefinitionPart::load(docx.package(), rels.as_ref(), rel_type::STYLES)?;
        let numbering = DefinitionPart::load(docx.package(), rels.as_ref(), rel_type::NUMBERING)?;
        let mut referencing = Vec::new();
        for short_type in REFERENCING_PARTS {
            if let Some(part) = DefinitionPart::load(docx.package(), rels.as_ref(), short_type)? {
                referencing.push(part);
            }
        }
        Ok(Self {
            rels,
            styles,
            numbering,
            referencing,
        })
    }

    /// Closure of the main part's root and the always-retained parts
    fn closure(&self, docx: &DocxPackage) -> Result<ReferenceSet> {
        let mut refs = ReferenceSet::collect(docx.root()?, docx.namespaces());
        for part in &self.referencing {
            if let Some(root) = part.xml.root() {
                refs.scan_definition(root, &part.ns);
            }
        }
        self.expand(&mut refs);
        Ok(refs)
    }

    /// Grow `refs` to a fixpoint through style and numbering definitions
    fn expand(&self, refs: &mut ReferenceSet) {
        loop {
            let before = refs.len();

            if let Some(styles) = &self.styles {
                for style in styles.definitions("style") {
                    let used = styles
                        .ns
                        .wml_attr(style, "styleId")
                        .is_some_and(|id| refs.styles.contains(&id));
                    if used || is_on(styles.ns.wml_attr(style, "default")) {
                        refs.scan_definition(style, &styles.ns);
                        if let Some(id) = styles.ns.wml_attr(style, "styleId") {
                            refs.styles.insert(id);
                        }
                    }
                }
            }

            if let Some(numbering) = &self.numbering {
                for num in numbering.definitions("num") {
                    if numbering
                        .ns
                        .wml_attr(num, "numId")
                        .is_some_and(|id| refs.numbering.contains(&id))
                    {
                        refs.scan_definition(num, &numbering.ns);
                    }
                }
                for abstract_num in numbering.definitions("abstractNum") {
                    if numbering
                        .ns
                        .wml_attr(abstract_num, "abstractNumId")
                        .is_some_and(|id| refs.abstract_numbering.contains(&id))
                    {
                        refs.scan_definition(abstract_num, &numbering.ns);
                    }
                }
            }

            if refs.len() == before {
                break;
            }
        }
    }
}

/// Full reference closure of the package's main document
pub fn collect_closure(docx: &DocxPackage) -> Result<ReferenceSet> {
    AuxiliaryParts::load(docx)?.closure(docx)
}

/// References in the main document's closure that nothing in the package defines
pub fn unresolved_references(docx: &DocxPackage) -> Result<BTreeSet<UnresolvedReference>> {
    let aux = AuxiliaryParts::load(docx)?;
    let refs = aux.closure(docx)?;

    let mut unresolved = BTreeSet::new();
    let mut report = |kind, ids: &BTreeSet<String>, defined: &HashSet<String>| {
        for id in ids.iter().filter(|id| !defined.contains(*id)) {
            unresolved.insert(UnresolvedReference {
                kind,
                id: id.clone(),
            });
        }
    };

    let style_ids = aux
        .styles
        .as_ref()
        .map(|s| s.ids("style", "styleId"))
        .unwrap_or_default();
    let num_ids = aux
        .numbering
        .as_ref()
        .map(|n| n.ids("num", "numId"))
        .unwrap_or_default();
    let abstract_ids = aux
        .numbering
        .as_ref()
        .map(|n| n.ids("abstractNum", "abstractNumId"))
        .unwrap_or_default();
    report(ReferenceKind::Style, &refs.styles, &style_ids);
    report(ReferenceKind::Numbering, &refs.numbering, &num_ids);
    report(ReferenceKind::AbstractNumbering, &refs.abstract_numbering, &abstract_ids);

    for id in &refs.relationships {
        let resolved = aux.rels.as_ref().and_then(|rels| {
            let rel = rels.get(id)?;
            match rels.target_part(&rel) {
                Some(target) => docx.package().contains(&target).then_some(()),
                None => Some(()),
            }
        });
        if resolved.is_none() {
            unresolved.insert(UnresolvedReference {
                kind: ReferenceKind::Relationship,
                id: id.clone(),
            });
        }
    }

    Ok(unresolved)
}

/// Filter the package down to the closure of its main document. Returns the closure.
pub fn apply_minimal(docx: &mut DocxPackage) -> Result<ReferenceSet> {
    let mut aux = AuxiliaryParts::load(docx)?;
    let refs = aux.closure(docx)?;

    if let Some(styles) = aux.styles.as_mut() {
        styles.retain(|e, ns| {
            if !ns.is_wml(e, "style") {
                return true;
            }
            is_on(ns.wml_attr(e, "default"))
                || ns
                    .wml_attr(e, "styleId")
                    .is_some_and(|id| refs.styles.contains(&id))
        });
        docx.package_mut()
            .set_part(styles.name.clone(), styles.xml.to_bytes()?);
    }

    if let Some(numbering) = aux.numbering.as_mut() {
        numbering.retain(|e, ns| {
            if ns.is_wml(e, "num") {
                ns.wml_attr(e, "numId")
                    .is_some_and(|id| refs.numbering.contains(&id))
            } else if ns.is_wml(e, "abstractNum") {
                ns.wml_attr(e, "abstractNumId")
                    .is_some_and(|id| refs.abstract_numbering.contains(&id))
            } else {
                true
            }
        });
        docx.package_mut()
            .set_part(numbering.name.clone(), numbering.xml.to_bytes()?);
    }

    if let Some(rels) = aux.rels.as_mut() {
        let before = rels.entries().len();
        rels.retain(|rel| {
            refs.relationships.contains(&rel.id) || rel_type::STRUCTURAL.contains(&rel.short_type())
        });
        debug!(
            kept = rels.entries().len(),
            dropped = before - rels.entries().len(),
            "filtered main document relationships"
        );
        docx.package_mut().set_part(rels.part_name(), rels.to_bytes()?);
    }

    let reachable = reachable_parts(docx.package())?;
    docx.package_mut().retain_parts(|part| {
        part.name == part_name::CONTENT_TYPES || reachable.contains(&part.name.to_ascii_lowercase())
    });

    let present: HashSet<String> = docx
        .package()
        .part_names()
        .map(str::to_ascii_lowercase)
        .collect();
    let mut content_types = ContentTypes::load(docx.package())?;
    content_types.retain_overrides(|name| present.contains(&name.to_ascii_lowercase()));
    docx.package_mut()
        .set_part(part_name::CONTENT_TYPES, content_types.to_bytes()?);

    Ok(refs)
}

/// Lower-cased names of every part reachable from the package relationships,
/// including the rels parts walked on the way
fn reachable_parts(package: &Package) -> Result<HashSet<String>> {
    let mut reached = HashSet::new();
    let mut queue = VecDeque::from([String::new()]);

    while let Some(source) = queue.pop_front() {
        let Some(rels) = Relationships::load(package, &source)? else {
            continue;
        };
        reached.insert(rels.part_name().to_ascii_lowercase());

        for rel in rels.entries() {
            let Some(target) = rels.target_part(&rel) else {
                continue;
            };
            if package.contains(&target) && reached.insert(target.to_ascii_lowercase()) {
                queue.push_back(target);
            }
        }
    }

    Ok(reached)
}

/// Apply `policy` to a pruned package.
///
/// Minimal retention that would leave a reference dangling which the
/// conservatively retained package could resolve (or that fails on a malformed
/// auxiliary part) is abandoned for the conservative result.
pub fn retain_dependencies(
    docx: DocxPackage,
    policy: RetentionPolicy,
) -> (DocxPackage, RetentionPolicy) {
    if policy == RetentionPolicy::Conservative {
        return (docx, RetentionPolicy::Conservative);
    }

    let mut minimal = docx.clone();
    let outcome = unresolved_references(&docx).and_then(|baseline| {
        apply_minimal(&mut minimal)?;
        let after = unresolved_references(&minimal)?;
        Ok(after.difference(&baseline).cloned().collect::<Vec<_>>())
    });

    match outcome {
        Ok(introduced) if introduced.is_empty() => (minimal, RetentionPolicy::Minimal),
        Ok(introduced) => {
            let listed: Vec<String> = introduced.iter().map(ToString::to_string).collect();
            warn!(
                unresolved = %listed.join(", "),
                "minimal retention left dangling references, keeping all parts"
            );
            (docx, RetentionPolicy::Conservative)
        }
        Err(err) => {
            warn!(error = %err, "minimal retention failed, keeping all parts");
            (docx, RetentionPolicy::Conservative)
        }
    }
}
