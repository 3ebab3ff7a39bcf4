//! Relationship maps (`*.rels` parts)
//!
//! Relationship parts are kept as lossless XML so that a filtered map is
//! written back with its original declarations, ordering and IDs.

use std::borrow::Cow;

use super::constants::part_name;
use super::models::Package;
use super::xml::{XmlDocument, XmlElement, XmlNode};
use crate::error::{Result, SplitError};

/// A single relationship from a source part to a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    fn from_element(element: &XmlElement) -> Self {
        Self {
            id: element.attr("Id").unwrap_or_default(),
            rel_type: element.attr("Type").unwrap_or_default(),
            target: element.attr("Target").unwrap_or_default(),
            external: element
                .attr("TargetMode")
                .is_some_and(|mode| mode.eq_ignore_ascii_case("External")),
        }
    }

    /// Last path segment of the relationship type, e.g. `image`
    pub fn short_type(&self) -> &str {
        super::constants::rel_type::short(&self.rel_type)
    }
}

#[derive(Debug, Clone)]
pub struct Relationships {
    source: String,
    xml: XmlDocument,
}

impl Relationships {
    /// Name of the rels part belonging to `source` (`""` is the package itself)
    pub fn part_name_for(source: &str) -> String {
        if source.is_empty() {
            return part_name::PACKAGE_RELS.to_string();
        }
        match source.rsplit_once('/') {
            Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
            None => format!("_rels/{source}.rels"),
        }
    }

    /// Load the relationships of `source`, or `None` when it has no rels part
    pub fn load(package: &Package, source: &str) -> Result<Option<Self>> {
        let name = Self::part_name_for(source);
        let Some(bytes) = package.part(&name) else {
            return Ok(None);
        };
        let xml = XmlDocument::parse(bytes)?;
        if xml.root().is_none() {
            return Err(SplitError::MalformedPackage(format!(
                "relationship part {name} has no root element"
            )));
        }
        Ok(Some(Self {
            source: source.to_string(),
            xml,
        }))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn part_name(&self) -> String {
        Self::part_name_for(&self.source)
    }

    pub fn entries(&self) -> Vec<Relationship> {
        self.xml
            .root()
            .map(|root| {
                root.child_elements()
                    .filter(|e| e.local_name() == b"Relationship")
                    .map(Relationship::from_element)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<Relationship> {
        self.entries().into_iter().find(|rel| rel.id == id)
    }

    /// First relationship whose short type matches
    pub fn find_by_type(&self, short_type: &str) -> Option<Relationship> {
        self.entries()
            .into_iter()
            .find(|rel| rel.short_type() == short_type)
    }

    /// Part name an internal relationship points at; `None` for external targets
    pub fn target_part(&self, rel: &Relationship) -> Option<String> {
        if rel.external {
            return None;
        }
        Some(resolve_part_name(&self.source, &rel.target))
    }

    /// Drop every relationship for which `keep` returns false
    pub fn retain(&mut self, mut keep: impl FnMut(&Relationship) -> bool) {
        if let Some(root) = self.xml.root_mut() {
            root.children.retain(|node| match node {
                XmlNode::Element(e) if e.local_name() == b"Relationship" => {
                    keep(&Relationship::from_element(e))
                }
                _ => true,
            });
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.xml.to_bytes()
    }
}

/// Resolve a relationship target relative to its source part into a zip entry name.
///
/// Targets are URIs, so `media/image%201.png` names the entry `media/image 1.png`.
pub fn resolve_part_name(source: &str, target: &str) -> String {
    let target = target.split('#').next().unwrap_or(target);
    let decoded = urlencoding::decode(target).unwrap_or(Cow::Borrowed(target));
    let target = decoded.as_ref();
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => match source.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{target}"),
            None => target.to_string(),
        },
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/></Relationships>"#;

    fn package() -> Package {
        let mut package = Package::new();
        package.set_part("word/_rels/document.xml.rels", DOC_RELS.as_bytes().to_vec());
        package
    }

    #[test]
    fn test_rels_part_names() {
        assert_eq!(Relationships::part_name_for(""), "_rels/.rels");
        assert_eq!(
            Relationships::part_name_for("word/document.xml"),
            "word/_rels/document.xml.rels"
        );
        assert_eq!(
            Relationships::part_name_for("customXml/item1.xml"),
            "customXml/_rels/item1.xml.rels"
        );
    }

    #[test]
    fn test_percent_encoded_targets_are_decoded() {
        assert_eq!(
            resolve_part_name("word/document.xml", "media/image%201.png"),
            "word/media/image 1.png"
        );
        assert_eq!(
            resolve_part_name("word/document.xml", "media/caf%C3%A9.png"),
            "word/media/café.png"
        );
        // Not valid UTF-8 once decoded: kept as written
        assert_eq!(
            resolve_part_name("word/document.xml", "media/bad%FF.png"),
            "word/media/bad%FF.png"
        );
    }

    #[test]
    fn test_resolve_part_name() {
        assert_eq!(resolve_part_name("word/document.xml", "media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_part_name("word/document.xml", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_part_name("word/document.xml", "/word/styles.xml"), "word/styles.xml");
        assert_eq!(resolve_part_name("", "word/document.xml"), "word/document.xml");
        assert_eq!(resolve_part_name("word/document.xml", "./theme/theme1.xml"), "word/theme/theme1.xml");
    }

    #[test]
    fn test_entries_and_targets() {
        let rels = Relationships::load(&package(), "word/document.xml")
            .unwrap()
            .unwrap();
        let entries = rels.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].short_type(), "image");

        let hyperlink = rels.get("rId3").unwrap();
        assert!(hyperlink.external);
        assert_eq!(hyperlink.target, "https://example.com/?a=1&b=2");
        assert_eq!(rels.target_part(&hyperlink), None);

        let image = rels.get("rId2").unwrap();
        assert_eq!(rels.target_part(&image).as_deref(), Some("word/media/image1.png"));
        assert_eq!(rels.find_by_type("styles").unwrap().id, "rId1");
    }

    #[test]
    fn test_retain_drops_entries() {
        let mut rels = Relationships::load(&package(), "word/document.xml")
            .unwrap()
            .unwrap();
        rels.retain(|rel| rel.short_type() != "image");

        let reparsed = XmlDocument::parse(&rels.to_bytes().unwrap()).unwrap();
        let ids: Vec<String> = reparsed
            .root()
            .unwrap()
            .child_elements()
            .filter_map(|e| e.attr("Id"))
            .collect();
        assert_eq!(ids, vec!["rId1", "rId3"]);
    }

    #[test]
    fn test_missing_rels_part_is_none() {
        assert!(Relationships::load(&package(), "word/styles.xml").unwrap().is_none());
    }
}
