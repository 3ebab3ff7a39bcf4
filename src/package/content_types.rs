//! The `[Content_Types].xml` manifest

use super::constants::{content_type, part_name};
use super::models::Package;
use super::xml::{XmlDocument, XmlElement, XmlNode};
use crate::error::{Result, SplitError};

#[derive(Debug, Clone)]
pub struct ContentTypes {
    xml: XmlDocument,
}

impl ContentTypes {
    pub fn load(package: &Package) -> Result<Self> {
        let bytes = package
            .part(part_name::CONTENT_TYPES)
            .ok_or_else(|| SplitError::MissingPart(part_name::CONTENT_TYPES.to_string()))?;
        let xml = XmlDocument::parse(bytes)?;
        if xml.root().is_none() {
            return Err(SplitError::MalformedPackage(
                "[Content_Types].xml has no root element".to_string(),
            ));
        }
        Ok(Self { xml })
    }

    fn entries(&self, local: &str) -> impl Iterator<Item = &XmlElement> {
        self.xml
            .root()
            .into_iter()
            .flat_map(|root| root.child_elements())
            .filter(move |e| e.local_name() == local.as_bytes())
    }

    /// Content type of a part: its `Override` if any, else the `Default` for its extension
    pub fn content_type(&self, part: &str) -> Option<String> {
        let part = part.strip_prefix('/').unwrap_or(part);
        let overridden = self.entries("Override").find_map(|e| {
            let name = e.attr("PartName")?;
            let name = name.strip_prefix('/').unwrap_or(&name);
            if name.eq_ignore_ascii_case(part) {
                e.attr("ContentType")
            } else {
                None
            }
        });
        if overridden.is_some() {
            return overridden;
        }

        let (_, ext) = part.rsplit_once('.')?;
        self.entries("Default").find_map(|e| {
            let extension = e.attr("Extension")?;
            if extension.eq_ignore_ascii_case(ext) {
                e.attr("ContentType")
            } else {
                None
            }
        })
    }

    pub fn add_default(&mut self, extension: &str, value: &str) {
        let Some(root) = self.xml.root_mut() else {
            return;
        };
        let name = match std::str::from_utf8(root.prefix()) {
            Ok(prefix) if !prefix.is_empty() => format!("{prefix}:Default"),
            _ => "Default".to_string(),
        };
        let element = XmlElement::new_empty(&name, &[("Extension", extension), ("ContentType", value)]);
        root.children.insert(0, XmlNode::Element(element));
    }

    /// Drop `Override` entries whose part name fails `keep`
    pub fn retain_overrides(&mut self, mut keep: impl FnMut(&str) -> bool) {
        if let Some(root) = self.xml.root_mut() {
            root.children.retain(|node| match node {
                XmlNode::Element(e) if e.local_name() == b"Override" => match e.attr("PartName") {
                    Some(name) => keep(name.strip_prefix('/').unwrap_or(&name)),
                    None => true,
                },
                _ => true,
            });
        }
    }

    /// Add `Default` entries for parts whose type the manifest cannot resolve.
    ///
    /// Returns true when the manifest changed.
    pub fn ensure_defaults<'a>(&mut self, parts: impl Iterator<Item = &'a str>) -> bool {
        let mut changed = false;
        for part in parts {
            if part == part_name::CONTENT_TYPES || self.content_type(part).is_some() {
                continue;
            }
            let Some((_, ext)) = part.rsplit_once('.') else {
                continue;
            };
            let ext = ext.to_ascii_lowercase();
            let value = match ext.as_str() {
                "rels" => Some(content_type::OPC_RELATIONSHIPS),
                "xml" => Some(content_type::XML),
                _ => content_type::MEDIA_DEFAULTS
                    .iter()
                    .find(|(known, _)| *known == ext)
                    .map(|(_, value)| *value),
            };
            if let Some(value) = value {
                self.add_default(&ext, value);
                changed = true;
            }
        }
        changed
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.xml.to_bytes()
    }
}
