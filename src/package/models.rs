//! In-memory package representation
//!
//! A package is the ordered list of zip entries of a `.docx` file. Parts are
//! kept as raw bytes; only the parts an extraction needs to edit (the main
//! document, relationship maps, the content-type manifest, styles and
//! numbering) are ever parsed.

use serde::{Deserialize, Serialize};

use super::constants::content_type;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePart {
    pub name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct Package {
    pub(crate) parts: Vec<PackagePart>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name = name.strip_prefix('/').unwrap_or(name);
        self.parts
            .iter()
            .position(|p| p.name == name)
            // Part names are ASCII case-insensitive in OPC
            .or_else(|| {
                self.parts
                    .iter()
                    .position(|p| p.name.eq_ignore_ascii_case(name))
            })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.position(name).map(|i| self.parts[i].data.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Replace the part's bytes, or append a new part at the end
    pub fn set_part(&mut self, name: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        match self.position(&name) {
            Some(i) => self.parts[i].data = data,
            None => self.parts.push(PackagePart { name, data }),
        }
    }

    pub fn remove_part(&mut self, name: &str) -> Option<Vec<u8>> {
        self.position(name).map(|i| self.parts.remove(i).data)
    }

    pub fn retain_parts(&mut self, keep: impl FnMut(&PackagePart) -> bool) {
        self.parts.retain(keep);
    }

    pub fn parts(&self) -> impl Iterator<Item = &PackagePart> {
        self.parts.iter()
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Flavour of WordprocessingML package, derived from the main part's content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    Docx,
    Docm,
    Dotx,
    Dotm,
}

impl DocumentKind {
    pub fn from_content_type(value: &str) -> Option<Self> {
        match value {
            content_type::WML_DOCUMENT_MAIN => Some(DocumentKind::Docx),
            content_type::WML_DOCUMENT_MACRO => Some(DocumentKind::Docm),
            content_type::WML_TEMPLATE_MAIN => Some(DocumentKind::Dotx),
            content_type::WML_TEMPLATE_MACRO => Some(DocumentKind::Dotm),
            _ => None,
        }
    }

    /// File extension without the leading dot
    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Docx => "docx",
            DocumentKind::Docm => "docm",
            DocumentKind::Dotx => "dotx",
            DocumentKind::Dotm => "dotm",
        }
    }
}
