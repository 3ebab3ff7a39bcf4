//! A Word package with its main document part parsed

use super::constants::{part_name, rel_type};
use super::content_types::ContentTypes;
use super::io::validate_word_package;
use super::models::{DocumentKind, Package};
use super::rels::Relationships;
use super::xml::{Namespaces, XmlDocument, XmlElement};
use crate::error::{Result, SplitError};

#[derive(Debug, Clone)]
pub struct DocxPackage {
    package: Package,
    main_part: String,
    document: XmlDocument,
    namespaces: Namespaces,
    kind: DocumentKind,
}

impl DocxPackage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    pub fn from_package(package: Package) -> Result<Self> {
        let main_part = locate_main_part(&package)?;
        validate_word_package(&package, &main_part)?;

        let bytes = package
            .part(&main_part)
            .ok_or_else(|| SplitError::MissingPart(main_part.clone()))?;
        let document = XmlDocument::parse(bytes)?;
        let root = document.root().ok_or_else(|| {
            SplitError::MalformedPackage(format!("{main_part} has no root element"))
        })?;
        let namespaces = Namespaces::from_root(root);
        if !namespaces.is_wml(root, "document") {
            return Err(SplitError::MalformedPackage(format!(
                "{main_part} is not a WordprocessingML document"
            )));
        }

        let kind = ContentTypes::load(&package)?
            .content_type(&main_part)
            .and_then(|value| DocumentKind::from_content_type(&value))
            .unwrap_or_default();

        let docx = Self {
            package,
            main_part,
            document,
            namespaces,
            kind,
        };
        docx.body()?;
        Ok(docx)
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    /// Zip entry name of the main document part, normally `word/document.xml`
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// The `w:document` element, including document-level content outside the body
    pub fn root(&self) -> Result<&XmlElement> {
        self.document.root().ok_or_else(|| {
            SplitError::MalformedPackage(format!("{} has no root element", self.main_part))
        })
    }

    pub fn body(&self) -> Result<&XmlElement> {
        self.document
            .root()
            .and_then(|root| {
                root.child_elements()
                    .find(|child| self.namespaces.is_wml(child, "body"))
            })
            .ok_or(SplitError::MissingBody)
    }

    pub fn body_mut(&mut self) -> Result<&mut XmlElement> {
        let namespaces = &self.namespaces;
        self.document
            .root_mut()
            .and_then(|root| {
                root.child_elements_mut()
                    .find(|child| namespaces.is_wml(child, "body"))
            })
            .ok_or(SplitError::MissingBody)
    }

    /// Relationships of the main document part
    pub fn main_relationships(&self) -> Result<Option<Relationships>> {
        Relationships::load(&self.package, &self.main_part)
    }

    /// Serialize the package, writing the current body tree back into the main part
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut package = self.package.clone();
        package.set_part(self.main_part.clone(), self.document.to_bytes()?);

        let mut content_types = ContentTypes::load(&package)?;
        if content_types.ensure_defaults(package.part_names()) {
            package.set_part(part_name::CONTENT_TYPES, content_types.to_bytes()?);
        }

        package.to_bytes()
    }
}

/// Main part named by the package's `officeDocument` relationship
fn locate_main_part(package: &Package) -> Result<String> {
    let located = Relationships::load(package, "")?.and_then(|rels| {
        let rel = rels.find_by_type(rel_type::OFFICE_DOCUMENT)?;
        rels.target_part(&rel)
    });
    Ok(located.unwrap_or_else(|| part_name::DEFAULT_MAIN_DOCUMENT.to_string()))
}
