//! Package model for zip-packaged WordprocessingML documents
//!
//! This module reads a `.docx` container into ordered parts, parses the main
//! document into a lossless XML tree, exposes the relationship graph and the
//! content-type manifest as editable views, and writes the result back.

pub mod constants;
pub mod content_types;
pub mod document;
pub(crate) mod io;
pub mod models;
pub mod rels;
pub mod xml;

pub use content_types::ContentTypes;
pub use document::DocxPackage;
pub use io::MAX_PART_BYTES;
pub use models::*;
pub use rels::{resolve_part_name, Relationship, Relationships};
pub use xml::{Namespaces, XmlDocument, XmlElement, XmlNode};
