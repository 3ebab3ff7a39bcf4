//! OOXML namespaces, relationship types, content types and well-known part names

pub mod namespace {
    /// WordprocessingML main namespace (Transitional and Strict)
    pub const WML: &[&str] = &[
        "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
        "http://purl.oclc.org/ooxml/wordprocessingml/main",
    ];

    /// Namespace of `r:id`-style relationship attributes (Transitional and Strict)
    pub const RELATIONSHIPS: &[&str] = &[
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
        "http://purl.oclc.org/ooxml/officeDocument/relationships",
    ];
}

pub mod part_name {
    pub const CONTENT_TYPES: &str = "[Content_Types].xml";
    pub const PACKAGE_RELS: &str = "_rels/.rels";
    pub const DEFAULT_MAIN_DOCUMENT: &str = "word/document.xml";
}

pub mod content_type {
    pub const WML_DOCUMENT_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const WML_DOCUMENT_MACRO: &str = "application/vnd.ms-word.document.macroEnabled.main+xml";
    pub const WML_TEMPLATE_MAIN: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml";
    pub const WML_TEMPLATE_MACRO: &str = "application/vnd.ms-word.template.macroEnabledTemplate.main+xml";
    pub const OPC_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";

    /// `Default` content types for media extensions a package may carry
    pub const MEDIA_DEFAULTS: &[(&str, &str)] = &[
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("bmp", "image/bmp"),
        ("tif", "image/tiff"),
        ("tiff", "image/tiff"),
        ("emf", "image/x-emf"),
        ("wmf", "image/x-wmf"),
        ("svg", "image/svg+xml"),
        ("webp", "image/webp"),
        ("wdp", "image/vnd.ms-photo"),
        ("bin", "application/vnd.openxmlformats-officedocument.oleObject"),
    ];
}

/// Relationship types, matched on the last path segment of the type URI so
/// Transitional, Strict and Microsoft-extension variants compare equal.
pub mod rel_type {
    pub const OFFICE_DOCUMENT: &str = "officeDocument";
    pub const STYLES: &str = "styles";
    pub const NUMBERING: &str = "numbering";

    /// Parts the main document needs regardless of which body content survives
    pub const STRUCTURAL: &[&str] = &[
        "styles",
        "stylesWithEffects",
        "numbering",
        "settings",
        "webSettings",
        "fontTable",
        "theme",
        "footnotes",
        "endnotes",
        "comments",
        "commentsExtended",
        "commentsIds",
        "commentsExtensible",
        "people",
        "customXml",
        "glossaryDocument",
    ];

    pub fn short(rel_type: &str) -> &str {
        rel_type.rsplit('/').next().unwrap_or(rel_type)
    }
}
