#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const DOCX_MAIN: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
pub const DOCM_MAIN: &str = "application/vnd.ms-word.document.macroEnabled.main+xml";

pub const PNG_1: &[u8] = b"\x89PNG\r\n\x1a\nfirst-image";
pub const PNG_2: &[u8] = b"\x89PNG\r\n\x1a\nsecond-image";

/// Builder for small in-memory Word packages
pub struct Fixture {
    before_body: String,
    body: String,
    main_content_type: String,
    styles: Option<String>,
    numbering: Option<String>,
    extra_rels: Vec<String>,
    extra_parts: Vec<(String, Vec<u8>)>,
    overrides: Vec<(String, String)>,
}

impl Fixture {
    pub fn new(body: &str) -> Self {
        Self {
            before_body: String::new(),
            body: body.to_string(),
            main_content_type: DOCX_MAIN.to_string(),
            styles: None,
            numbering: None,
            extra_rels: Vec::new(),
            extra_parts: Vec::new(),
            overrides: Vec::new(),
        }
    }

    /// Document-level content placed before `w:body`, e.g. `w:background`
    pub fn before_body(mut self, xml: &str) -> Self {
        self.before_body = xml.to_string();
        self
    }

    pub fn main_content_type(mut self, value: &str) -> Self {
        self.main_content_type = value.to_string();
        self
    }

    pub fn styles(mut self, xml: &str) -> Self {
        self.styles = Some(xml.to_string());
        self
    }

    pub fn numbering(mut self, xml: &str) -> Self {
        self.numbering = Some(xml.to_string());
        self
    }

    /// Add a main-document relationship, optionally with the part it targets
    pub fn relationship(mut self, id: &str, short_type: &str, target: &str, external: bool) -> Self {
        let mode = if external { r#" TargetMode="External""# } else { "" };
        self.extra_rels.push(format!(
            r#"<Relationship Id="{id}" Type="{REL}/{short_type}" Target="{target}"{mode}/>"#
        ));
        self
    }

    pub fn part(mut self, name: &str, data: &[u8], content_type: Option<&str>) -> Self {
        self.extra_parts.push((name.to_string(), data.to_vec()));
        if let Some(content_type) = content_type {
            self.overrides.push((name.to_string(), content_type.to_string()));
        }
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut rels = Vec::new();
        let mut overrides = vec![("word/document.xml".to_string(), self.main_content_type.clone())];
        let mut parts: Vec<(String, Vec<u8>)> = Vec::new();

        if let Some(styles) = &self.styles {
            rels.push(format!(
                r#"<Relationship Id="rIdStyles" Type="{REL}/styles" Target="styles.xml"/>"#
            ));
            overrides.push((
                "word/styles.xml".to_string(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"
                    .to_string(),
            ));
            parts.push(("word/styles.xml".to_string(), styles.clone().into_bytes()));
        }
        if let Some(numbering) = &self.numbering {
            rels.push(format!(
                r#"<Relationship Id="rIdNumbering" Type="{REL}/numbering" Target="numbering.xml"/>"#
            ));
            overrides.push((
                "word/numbering.xml".to_string(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"
                    .to_string(),
            ));
            parts.push(("word/numbering.xml".to_string(), numbering.clone().into_bytes()));
        }
        rels.extend(self.extra_rels.iter().cloned());
        overrides.extend(self.overrides.iter().cloned());
        parts.extend(self.extra_parts.iter().cloned());

        let override_xml: String = overrides
            .iter()
            .map(|(name, ct)| format!(r#"<Override PartName="/{name}" ContentType="{ct}"/>"#))
            .collect();
        let content_types = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/>{override_xml}</Types>"#
        );
        let package_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL}/officeDocument" Target="word/document.xml"/></Relationships>"#
        );
        let document_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
            rels.concat()
        );
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W}" xmlns:r="{R}" xmlns:v="urn:schemas-microsoft-com:vml">{}<w:body>{}</w:body></w:document>"#,
            self.before_body, self.body
        );

        let mut entries = vec![
            ("[Content_Types].xml".to_string(), content_types.into_bytes()),
            ("_rels/.rels".to_string(), package_rels.into_bytes()),
            ("word/document.xml".to_string(), document.into_bytes()),
            ("word/_rels/document.xml.rels".to_string(), document_rels.into_bytes()),
        ];
        entries.extend(parts);
        zip_entries(&entries)
    }
}

pub fn zip_entries(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        zip.start_file(name.as_str(), options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
}

/// One-row table whose cells hold the given text
pub fn simple_table(cells: &[&str]) -> String {
    let grid: String = cells.iter().map(|_| r#"<w:gridCol w:w="2000"/>"#).collect();
    let row: String = cells
        .iter()
        .map(|text| format!("<w:tc>{}</w:tc>", paragraph(text)))
        .collect();
    format!("<w:tbl><w:tblPr/><w:tblGrid>{grid}</w:tblGrid><w:tr>{row}</w:tr></w:tbl>")
}

pub fn image_run(rel_id: &str) -> String {
    format!(
        r#"<w:r><w:drawing><wp:inline xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"><a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:graphicData><a:blip r:embed="{rel_id}"/></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
    )
}

pub const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault/></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/></w:style><w:style w:type="table" w:styleId="GridTable"><w:name w:val="Grid Table"/><w:basedOn w:val="TableNormal"/></w:style><w:style w:type="paragraph" w:styleId="ListPara"><w:name w:val="List Paragraph"/><w:basedOn w:val="Normal"/></w:style><w:style w:type="character" w:styleId="Strong"><w:name w:val="Strong"/></w:style><w:style w:type="paragraph" w:styleId="Unused"><w:name w:val="Unused"/><w:link w:val="UnusedChar"/></w:style><w:style w:type="character" w:styleId="UnusedChar"><w:name w:val="Unused Char"/></w:style></w:styles>"#;

pub const NUMBERING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/></w:lvl></w:abstractNum><w:abstractNum w:abstractNumId="5"><w:lvl w:ilvl="0"><w:numFmt w:val="decimal"/></w:lvl></w:abstractNum><w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num><w:num w:numId="7"><w:abstractNumId w:val="5"/></w:num></w:numbering>"#;

const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p><w:r><w:t>Header</w:t></w:r></w:p></w:hdr>"#;

/// Three top-level tables with styles, numbering, images, a hyperlink,
/// a nested table and a header referenced from the section properties
pub fn rich_document() -> Vec<u8> {
    let table_1 = format!(
        r#"<w:tbl><w:tblPr><w:tblStyle w:val="GridTable"/></w:tblPr><w:tblGrid><w:gridCol w:w="3000"/><w:gridCol w:w="3000"/></w:tblGrid><w:tr><w:tc><w:p><w:pPr><w:pStyle w:val="ListPara"/><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>Bullet</w:t></w:r></w:p></w:tc><w:tc><w:p>{}</w:p></w:tc></w:tr><w:tr><w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr>{}</w:tc></w:tr></w:tbl>"#,
        image_run("rIdImage1"),
        paragraph("Merged")
    );
    let table_2 = format!(
        r#"<w:tbl><w:tblPr/><w:tblGrid><w:gridCol w:w="6000"/></w:tblGrid><w:tr><w:tc><w:p><w:hyperlink r:id="rIdLink"><w:r><w:t>Link</w:t></w:r></w:hyperlink></w:p>{}<w:p/></w:tc></w:tr></w:tbl>"#,
        simple_table(&["Inner"])
    );
    let table_3 = format!(
        r#"<w:tbl><w:tblPr/><w:tblGrid><w:gridCol w:w="6000"/></w:tblGrid><w:tr><w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:rPr><w:rStyle w:val="Strong"/></w:rPr><w:t>Picture</w:t></w:r>{}</w:p></w:tc></w:tr><w:tr><w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc></w:tr></w:tbl>"#,
        image_run("rIdImage2")
    );
    let body = format!(
        r#"{}{table_1}{}{table_2}{}{table_3}<w:sectPr><w:headerReference w:type="default" r:id="rIdHeader"/></w:sectPr>"#,
        paragraph("Intro"),
        paragraph("Between"),
        paragraph("After")
    );

    Fixture::new(&body)
        .styles(STYLES)
        .numbering(NUMBERING)
        .relationship("rIdImage1", "image", "media/image1.png", false)
        .relationship("rIdImage2", "image", "media/image2.png", false)
        .relationship("rIdLink", "hyperlink", "https://example.com/", true)
        .relationship("rIdHeader", "header", "header1.xml", false)
        .part("word/media/image1.png", PNG_1, None)
        .part("word/media/image2.png", PNG_2, None)
        .part(
            "word/header1.xml",
            HEADER.as_bytes(),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"),
        )
        .build()
}

/// Sorted part names of a serialized package
pub fn part_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

pub fn read_part(bytes: &[u8], name: &str) -> String {
    use std::io::Read;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    text
}

/// `STYLES` with extra `w:style` elements appended
pub fn styles_with(extra: &str) -> String {
    STYLES.replace("</w:styles>", &format!("{extra}</w:styles>"))
}
