//! Reading and writing the zip container
//!
//! Reading inflates every entry into memory (bounded per part); writing emits
//! `[Content_Types].xml` first, then the remaining parts in their original
//! order, with a fixed timestamp so the same package always serializes to the
//! same bytes.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use super::constants::part_name;
use super::models::{Package, PackagePart};
use crate::error::{Result, SplitError};

/// Maximum inflated size accepted for a single part (zip bomb guard)
pub const MAX_PART_BYTES: u64 = 256 * 1024 * 1024;

impl Package {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            if file.size() > MAX_PART_BYTES {
                return Err(SplitError::MalformedPackage(format!(
                    "part {} inflates to {} bytes (limit {MAX_PART_BYTES})",
                    file.name(),
                    file.size()
                )));
            }

            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.by_ref().take(MAX_PART_BYTES + 1).read_to_end(&mut data)?;
            if data.len() as u64 > MAX_PART_BYTES {
                return Err(SplitError::MalformedPackage(format!(
                    "part {name} exceeds {MAX_PART_BYTES} bytes"
                )));
            }
            parts.push(PackagePart { name, data });
        }

        Ok(Self { parts })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        let manifest = self
            .parts
            .iter()
            .filter(|p| p.name == part_name::CONTENT_TYPES);
        let rest = self
            .parts
            .iter()
            .filter(|p| p.name != part_name::CONTENT_TYPES);

        for part in manifest.chain(rest) {
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&part.data)?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

/// Check that the package looks like a Word document before parsing it
pub(crate) fn validate_word_package(package: &Package, main_part: &str) -> Result<()> {
    if !package.contains(part_name::CONTENT_TYPES) {
        return Err(SplitError::MalformedPackage(
            "missing [Content_Types].xml; this is not an Office Open XML package".to_string(),
        ));
    }

    if !package.contains(main_part) {
        if package.contains("xl/workbook.xml") {
            return Err(SplitError::MalformedPackage(
                "this appears to be an Excel file (.xlsx), not a Word document".to_string(),
            ));
        }
        if package.contains("ppt/presentation.xml") {
            return Err(SplitError::MalformedPackage(
                "this appears to be a PowerPoint file (.pptx), not a Word document".to_string(),
            ));
        }
        return Err(SplitError::MissingPart(main_part.to_string()));
    }

    Ok(())
}
