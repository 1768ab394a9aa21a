//! Format detection for template files.
//!
//! Templates are supplied by operators as arbitrary files, so they are sniffed
//! before being parsed: a `.docx` renamed to `dark.pptx` should fail with a
//! clear message at startup rather than with a missing-part error later.

use crate::container::decode_xml_bytes;
use crate::error::{Error, Result};
use crate::package::content_type;
use std::io::{Cursor, Read};
use std::path::Path;

/// Local file header signature that every ZIP archive starts with.
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Office package kinds told apart by their main part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatType {
    Docx,
    Xlsx,
    Pptx,
}

/// Main-part content type and top-level folder of each kind.
const SIGNATURES: [(FormatType, &str, &str); 3] = [
    (FormatType::Pptx, content_type::PML_PRESENTATION_MAIN, "ppt/"),
    (
        FormatType::Docx,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        "word/",
    ),
    (
        FormatType::Xlsx,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
        "xl/",
    ),
];

impl FormatType {
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Docx => "docx",
            FormatType::Xlsx => "xlsx",
            FormatType::Pptx => "pptx",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FormatType::Docx => "Word Document",
            FormatType::Xlsx => "Excel Workbook",
            FormatType::Pptx => "PowerPoint Presentation",
        }
    }
}

impl std::fmt::Display for FormatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub fn detect_format_from_path(path: impl AsRef<Path>) -> Result<FormatType> {
    detect_format_from_bytes(&std::fs::read(path)?)
}

/// Identify a package from `[Content_Types].xml`, falling back to its folder
/// layout when no known main part is declared.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<FormatType> {
    if !is_zip_file(data) {
        return Err(Error::UnknownFormat);
    }
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;

    let mut raw = Vec::new();
    archive
        .by_name("[Content_Types].xml")
        .map_err(|_| Error::MissingComponent("[Content_Types].xml".to_string()))?
        .read_to_end(&mut raw)?;
    let declared = decode_xml_bytes(&raw)?;

    if let Some((format, _, _)) = SIGNATURES.iter().find(|(_, ct, _)| declared.contains(ct)) {
        return Ok(*format);
    }

    let mut by_folder = SIGNATURES
        .iter()
        .filter(|(_, _, dir)| archive.file_names().any(|n| n.starts_with(dir)));
    match (by_folder.next(), by_folder.next()) {
        (Some((format, _, _)), None) => Ok(*format),
        _ => Err(Error::UnknownFormat),
    }
}

/// Fail unless `data` is a PowerPoint package.
pub fn ensure_presentation(data: &[u8]) -> Result<()> {
    match detect_format_from_bytes(data)? {
        FormatType::Pptx => Ok(()),
        other => Err(Error::UnsupportedFormat(other.name().to_string())),
    }
}

pub fn is_zip_file(data: &[u8]) -> bool {
    data.starts_with(ZIP_SIGNATURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Package;

    fn package_with_types(main_type: &str) -> Vec<u8> {
        let mut package = Package::new();
        package.set_part(
            "[Content_Types].xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Override PartName="/main.xml" ContentType="{}"/></Types>"#,
                main_type
            ),
        );
        package.set_part("main.xml", "<root/>");
        package.to_bytes().unwrap()
    }

    #[test]
    fn test_format_names() {
        assert_eq!(FormatType::Pptx.to_string(), "PowerPoint Presentation");
        assert_eq!(FormatType::Xlsx.extension(), "xlsx");
    }

    #[test]
    fn test_zip_signature() {
        assert!(is_zip_file(b"PK\x03\x04rest"));
        assert!(!is_zip_file(b"PK"));
        assert!(matches!(
            detect_format_from_bytes(b"%PDF-1.7"),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_detect_presentation_by_content_type() {
        let data = package_with_types(content_type::PML_PRESENTATION_MAIN);
        assert_eq!(detect_format_from_bytes(&data).unwrap(), FormatType::Pptx);
        assert!(ensure_presentation(&data).is_ok());
    }

    #[test]
    fn test_detect_by_folder_layout() {
        let mut package = Package::new();
        package.set_part(
            "[Content_Types].xml",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#,
        );
        package.set_part("xl/workbook.xml", "<workbook/>");
        let data = package.to_bytes().unwrap();
        assert_eq!(detect_format_from_bytes(&data).unwrap(), FormatType::Xlsx);
    }

    #[test]
    fn test_word_document_is_rejected_as_template() {
        let data = package_with_types(SIGNATURES[1].1);
        assert_eq!(detect_format_from_bytes(&data).unwrap(), FormatType::Docx);
        assert!(matches!(
            ensure_presentation(&data),
            Err(Error::UnsupportedFormat(name)) if name == "Word Document"
        ));
    }
}
