//! Word Extractor - .docx 文档解包
//!
//! .docx 是 zip 容器，正文在 word/document.xml；
//! 收集 <w:t> 文本，段落边界转为换行

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};

use crate::application::ports::{ExtractError, ExtractorPort};

/// Word 文档提取器
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// 从 WordprocessingML / DrawingML 片段收集文本
///
/// `<*:t>` 内的字符数据进入输出；`</*:p>` 与 `<*:br/>` 产生换行
pub(super) fn collect_xml_text(xml: &str, out: &mut String) -> Result<(), ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"br" => out.push('\n'),
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractError::CorruptInput(format!("bad XML text: {}", e)))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ExtractError::CorruptInput(format!("XML parse error: {}", e)));
            }
        }
    }

    Ok(())
}

/// 按名读取 zip 内的一个 XML 文件
pub(super) fn read_zip_entry(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<String, ExtractError> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| ExtractError::CorruptInput(format!("missing {}: {}", name, e)))?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| ExtractError::CorruptInput(format!("unreadable {}: {}", name, e)))?;
    Ok(xml)
}

#[async_trait]
impl ExtractorPort for DocxExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractError::CorruptInput(format!("not a docx archive: {}", e)))?;

        let xml = read_zip_entry(&mut archive, "word/document.xml")?;

        let mut text = String::new();
        collect_xml_text(&xml, &mut text)?;
        Ok(text)
    }

    fn method(&self) -> &'static str {
        "Word document parsing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::extract::test_support::build_zip;

    const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> world</w:t></w:r></w:p>
    <w:p><w:r><w:t>Second &amp; paragraph</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    #[tokio::test]
    async fn test_extracts_paragraph_text() {
        let bytes = build_zip(&[("word/document.xml", DOCUMENT_XML)]);
        let extractor = DocxExtractor::new();

        let text = extractor.extract(&bytes).await.unwrap();
        assert_eq!(text.trim(), "Hello world\nSecond & paragraph");
    }

    #[tokio::test]
    async fn test_not_a_zip_is_corrupt() {
        let extractor = DocxExtractor::new();
        let err = extractor.extract(b"plainly not a zip").await.unwrap_err();
        assert!(matches!(err, ExtractError::CorruptInput(_)));
    }

    #[tokio::test]
    async fn test_zip_without_document_xml_is_corrupt() {
        let bytes = build_zip(&[("other.xml", "<x/>")]);
        let extractor = DocxExtractor::new();
        let err = extractor.extract(&bytes).await.unwrap_err();
        assert!(matches!(err, ExtractError::CorruptInput(_)));
    }
}
