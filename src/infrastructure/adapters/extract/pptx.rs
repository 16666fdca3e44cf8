//! Presentation Extractor - .pptx 演示文稿解包
//!
//! 幻灯片在 ppt/slides/slideN.xml，按编号顺序收集 <a:t> 文本

use async_trait::async_trait;
use std::io::Cursor;

use crate::application::ports::{ExtractError, ExtractorPort};

use super::docx::{collect_xml_text, read_zip_entry};

/// 演示文稿提取器
pub struct PptxExtractor;

impl PptxExtractor {
    pub fn new() -> Self {
        Self
    }

    /// ppt/slides/slideN.xml -> N
    fn slide_number(name: &str) -> Option<u32> {
        let rest = name.strip_prefix("ppt/slides/slide")?;
        let digits = rest.strip_suffix(".xml")?;
        digits.parse().ok()
    }
}

impl Default for PptxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractorPort for PptxExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractError::CorruptInput(format!("not a pptx archive: {}", e)))?;

        let mut slides: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|name| Self::slide_number(name).map(|n| (n, name.to_string())))
            .collect();
        slides.sort_by_key(|(n, _)| *n);

        if slides.is_empty() {
            return Err(ExtractError::CorruptInput("no slides found".to_string()));
        }

        let mut text = String::new();
        for (_, name) in slides {
            let xml = read_zip_entry(&mut archive, &name)?;
            collect_xml_text(&xml, &mut text)?;
            if !text.ends_with('\n') {
                text.push('\n');
            }
        }

        Ok(text)
    }

    fn method(&self) -> &'static str {
        "PowerPoint slide parsing"
    }
}
