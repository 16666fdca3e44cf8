//! Plain Text Extractor - 纯文本直读
//!
//! 尝试 UTF-8 / UTF-16（带 BOM），失败时有损回退，不会报错

use async_trait::async_trait;

use crate::application::ports::{ExtractError, ExtractorPort};

/// 纯文本提取器
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn decode(bytes: &[u8]) -> String {
        // UTF-8 BOM
        let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

        // UTF-16 BOM
        if let Some(body) = bytes.strip_prefix(&[0xFF, 0xFE]) {
            return Self::decode_utf16(body, u16::from_le_bytes);
        }
        if let Some(body) = bytes.strip_prefix(&[0xFE, 0xFF]) {
            return Self::decode_utf16(body, u16::from_be_bytes);
        }

        String::from_utf8_lossy(bytes).to_string()
    }

    fn decode_utf16(body: &[u8], combine: fn([u8; 2]) -> u16) -> String {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| combine([pair[0], pair[1]]))
            .collect();
        char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractorPort for PlainTextExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        Ok(Self::decode(bytes))
    }

    fn method(&self) -> &'static str {
        "Direct text reading"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_utf8() {
        let extractor = PlainTextExtractor::new();
        let text = extractor.extract("Hello, world".as_bytes()).await.unwrap();
        assert_eq!(text, "Hello, world");
    }

    #[tokio::test]
    async fn test_utf8_with_bom() {
        let extractor = PlainTextExtractor::new();
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("hi".as_bytes());
        assert_eq!(extractor.extract(&bytes).await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_utf16_le() {
        let extractor = PlainTextExtractor::new();
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "héllo".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(extractor.extract(&bytes).await.unwrap(), "héllo");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_lossy_not_error() {
        let extractor = PlainTextExtractor::new();
        let text = extractor.extract(&[0x68, 0x69, 0xFF]).await.unwrap();
        assert!(text.starts_with("hi"));
    }
}
