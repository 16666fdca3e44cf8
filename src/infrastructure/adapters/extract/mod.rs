//! Extraction Adapters - 提取策略实现
//!
//! 每种媒体类型一个适配器，重型引擎（PDF/OCR）走外部程序

mod docx;
mod ocr;
mod pdf;
mod plain_text;
mod pptx;

pub use docx::DocxExtractor;
pub use ocr::{TesseractConfig, TesseractOcrExtractor};
pub use pdf::{PdftotextConfig, PdftotextExtractor};
pub use plain_text::PlainTextExtractor;
pub use pptx::PptxExtractor;
