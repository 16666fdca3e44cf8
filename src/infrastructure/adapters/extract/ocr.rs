//! OCR Extractor - 经 tesseract 提取图片文字
//!
//! OCR 引擎是外部协作者，未安装时优雅降级为不可用而非崩溃

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::application::ports::{ExtractError, ExtractorPort};

/// tesseract 提取器配置
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    /// 可执行文件名或路径
    pub executable: String,
    /// 识别语言组合，如 "eng+urd"
    pub languages: String,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            executable: "tesseract".to_string(),
            languages: "eng+urd".to_string(),
        }
    }
}

/// OCR 提取器
pub struct TesseractOcrExtractor {
    config: TesseractConfig,
    executable: Option<PathBuf>,
}

impl TesseractOcrExtractor {
    pub fn new(config: TesseractConfig) -> Self {
        let executable = which::which(&config.executable).ok();
        if executable.is_none() {
            tracing::warn!(
                executable = %config.executable,
                "tesseract not installed, OCR extraction unavailable"
            );
        }
        Self { config, executable }
    }

    pub fn with_defaults() -> Self {
        Self::new(TesseractConfig::default())
    }
}

#[async_trait]
impl ExtractorPort for TesseractOcrExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let executable = self.executable.as_ref().ok_or_else(|| {
            ExtractError::EngineUnavailable(format!("{} not installed", self.config.executable))
        })?;

        let input = tempfile::NamedTempFile::new()
            .map_err(|e| ExtractError::EngineUnavailable(format!("temp file: {}", e)))?;
        tokio::fs::write(input.path(), bytes)
            .await
            .map_err(|e| ExtractError::EngineUnavailable(format!("temp file: {}", e)))?;

        // tesseract <input> stdout -l <langs>
        let output = Command::new(executable)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.languages)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ExtractError::EngineUnavailable(format!("tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::CorruptInput(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn is_available(&self) -> bool {
        self.executable.is_some()
    }

    fn method(&self) -> &'static str {
        "OCR (Optical Character Recognition)"
    }
}
