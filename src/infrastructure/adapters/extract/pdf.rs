//! PDF Extractor - 经 pdftotext 提取
//!
//! PDF 解析引擎是外部协作者（poppler 的 pdftotext），这里只做
//! 进程调用与错误归类；未安装时优雅降级为不可用

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::application::ports::{ExtractError, ExtractorPort};

/// pdftotext 提取器配置
#[derive(Debug, Clone)]
pub struct PdftotextConfig {
    /// 可执行文件名或路径
    pub executable: String,
}

impl Default for PdftotextConfig {
    fn default() -> Self {
        Self {
            executable: "pdftotext".to_string(),
        }
    }
}

/// PDF 提取器
pub struct PdftotextExtractor {
    config: PdftotextConfig,
    executable: Option<PathBuf>,
}

impl PdftotextExtractor {
    pub fn new(config: PdftotextConfig) -> Self {
        let executable = which::which(&config.executable).ok();
        if executable.is_none() {
            tracing::warn!(
                executable = %config.executable,
                "pdftotext not installed, PDF extraction unavailable"
            );
        }
        Self { config, executable }
    }

    pub fn with_defaults() -> Self {
        Self::new(PdftotextConfig::default())
    }
}

#[async_trait]
impl ExtractorPort for PdftotextExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let executable = self.executable.as_ref().ok_or_else(|| {
            ExtractError::EngineUnavailable(format!("{} not installed", self.config.executable))
        })?;

        if !bytes.starts_with(b"%PDF-") {
            return Err(ExtractError::CorruptInput(
                "missing PDF header".to_string(),
            ));
        }

        let input = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| ExtractError::EngineUnavailable(format!("temp file: {}", e)))?;
        tokio::fs::write(input.path(), bytes)
            .await
            .map_err(|e| ExtractError::EngineUnavailable(format!("temp file: {}", e)))?;

        // `-` 输出到 stdout
        let output = Command::new(executable)
            .arg("-enc")
            .arg("UTF-8")
            .arg(input.path())
            .arg("-")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ExtractError::EngineUnavailable(format!("pdftotext: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::CorruptInput(format!(
                "pdftotext exited with {}: {}",
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
        "PDF text extraction"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable() -> PdftotextExtractor {
        PdftotextExtractor::new(PdftotextConfig {
            executable: "definitely-not-installed-binary".to_string(),
        })
    }

    #[test]
    fn test_missing_binary_reports_unavailable() {
        let extractor = unavailable();
        assert!(!extractor.is_available());
    }

    #[tokio::test]
    async fn test_extract_without_engine_fails_gracefully() {
        let extractor = unavailable();
        let err = extractor.extract(b"%PDF-1.4 ...").await.unwrap_err();
        assert!(matches!(err, ExtractError::EngineUnavailable(_)));
    }
}
