//! eSpeak Speech Client - 离线合成后端
//!
//! 调用本机 espeak-ng 生成 WAV。本地保底后端: 无需网络，音质较低，
//! 音色覆盖取决于配置的语言列表

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::application::ports::{ProducedAudio, SpeechBackendPort, SynthesisError};
use crate::domain::speech::{AudioFormat, Language};

/// eSpeak 客户端配置
#[derive(Debug, Clone)]
pub struct EspeakClientConfig {
    /// 可执行文件名或路径
    pub executable: String,
    /// 有音色的语言标签
    pub voices: Vec<String>,
    /// 语速（每分钟词数）
    pub speed_wpm: u32,
    /// 后端标识（参与缓存 key）
    pub identity: String,
}

impl Default for EspeakClientConfig {
    fn default() -> Self {
        Self {
            executable: "espeak-ng".to_string(),
            voices: vec!["en".to_string(), "ur".to_string()],
            speed_wpm: 140,
            identity: "offline".to_string(),
        }
    }
}

/// eSpeak 合成客户端
pub struct EspeakSpeechClient {
    config: EspeakClientConfig,
    /// 构造时探测到的可执行文件路径，未安装则为 None
    executable: Option<PathBuf>,
}

impl EspeakSpeechClient {
    /// 创建客户端，探测 espeak-ng 是否安装
    ///
    /// 未安装不报错: 后端降级为不可用，合成时返回 EngineUnavailable
    pub fn new(config: EspeakClientConfig) -> Self {
        let executable = which::which(&config.executable).ok();
        match &executable {
            Some(path) => {
                tracing::info!(path = %path.display(), "espeak-ng found");
            }
            None => {
                tracing::warn!(
                    executable = %config.executable,
                    "espeak-ng not installed, offline synthesis unavailable"
                );
            }
        }
        Self { config, executable }
    }

    pub fn with_defaults() -> Self {
        Self::new(EspeakClientConfig::default())
    }

    async fn run_espeak(
        &self,
        text: &str,
        language: &Language,
    ) -> Result<Vec<u8>, SynthesisError> {
        let executable = self.executable.as_ref().ok_or_else(|| {
            SynthesisError::EngineUnavailable(format!("{} not installed", self.config.executable))
        })?;

        let output_file = tempfile::Builder::new()
            .suffix(".wav")
            .tempfile()
            .map_err(|e| SynthesisError::Service(format!("Failed to create temp file: {}", e)))?;

        let mut child = Command::new(executable)
            .arg("-v")
            .arg(language.as_str())
            .arg("-s")
            .arg(self.config.speed_wpm.to_string())
            .arg("-w")
            .arg(output_file.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SynthesisError::EngineUnavailable(format!(
                        "{} not found",
                        self.config.executable
                    ))
                } else {
                    SynthesisError::Service(format!("Failed to run espeak-ng: {}", e))
                }
            })?;

        // 文本走 stdin，避免命令行长度限制
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| SynthesisError::Service(format!("Failed to write stdin: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SynthesisError::Service(format!("Failed to wait for espeak-ng: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SynthesisError::Service(format!(
                "espeak-ng exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let data = tokio::fs::read(output_file.path())
            .await
            .map_err(|e| SynthesisError::Service(format!("Failed to read output: {}", e)))?;

        if data.is_empty() {
            return Err(SynthesisError::InvalidResponse(
                "espeak-ng produced empty output".to_string(),
            ));
        }

        Ok(data)
    }
}

#[async_trait]
impl SpeechBackendPort for EspeakSpeechClient {
    async fn synthesize(
        &self,
        text: &str,
        language: &Language,
    ) -> Result<ProducedAudio, SynthesisError> {
        if !self.supports_language(language) {
            return Err(SynthesisError::VoiceUnavailable(language.to_string()));
        }

        tracing::debug!(
            language = %language,
            text_len = text.len(),
            "Running offline synthesis"
        );

        let data = self.run_espeak(text, language).await?;

        tracing::info!(
            language = %language,
            audio_size = data.len(),
            "Offline synthesis completed"
        );

        Ok(ProducedAudio {
            data,
            format: AudioFormat::Wav,
            backend: self.config.identity.clone(),
        })
    }

    fn supports_language(&self, language: &Language) -> bool {
        self.config.voices.iter().any(|v| v == language.as_str())
    }

    fn identity(&self) -> &str {
        &self.config.identity
    }

    async fn health_check(&self) -> bool {
        self.executable.is_some()
    }
}
