//! HTTP Speech Client - 在线合成后端
//!
//! 实现 SpeechBackendPort trait，通过 HTTP 调用外部语音合成服务
//!
//! 外部 API:
//! POST {base_url}/api/tts/synthesize
//! Request: {"text": "...", "language": "en"}  (JSON)
//! Response: audio 二进制，Content-Type 标注格式

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{ProducedAudio, SpeechBackendPort, SynthesisError};
use crate::domain::speech::{AudioFormat, Language};

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct SpeechHttpRequest {
    text: String,
    language: String,
}

/// HTTP 合成客户端配置
#[derive(Debug, Clone)]
pub struct HttpSpeechClientConfig {
    /// 合成服务基础 URL
    pub base_url: String,
    /// 单次请求超时时间（秒）
    pub timeout_secs: u64,
    /// 后端标识（参与缓存 key）
    pub identity: String,
}

impl Default for HttpSpeechClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 60,
            identity: "online".to_string(),
        }
    }
}

impl HttpSpeechClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 合成客户端
///
/// 联网后端，音质高但受超时/配额/网络故障影响；
/// 重试与回退策略由 BackendSelector 负责，这里只做单次调用与错误归类
pub struct HttpSpeechClient {
    client: Client,
    config: HttpSpeechClientConfig,
}

impl HttpSpeechClient {
    /// 创建新的 HTTP 合成客户端
    pub fn new(config: HttpSpeechClientConfig) -> Result<Self, SynthesisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn synthesize_url(&self) -> String {
        format!("{}/api/tts/synthesize", self.config.base_url)
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url)
    }
}

#[async_trait]
impl SpeechBackendPort for HttpSpeechClient {
    async fn synthesize(
        &self,
        text: &str,
        language: &Language,
    ) -> Result<ProducedAudio, SynthesisError> {
        let request = SpeechHttpRequest {
            text: text.to_string(),
            language: language.to_string(),
        };

        tracing::debug!(
            url = %self.synthesize_url(),
            text_len = request.text.len(),
            language = %request.language,
            "Sending speech synthesis request"
        );

        let response = self
            .client
            .post(self.synthesize_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisError::Timeout
                } else if e.is_connect() {
                    SynthesisError::Network(format!("Cannot connect to speech service: {}", e))
                } else {
                    SynthesisError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SynthesisError::QuotaExceeded);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Service(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        // Content-Type 决定音频格式，服务默认产出 mp3
        let format = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| {
                if ct.contains("wav") {
                    AudioFormat::Wav
                } else {
                    AudioFormat::Mp3
                }
            })
            .unwrap_or(AudioFormat::Mp3);

        let data = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        if data.is_empty() {
            return Err(SynthesisError::InvalidResponse(
                "Service returned empty audio".to_string(),
            ));
        }

        tracing::info!(
            language = %language,
            audio_size = data.len(),
            format = ?format,
            "Online synthesis completed"
        );

        Ok(ProducedAudio {
            data,
            format,
            backend: self.config.identity.clone(),
        })
    }

    fn supports_language(&self, _language: &Language) -> bool {
        // 语言支持由远端服务裁决，不支持时以 Service 错误返回
        true
    }

    fn identity(&self) -> &str {
        &self.config.identity
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
