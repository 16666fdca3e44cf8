//! Fake Speech Client - 用于测试的合成后端
//!
//! 按输入确定性生成音频字节，不调用任何真实引擎；
//! 带调用计数器，用于断言幂等与 single-flight 性质

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::application::ports::{ProducedAudio, SpeechBackendPort, SynthesisError};
use crate::domain::speech::{AudioFormat, Language};

/// Fake 合成客户端
pub struct FakeSpeechClient {
    identity: String,
    /// 始终返回瞬时错误
    fail: bool,
    /// 有音色的语言，None 表示全部支持
    voices: Option<Vec<String>>,
    calls: AtomicU64,
}

impl FakeSpeechClient {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            fail: false,
            voices: None,
            calls: AtomicU64::new(0),
        }
    }

    /// 始终失败的后端（瞬时网络错误）
    pub fn failing(identity: impl Into<String>) -> Self {
        Self {
            fail: true,
            ..Self::new(identity)
        }
    }

    /// 限定音色覆盖
    pub fn with_voices(mut self, voices: Vec<&str>) -> Self {
        self.voices = Some(voices.into_iter().map(String::from).collect());
        self
    }

    /// synthesize 被调用的次数
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechBackendPort for FakeSpeechClient {
    async fn synthesize(
        &self,
        text: &str,
        language: &Language,
    ) -> Result<ProducedAudio, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(SynthesisError::Network("fake backend down".to_string()));
        }

        // 由输入确定性派生的伪音频
        let digest = md5::compute(format!("{}\u{1f}{}\u{1f}{}", text, language, self.identity));
        let data: Vec<u8> = digest.0.iter().cycle().take(64).copied().collect();

        Ok(ProducedAudio {
            data,
            format: AudioFormat::Wav,
            backend: self.identity.clone(),
        })
    }

    fn supports_language(&self, language: &Language) -> bool {
        match &self.voices {
            Some(voices) => voices.iter().any(|v| v == language.as_str()),
            None => true,
        }
    }

    fn identity(&self) -> &str {
        &self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_audio_is_deterministic() {
        let client = FakeSpeechClient::new("fake");
        let a = client
            .synthesize("hello", &Language::english())
            .await
            .unwrap();
        let b = client
            .synthesize("hello", &Language::english())
            .await
            .unwrap();
        let c = client
            .synthesize("other", &Language::english())
            .await
            .unwrap();

        assert_eq!(a.data, b.data);
        assert_ne!(a.data, c.data);
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_failing_client_reports_transient_error() {
        let client = FakeSpeechClient::failing("fake");
        let err = client
            .synthesize("hello", &Language::english())
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_voice_restriction() {
        let client = FakeSpeechClient::new("fake").with_voices(vec!["en"]);
        assert!(client.supports_language(&Language::english()));
        assert!(!client.supports_language(&Language::urdu()));
    }
}
