//! Backend Selector - 合成后端选择与回退
//!
//! 按请求模式选择在线/离线后端；在线瞬时故障在有限次退避重试后
//! 回退到离线后端，回退结果带降级标记而非直接失败

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{ProducedAudio, SpeechBackendPort, SynthesisError};
use crate::domain::speech::{Language, SynthesisMode};

/// 重试配置
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 在线后端瞬时故障的最大重试次数
    pub max_retries: u32,
    /// 线性退避基数（毫秒），第 n 次重试前等待 n * backoff_ms
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_ms: 500,
        }
    }
}

/// 选择结果
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub audio: ProducedAudio,
    /// 请求的是在线但实际由离线产出
    pub degraded: bool,
}

/// 合成后端选择器
pub struct BackendSelector {
    online: Arc<dyn SpeechBackendPort>,
    offline: Arc<dyn SpeechBackendPort>,
    retry: RetryConfig,
}

impl BackendSelector {
    pub fn new(
        online: Arc<dyn SpeechBackendPort>,
        offline: Arc<dyn SpeechBackendPort>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            online,
            offline,
            retry,
        }
    }

    /// 某模式首选后端的标识（参与缓存 key 计算）
    pub fn primary_identity(&self, mode: SynthesisMode) -> &str {
        match mode {
            SynthesisMode::Online => self.online.identity(),
            SynthesisMode::Offline => self.offline.identity(),
        }
    }

    /// 执行合成
    ///
    /// - offline 模式: 直接走离线后端，语言无音色则失败
    /// - online 模式: 有限次重试瞬时故障，耗尽后回退离线（若该语言有离线音色）
    pub async fn synthesize(
        &self,
        text: &str,
        language: &Language,
        mode: SynthesisMode,
    ) -> Result<SelectionOutcome, SynthesisError> {
        match mode {
            SynthesisMode::Offline => {
                let audio = self.synthesize_offline(text, language).await?;
                Ok(SelectionOutcome {
                    audio,
                    degraded: false,
                })
            }
            SynthesisMode::Online => match self.synthesize_online(text, language).await {
                Ok(audio) => Ok(SelectionOutcome {
                    audio,
                    degraded: false,
                }),
                Err(online_err) => {
                    if !self.offline.supports_language(language) {
                        tracing::error!(
                            language = %language,
                            error = %online_err,
                            "Online synthesis failed and no offline voice available"
                        );
                        return Err(online_err);
                    }

                    tracing::warn!(
                        language = %language,
                        error = %online_err,
                        "Online synthesis exhausted, falling back to offline"
                    );

                    let audio = self.synthesize_offline(text, language).await?;
                    Ok(SelectionOutcome {
                        audio,
                        degraded: true,
                    })
                }
            },
        }
    }

    async fn synthesize_offline(
        &self,
        text: &str,
        language: &Language,
    ) -> Result<ProducedAudio, SynthesisError> {
        if !self.offline.supports_language(language) {
            return Err(SynthesisError::VoiceUnavailable(language.to_string()));
        }
        self.offline.synthesize(text, language).await
    }

    /// 在线合成，瞬时故障线性退避重试
    async fn synthesize_online(
        &self,
        text: &str,
        language: &Language,
    ) -> Result<ProducedAudio, SynthesisError> {
        let mut attempt = 0u32;
        loop {
            match self.online.synthesize(text, language).await {
                Ok(audio) => return Ok(audio),
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = Duration::from_millis(self.retry.backoff_ms * u64::from(attempt));
                    tracing::debug!(
                        attempt = attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient online failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
