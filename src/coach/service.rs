use std::sync::Arc;
use std::time::Duration;
use log::{info, warn};
use rand::Rng;

use crate::config::{ModelConfig, PromptConfig};
use super::model::{FeedbackModel, ModelError};

/// 模型调用的超时与重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// 第 attempt 次重试前的等待时间：指数退避加随机抖动
    fn delay(&self, attempt: u32) -> Duration {
        let base = self.backoff.saturating_mul(1u32 << attempt.min(16));
        let jitter_ms = self.backoff.as_millis() as u64 / 2;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

/// 教练反馈服务：包装语言模型，负责超时、重试和失败兜底
#[derive(Clone)]
pub struct CoachService {
    model: Arc<dyn FeedbackModel>,
    policy: RetryPolicy,
    fallback: String,
}

impl CoachService {
    pub fn new(model: Arc<dyn FeedbackModel>, policy: RetryPolicy, fallback: String) -> Self {
        Self {
            model,
            policy,
            fallback,
        }
    }

    pub fn from_config(model: Arc<dyn FeedbackModel>, model_config: &ModelConfig, prompt: &PromptConfig) -> Self {
        Self::new(
            model,
            RetryPolicy::from_config(model_config),
            prompt.fallback_message.clone(),
        )
    }

    /// 获取反馈文本；所有尝试都失败时返回兜底文本
    pub async fn feedback(&self, prompt: &str) -> String {
        match self.try_feedback(prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Model feedback unavailable, sending fallback: {}", e);
                self.fallback.clone()
            }
        }
    }

    pub async fn try_feedback(&self, prompt: &str) -> Result<String, ModelError> {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.policy.timeout, self.model.generate(prompt)).await {
                Ok(result) => result,
                Err(_) => Err(ModelError::Timeout(self.policy.timeout)),
            };

            match result {
                Ok(text) => {
                    if attempt > 0 {
                        info!("Model call succeeded after {} retries", attempt);
                    }
                    return Ok(text);
                }
                // 缺少密钥时重试没有意义
                Err(e @ ModelError::MissingApiKey(_)) => return Err(e),
                Err(e) if attempt >= self.policy.max_retries => return Err(e),
                Err(e) => {
                    let delay = self.policy.delay(attempt);
                    warn!("Model call failed (attempt {}): {}, retrying in {:?}", attempt + 1, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
