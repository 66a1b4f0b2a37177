use async_trait::async_trait;

/// 文本生成模型：输入提示词，返回模型文本
#[async_trait]
pub trait FeedbackModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

/// 语言模型调用错误
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("API key variable {0} is not set")]
    MissingApiKey(String),
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Model returned no text")]
    EmptyResponse,
    #[error("Model call timed out after {0:?}")]
    Timeout(std::time::Duration),
}
