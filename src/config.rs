use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::batching::throttle::interval_from_secs;

/// 应用配置管理模块
/// 集中管理所有配置项，提供默认值和配置验证

pub const CONFIG_PATH_ENV: &str = "THROW_COACH_CONFIG";
pub const HOST_ENV: &str = "THROW_COACH_HOST";
pub const PORT_ENV: &str = "THROW_COACH_PORT";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

const DEFAULT_INSTRUCTION: &str = "Use this data to determine if the throw technique matches good throwing mechanics. \
Pretend you are a coach and you are giving advice to someone keep it very short in your response on what they should \
improve for the next throw pretend to just know what the guy should improve on like you actually saw them throw";

/// 主配置结构
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub batching: BatchingConfig,
    pub model: ModelConfig,
    pub prompt: PromptConfig,
    pub logging: LoggingConfig,
}

/// 服务监听配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `"*"` 表示允许任意来源
    pub cors_origins: Vec<String>,
}

/// 批处理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    pub http_batch_size: usize,
    pub stream_batch_size: usize,
    pub stream_throttle_secs: u64,
}

/// 语言模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    /// 保存 API 密钥的环境变量名
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

/// 提示词配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub instruction: String,
    /// 模型调用全部失败时返回给客户端的文本
    pub fallback_message: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// 终端彩色输出
    pub color: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            http_batch_size: 5,
            stream_batch_size: 30,
            stream_throttle_secs: 60,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMENI_API_KEY".to_string(),
            timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            instruction: DEFAULT_INSTRUCTION.to_string(),
            fallback_message: "Coaching feedback is unavailable right now. Keep throwing and try again in a moment."
                .to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            color: true,
        }
    }
}

impl AppConfig {
    /// 按 环境变量指定路径 > config.toml > 默认值 的顺序加载，再应用环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok(); // 加载 .env 文件

        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load_from_file(DEFAULT_CONFIG_PATH)?,
            Err(_) => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::IoError(path.as_ref().to_path_buf(), e))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)
            .map_err(ConfigError::ParseError)?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var(HOST_ENV) {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var(PORT_ENV) {
            self.server.port = port
                .parse::<u16>()
                .map_err(|e| ConfigError::ValidationError(format!("{} is not a valid port: {}", PORT_ENV, e)))?;
        }
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batching.http_batch_size == 0 || self.batching.stream_batch_size == 0 {
            return Err(ConfigError::ValidationError("Batch sizes must be positive".to_string()));
        }

        if interval_from_secs(self.batching.stream_throttle_secs).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "Stream throttle of {}s is out of range",
                self.batching.stream_throttle_secs
            )));
        }

        if self.model.timeout_secs == 0 {
            return Err(ConfigError::ValidationError("Model timeout must be positive".to_string()));
        }

        if self.model.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("Model name must not be empty".to_string()));
        }

        if self.model.api_key_env.trim().is_empty() {
            return Err(ConfigError::ValidationError("API key variable name must not be empty".to_string()));
        }

        Ok(())
    }

    /// 获取监听地址
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("Invalid listen address: {}", e)))
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {0}: {1}")]
    IoError(PathBuf, std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(toml::de::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}
