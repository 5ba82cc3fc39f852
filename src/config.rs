use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 配置文件路径的环境变量名
const CONFIG_PATH_ENV: &str = "MARKAI_CONFIG";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// 模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// ONNX 模型文件路径
    #[serde(default = "ModelConfig::default_path")]
    pub path: String,
    /// 模型输入边长（正方形）
    #[serde(default = "ModelConfig::default_input_size")]
    pub input_size: u32,
    /// 推理线程数（0=交给 ONNX Runtime 自行决定）
    #[serde(default)]
    pub intra_threads: usize,
}

impl ModelConfig {
    fn default_path() -> String {
        "models/model.onnx".to_string()
    }
    fn default_input_size() -> u32 {
        224
    }

    pub fn model_path(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            input_size: Self::default_input_size(),
            intra_threads: 0,
        }
    }
}

/// 远程图片抓取配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// 单次抓取超时（秒）
    #[serde(default = "FetchConfig::default_timeout")]
    pub timeout_secs: u64,
    /// 请求使用的 User-Agent
    #[serde(default = "FetchConfig::default_user_agent")]
    pub user_agent: String,
    /// 是否接受无效 TLS 证书（与旧服务保持一致，默认接受）
    #[serde(default = "FetchConfig::default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
    /// 单张图片最大字节数
    #[serde(default = "FetchConfig::default_max_bytes")]
    pub max_bytes: u64,
}

impl FetchConfig {
    fn default_timeout() -> u64 {
        8
    }
    fn default_user_agent() -> String {
        "Mozilla/5.0".to_string()
    }
    fn default_accept_invalid_certs() -> bool {
        true
    }
    fn default_max_bytes() -> u64 {
        20 * 1024 * 1024
    }

    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
            user_agent: Self::default_user_agent(),
            accept_invalid_certs: Self::default_accept_invalid_certs(),
            max_bytes: Self::default_max_bytes(),
        }
    }
}

/// 批量分类接口（/classify）配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// 输出中代表 “AI 生成” 的类别下标
    #[serde(default = "ClassifyConfig::default_ai_class_index")]
    pub ai_class_index: usize,
    /// 单次请求最多图片数
    #[serde(default = "ClassifyConfig::default_max_images")]
    pub max_images: usize,
    /// 单次请求内并发抓取数
    #[serde(default = "ClassifyConfig::default_fetch_concurrency")]
    pub fetch_concurrency: usize,
}

impl ClassifyConfig {
    fn default_ai_class_index() -> usize {
        1
    }
    fn default_max_images() -> usize {
        64
    }
    fn default_fetch_concurrency() -> usize {
        8
    }
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            ai_class_index: Self::default_ai_class_index(),
            max_images: Self::default_max_images(),
            fetch_concurrency: Self::default_fetch_concurrency(),
        }
    }
}

/// 单图分析接口（/analyze）配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeConfig {
    /// 输出中代表 “AI 生成” 的类别下标（旧部署使用 0，与 /classify 不一致）
    #[serde(default)]
    pub ai_class_index: usize,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    #[serde(default = "CorsConfig::default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// 是否允许携带凭证（Cookie/Authorization）
    #[serde(default = "CorsConfig::default_allow_credentials")]
    pub allow_credentials: bool,
}

impl CorsConfig {
    fn default_allowed_origins() -> Vec<String> {
        vec!["*".to_string()]
    }
    fn default_allow_credentials() -> bool {
        true
    }

    /// 完全放开的 CORS（/analyze 服务固定使用）
    pub fn wide_open() -> Self {
        Self::default()
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Self::default_allowed_origins(),
            allow_credentials: Self::default_allow_credentials(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（RUST_LOG 优先）
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub classify: ClassifyConfig,
    #[serde(default)]
    pub analyze: AnalyzeConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// 从配置文件加载配置，支持环境变量覆盖
    ///
    /// 优先级（低 → 高）：内置默认值 → config.toml → `APP_` 前缀变量 → 旧版扁平变量
    /// （`MODEL_PATH`/`INPUT_SIZE`/`HOST`/`PORT`/`ALLOW_ORIGINS`）。
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        let builder = ConfigBuilder::builder()
            .add_source(ConfigBuilder::try_from(&AppConfig::default())?)
            .add_source(File::from(config_path).required(false))
            // 例如：APP_MODEL__PATH、APP_SERVER__PORT
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = apply_legacy_env(builder, |key| std::env::var(key).ok())?
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 校验取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.input_size == 0 {
            return Err(ConfigError::Message("model.input_size 必须大于 0".into()));
        }
        if self.classify.max_images == 0 {
            return Err(ConfigError::Message("classify.max_images 必须大于 0".into()));
        }
        if self.classify.fetch_concurrency == 0 {
            return Err(ConfigError::Message(
                "classify.fetch_concurrency 必须大于 0".into(),
            ));
        }
        for (name, idx) in [
            ("classify.ai_class_index", self.classify.ai_class_index),
            ("analyze.ai_class_index", self.analyze.ai_class_index),
        ] {
            if idx > 1 {
                return Err(ConfigError::Message(format!(
                    "{name} 只能是 0 或 1（二分类模型），当前为 {idx}"
                )));
            }
        }
        Ok(())
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<&'static AppConfig, ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        CONFIG
            .get()
            .ok_or_else(|| ConfigError::Message("配置初始化失败".to_string()))
    }

    /// 获取配置文件路径（`MARKAI_CONFIG` 优先）
    pub fn config_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// 应用旧版扁平环境变量覆盖。
fn apply_legacy_env<F>(
    mut builder: config::ConfigBuilder<config::builder::DefaultState>,
    lookup: F,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    builder = builder
        .set_override_option("model.path", lookup("MODEL_PATH"))?
        .set_override_option("server.host", lookup("HOST"))?;

    if let Some(raw) = lookup("INPUT_SIZE") {
        let size: u32 = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Message(format!("INPUT_SIZE 无效: {raw}")))?;
        builder = builder.set_override("model.input_size", i64::from(size))?;
    }
    if let Some(raw) = lookup("PORT") {
        let port: u16 = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Message(format!("PORT 无效: {raw}")))?;
        builder = builder.set_override("server.port", i64::from(port))?;
    }
    if let Some(raw) = lookup("ALLOW_ORIGINS") {
        builder = builder.set_override("cors.allowed_origins", split_origins(&raw))?;
    }
    Ok(builder)
}

/// 逗号分隔的 Origin 列表，去掉空白与空项。
pub fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
