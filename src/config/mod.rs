// 配置管理模块

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 上传队列配置
    #[serde(default)]
    pub queue: QueueConfig,
    /// 文件存储服务配置
    #[serde(default)]
    pub storage: StorageConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            queue: QueueConfig::default(),
            storage: StorageConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// 上传队列配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// 最大同时上传文件数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// 单个文件大小上限（字节，默认 10MB）
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// 允许的文件 MIME 类型
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
    /// 模拟进度推进间隔（毫秒）
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    /// 每次推进的进度百分比
    #[serde(default = "default_progress_step")]
    pub progress_step: u8,
    /// 响应返回前进度的上限（避免提前显示 100%）
    #[serde(default = "default_progress_ceiling")]
    pub progress_ceiling: u8,
}

fn default_max_concurrent() -> usize {
    3
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_types() -> Vec<String> {
    [
        "application/pdf",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/vnd.ms-excel",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "image/jpeg",
        "image/jpg",
        "image/png",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_progress_interval_ms() -> u64 {
    200
}

fn default_progress_step() -> u8 {
    10
}

fn default_progress_ceiling() -> u8 {
    90
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
            progress_interval_ms: default_progress_interval_ms(),
            progress_step: default_progress_step(),
            progress_ceiling: default_progress_ceiling(),
        }
    }
}

/// 文件存储服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 上传接口地址
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer 认证令牌
    #[serde(default)]
    pub auth_token: String,
    /// 单次上传请求超时（秒）
    ///
    /// 原实现没有超时，一个挂起的请求会无限期阻塞所在批次，
    /// 这里显式加上超时让该文件正常进入失败状态
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://demo.langcore.cn/api/file".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            auth_token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 是否启用日志文件持久化
    #[serde(default = "default_log_enabled")]
    pub enabled: bool,
    /// 日志文件保存目录
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// 日志保留天数（默认 7 天）
    #[serde(default = "default_log_retention_days")]
    pub retention_days: u32,
    /// 日志级别（默认 info）
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 单个日志文件最大大小（字节，默认 50MB）
    #[serde(default = "default_log_max_file_size")]
    pub max_file_size: u64,
}

fn default_log_enabled() -> bool {
    true
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_retention_days() -> u32 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_max_file_size() -> u64 {
    50 * 1024 * 1024 // 50MB
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_log_enabled(),
            log_dir: default_log_dir(),
            retention_days: default_log_retention_days(),
            level: default_log_level(),
            max_file_size: default_log_max_file_size(),
        }
    }
}

impl AppConfig {
    /// 从文件加载配置
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .await
            .context("读取配置文件失败")?;

        let config: AppConfig = toml::from_str(&content).context("解析配置文件失败")?;

        Ok(config)
    }

    /// 保存配置到文件
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).context("序列化配置失败")?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).await.context("创建配置目录失败")?;
        }

        fs::write(path.as_ref(), content)
            .await
            .context("写入配置文件失败")?;

        Ok(())
    }

    /// 加载配置，文件不存在时生成默认配置并写回
    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load_from_file(path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("加载配置失败: {:#}, 使用默认配置", e);
                let config = Self::default();
                if let Err(e) = config.save_to_file(path).await {
                    tracing::warn!("写入默认配置失败: {:#}", e);
                }
                config
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.queue.max_concurrent, 3);
        assert_eq!(config.queue.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.queue.allowed_types.len(), 8);
        assert!(config.queue.allowed_types.contains(&"application/pdf".to_string()));
        assert_eq!(config.storage.timeout_secs, 300);
        assert_eq!(config.log.retention_days, 7);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        // 只给出部分字段时其余字段取默认值
        let config: AppConfig = toml::from_str(
            r#"
            [queue]
            max_concurrent = 5

            [storage]
            auth_token = "sk-test"
            "#,
        )
        .unwrap();

        assert_eq!(config.queue.max_concurrent, 5);
        assert_eq!(config.queue.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.storage.auth_token, "sk-test");
        assert_eq!(config.storage.endpoint, default_endpoint());
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.queue.max_concurrent = 2;
        config.storage.endpoint = "https://example.com/api/file".to_string();

        config.save_to_file(&path).await.unwrap();
        let loaded = AppConfig::load_from_file(&path).await.unwrap();

        assert_eq!(loaded.queue.max_concurrent, 2);
        assert_eq!(loaded.storage.endpoint, "https://example.com/api/file");
    }

    #[tokio::test]
    async fn test_load_or_default_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let config = AppConfig::load_or_default(&path).await;
        assert_eq!(config.queue.max_concurrent, 3);
        assert!(path.exists());
    }
}
