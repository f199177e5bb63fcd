// Order Intake Rust Library
// 采购订单文档接收核心库：多文件上传队列与并发受限的批量处理引擎

// 配置管理模块
pub mod config;

// 日志模块
pub mod logging;

// 错误类型
pub mod error;

// 文件存储服务客户端（上传传输）
pub mod storage;

// 上传队列核心
pub mod queue;

// 导出常用类型
pub use config::{AppConfig, QueueConfig, StorageConfig};
pub use error::{IntakeError, Result};
pub use queue::{
    FilePayload, QueueItem, QueueSnapshot, UploadCallback, UploadQueue, UploadStatus,
};
pub use storage::{FileStorageClient, UploadTransport, UploadedFile};
