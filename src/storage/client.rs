// 文件存储服务客户端
//
// 负责单个文件到远端存储服务的 multipart 上传，
// 并把各种失败形态（非 2xx、响应无法解析、缺少 fileId）归一化为统一的上传错误

use crate::config::StorageConfig;
use crate::error::{IntakeError, Result};
use crate::queue::item::FilePayload;
use crate::storage::types::{UploadResponse, UploadedFile};
use async_trait::async_trait;
use reqwest::multipart;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 上传传输接口
///
/// 队列只依赖这个抽象：上传一个文件，返回文件标识和访问地址，或失败。
/// 测试中用脚本化的实现替换真实 HTTP 客户端
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// 上传单个文件
    async fn upload(&self, file: &FilePayload) -> Result<UploadedFile>;
}

/// 文件存储服务 HTTP 客户端
///
/// Bearer 令牌认证的 multipart 上传
pub struct FileStorageClient {
    client: reqwest::Client,
    endpoint: String,
    auth_token: String,
}

impl FileStorageClient {
    /// 创建客户端
    ///
    /// 请求超时来自配置（默认 300 秒），超时的上传按普通传输失败处理
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    /// 归一化服务端响应
    ///
    /// 成功的条件：成功标识 + data.fileId + data.url 三者齐备，
    /// 任何一项缺失都视为上传失败
    fn normalize_response(response: UploadResponse) -> Result<UploadedFile> {
        if !response.is_success() {
            let msg = response
                .msg
                .unwrap_or_else(|| "服务端未返回成功标识".to_string());
            return Err(IntakeError::Transport(msg));
        }

        let data = response
            .data
            .ok_or_else(|| IntakeError::InvalidResponse("响应缺少 data 字段".to_string()))?;

        let file_id = data
            .file_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| IntakeError::InvalidResponse("响应缺少文件 fileId".to_string()))?;

        let url = data
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| IntakeError::InvalidResponse("响应缺少文件 url".to_string()))?;

        Ok(UploadedFile {
            file_id,
            public_url: Some(url.clone()),
            url,
        })
    }
}

#[async_trait]
impl UploadTransport for FileStorageClient {
    async fn upload(&self, file: &FilePayload) -> Result<UploadedFile> {
        info!(
            "上传文件到存储服务: name={}, size={}, type={}",
            file.name, file.size, file.content_type
        );

        // 构建 multipart form
        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;

        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.auth_token))
            .multipart(form)
            .send()
            .await
            .map_err(|e| IntakeError::Transport(format!("上传请求发送失败: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!("存储服务返回错误状态: name={}, status={}", file.name, status);
            return Err(IntakeError::Transport(format!(
                "服务端返回 {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("未知错误")
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| IntakeError::InvalidResponse(format!("响应 JSON 解析失败: {}", e)))?;

        let uploaded = Self::normalize_response(body)?;

        debug!(
            "文件上传成功: name={}, fileId={}, url={}",
            file.name, uploaded.file_id, uploaded.url
        );

        Ok(uploaded)
    }
}
