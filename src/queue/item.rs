// 队列项定义
//
// 一个队列项对应一个文件的完整上传生命周期：
// pending -> uploading -> completed | failed，失败项可由重试回到 pending

use crate::storage::UploadedFile;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 队列项状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// 等待上传（通过入队校验）
    Pending,
    /// 上传中
    Uploading,
    /// 上传后处理中（预留给服务端转换等后续工作，上传路径本身不使用）
    Processing,
    /// 已完成
    Completed,
    /// 失败（校验失败或传输失败）
    Failed,
}

impl UploadStatus {
    /// 是否为终态（不再自动流转，只有显式重试能离开 Failed）
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Failed)
    }
}

/// 待上传的文件负载
///
/// 字节内容与文件元信息在入队后不再变化，由队列项独占
#[derive(Debug, Clone)]
pub struct FilePayload {
    /// 原始文件名
    pub name: String,
    /// 文件大小（字节）
    pub size: u64,
    /// MIME 类型
    pub content_type: String,
    /// 文件内容
    pub bytes: Bytes,
}

impl FilePayload {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// 队列项
///
/// 终态不变式：一旦离开 Pending/Uploading，error 和 result 恰好有一个被填充
#[derive(Debug, Clone)]
pub struct QueueItem {
    /// 队列项ID（入队时生成，生命周期内不变）
    pub id: String,
    /// 文件负载
    pub file: FilePayload,
    /// 当前状态
    pub status: UploadStatus,
    /// 进度百分比（0-100，仅供展示，单次尝试内单调不减）
    pub progress: u8,
    /// 错误信息（仅失败时存在）
    pub error: Option<String>,
    /// 上传结果（仅完成时存在）
    pub result: Option<UploadedFile>,
    /// 本次尝试开始时间 (Unix timestamp)
    pub started_at: Option<i64>,
    /// 本次尝试结束时间 (Unix timestamp)
    pub completed_at: Option<i64>,
}

impl QueueItem {
    /// 创建通过校验的队列项
    pub fn new(file: FilePayload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            file,
            status: UploadStatus::Pending,
            progress: 0,
            error: None,
            result: None,
            started_at: None,
            completed_at: None,
        }
    }

    /// 创建校验失败的队列项
    ///
    /// 不合格的文件直接以失败状态入队，保证用户所选文件与队列行一一对应，
    /// 批处理器永远不会尝试上传它
    pub fn new_invalid(file: FilePayload, error: String) -> Self {
        let mut item = Self::new(file);
        item.status = UploadStatus::Failed;
        item.error = Some(error);
        item
    }

    /// 标记为上传中（批处理器认领时调用）
    pub fn mark_uploading(&mut self) {
        self.status = UploadStatus::Uploading;
        self.progress = 0;
        self.started_at = Some(chrono::Utc::now().timestamp());
        self.completed_at = None;
    }

    /// 标记为已完成
    pub fn mark_completed(&mut self, result: UploadedFile) {
        self.status = UploadStatus::Completed;
        self.progress = 100;
        self.result = Some(result);
        self.error = None;
        self.completed_at = Some(chrono::Utc::now().timestamp());
    }

    /// 标记为失败
    pub fn mark_failed(&mut self, error: String) {
        self.status = UploadStatus::Failed;
        self.error = Some(error);
        self.result = None;
        self.completed_at = Some(chrono::Utc::now().timestamp());
    }

    /// 重置为待上传（仅对失败项调用）
    pub fn reset_for_retry(&mut self) {
        self.status = UploadStatus::Pending;
        self.progress = 0;
        self.error = None;
        self.started_at = None;
        self.completed_at = None;
    }

    /// 本次尝试耗时（秒），尚未结束时为 None
    pub fn duration_secs(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}
