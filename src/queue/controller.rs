// 上传队列控制器
//
// 队列的公开接口：添加文件、启动/暂停、清空、重试失败项、移除单项，
// 并把逐项状态聚合为整体统计。
// items 列表由控制器独占，批量执行器只通过按 id 查找的更新操作回写结果，
// 队列被清空或项被移除后迟到的结果会被安全忽略

use super::item::{FilePayload, QueueItem, UploadStatus};
use super::runner::BatchRunner;
use super::validate::validate_file;
use crate::config::{AppConfig, QueueConfig};
use crate::error::Result;
use crate::storage::{FileStorageClient, UploadTransport, UploadedFile};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 队列项列表（控制器与执行器共享的唯一可变状态）
pub(crate) type SharedItems = Arc<RwLock<Vec<QueueItem>>>;

/// 上传完成回调
///
/// 每个成功完成的队列项触发一次，携带原始文件和上传结果
pub type UploadCallback = Arc<dyn Fn(&FilePayload, &UploadedFile) + Send + Sync>;

/// 回调槽位（单订阅者，后设置的覆盖先设置的）
pub(crate) type CallbackSlot = Arc<RwLock<Option<UploadCallback>>>;

/// 队列状态快照
///
/// 统计数字总是从 items 重新计算，不单独维护，避免漂移
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    /// 全部队列项，保持入队顺序
    pub items: Vec<QueueItem>,
    /// 批量执行器是否正在运行
    pub is_processing: bool,
    /// 已完成数
    pub completed_count: usize,
    /// 已失败数
    pub failed_count: usize,
}

/// 上传队列
///
/// 一次上传会话对应一个实例，由消费方持有；没有全局单例
pub struct UploadQueue {
    items: SharedItems,
    config: QueueConfig,
    transport: Arc<dyn UploadTransport>,
    is_processing: Arc<AtomicBool>,
    /// 当前运行的取消令牌，每次 start 重新创建
    run_cancel: Arc<RwLock<CancellationToken>>,
    on_uploaded: CallbackSlot,
}

impl UploadQueue {
    /// 创建上传队列（使用真实的文件存储客户端）
    pub fn new(config: &AppConfig) -> Result<Self> {
        let transport = Arc::new(FileStorageClient::new(&config.storage)?);
        Ok(Self::with_transport(config.queue.clone(), transport))
    }

    /// 创建上传队列（注入自定义传输实现）
    pub fn with_transport(config: QueueConfig, transport: Arc<dyn UploadTransport>) -> Self {
        Self {
            items: Arc::new(RwLock::new(Vec::new())),
            config,
            transport,
            is_processing: Arc::new(AtomicBool::new(false)),
            run_cancel: Arc::new(RwLock::new(CancellationToken::new())),
            on_uploaded: Arc::new(RwLock::new(None)),
        }
    }

    /// 添加文件到队列
    ///
    /// 每个文件先过入队校验：合格的以待处理状态入队，
    /// 不合格的以失败状态入队（带原因），保持传入顺序。
    /// 不会自动开始处理，需要显式调用 start
    ///
    /// # 返回
    /// 新增队列项的 id 列表，与传入文件一一对应
    pub async fn add_files(&self, files: Vec<FilePayload>) -> Vec<String> {
        if files.is_empty() {
            return Vec::new();
        }

        let mut new_items = Vec::with_capacity(files.len());
        for file in files {
            let item = match validate_file(&file, &self.config) {
                Ok(()) => QueueItem::new(file),
                Err(e) => {
                    warn!("文件校验失败: name={}, 原因={}", file.name, e);
                    QueueItem::new_invalid(file, e.to_string())
                }
            };
            new_items.push(item);
        }

        let ids: Vec<String> = new_items.iter().map(|item| item.id.clone()).collect();

        info!("添加 {} 个文件到上传队列", ids.len());
        self.items.write().await.extend(new_items);

        ids
    }

    /// 开始处理队列，驱动所有待处理项到终态
    ///
    /// 已在处理中时为空操作；处理完成（全部批次落定或被暂停）后返回
    pub async fn start(&self) {
        // 认领处理标志并换入本次运行的取消令牌；
        // 两步在同一把锁内完成，保证并发的 pause 取消到的是当前运行的令牌
        let cancel = {
            let mut run_cancel = self.run_cancel.write().await;

            // 两个并发的 start 只允许一个进入
            if self
                .is_processing
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                info!("队列已在处理中，忽略重复的 start");
                return;
            }

            let token = CancellationToken::new();
            *run_cancel = token.clone();
            token
        };

        let runner = BatchRunner::new(
            self.items.clone(),
            self.transport.clone(),
            self.config.clone(),
            cancel.clone(),
            self.on_uploaded.clone(),
        );

        runner.drain().await;

        // 被暂停的运行其标志已由 pause 清除，处理权可能已交给下一次 start，
        // 迟到落定的旧运行不得再归还标志
        if !cancel.is_cancelled() {
            self.is_processing.store(false, Ordering::SeqCst);
        }
    }

    /// 暂停队列处理
    ///
    /// 只阻止发起后续批次，正在上传的文件让其自然完成；
    /// 未在处理中时为空操作
    pub async fn pause(&self) {
        // 与 start 的认领过程互斥：标志与令牌必须对应同一次运行
        let run_cancel = self.run_cancel.read().await;

        if !self.is_processing.swap(false, Ordering::SeqCst) {
            return;
        }

        run_cancel.cancel();
        info!("上传队列已暂停，当前批次内的上传将自然完成");
    }

    /// 清空队列
    ///
    /// 正在处理时先暂停；清空后仍在途的上传结果会因找不到队列项而被忽略
    pub async fn clear(&self) {
        if self.is_processing.load(Ordering::SeqCst) {
            self.pause().await;
        }

        self.items.write().await.clear();
        info!("上传队列已清空");
    }

    /// 重试所有失败项
    ///
    /// 失败项重置为待处理后自动开始处理；没有失败项时为空操作
    pub async fn retry_failed(&self) {
        let retried = {
            let mut items = self.items.write().await;
            let mut count = 0;
            for item in items.iter_mut() {
                if item.status == UploadStatus::Failed {
                    item.reset_for_retry();
                    count += 1;
                }
            }
            count
        };

        if retried == 0 {
            return;
        }

        info!("重试 {} 个失败项", retried);
        self.start().await;
    }

    /// 移除单个队列项（任意状态）
    ///
    /// 正在上传的项移除后不取消网络请求，其迟到的结果会被静默忽略
    ///
    /// # 返回
    /// 是否确实移除了一项
    pub async fn remove_item(&self, id: &str) -> bool {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.id != id);

        let removed = items.len() != before;
        if removed {
            info!("移除队列项: id={}", id);
        }
        removed
    }

    /// 设置上传完成回调
    ///
    /// 单订阅者：只有最近一次设置的回调会被触发
    pub async fn set_on_file_uploaded<F>(&self, callback: F)
    where
        F: Fn(&FilePayload, &UploadedFile) + Send + Sync + 'static,
    {
        *self.on_uploaded.write().await = Some(Arc::new(callback));
    }

    /// 获取队列状态快照（统计从 items 重新计算）
    pub async fn snapshot(&self) -> QueueSnapshot {
        let items = self.items.read().await.clone();
        let completed_count = items
            .iter()
            .filter(|item| item.status == UploadStatus::Completed)
            .count();
        let failed_count = items
            .iter()
            .filter(|item| item.status == UploadStatus::Failed)
            .count();

        QueueSnapshot {
            items,
            is_processing: self.is_processing.load(Ordering::SeqCst),
            completed_count,
            failed_count,
        }
    }

    /// 批量执行器是否正在运行
    pub fn is_processing(&self) -> bool {
        self.is_processing.load(Ordering::SeqCst)
    }
}
