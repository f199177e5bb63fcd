// 批量上传执行器
//
// 把快照内的待处理项按并发上限切成连续批次，
// 批内并发、批间串行，暂停信号只在批次边界生效。
// 执行器从不直接持有 items 的所有权，所有状态更新都先按 id 找项，
// 项不存在（被移除或队列已清空）时静默忽略

use super::controller::{CallbackSlot, SharedItems};
use super::item::{FilePayload, UploadStatus};
use super::progress::ProgressPacer;
use crate::config::QueueConfig;
use crate::storage::{UploadTransport, UploadedFile};
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 批量上传执行器
///
/// 单次 start 调用的执行单元：持有本次运行的取消令牌，
/// 运行期间新入队的文件不在快照内，等待下一次 start
pub(crate) struct BatchRunner {
    items: SharedItems,
    transport: Arc<dyn UploadTransport>,
    config: QueueConfig,
    cancel: CancellationToken,
    on_uploaded: CallbackSlot,
}

impl BatchRunner {
    pub(crate) fn new(
        items: SharedItems,
        transport: Arc<dyn UploadTransport>,
        config: QueueConfig,
        cancel: CancellationToken,
        on_uploaded: CallbackSlot,
    ) -> Self {
        Self {
            items,
            transport,
            config,
            cancel,
            on_uploaded,
        }
    }

    /// 驱动所有待处理项到终态
    pub(crate) async fn drain(&self) {
        // 快照当前待处理项的 id，保持入队顺序
        let pending: Vec<String> = self
            .items
            .read()
            .await
            .iter()
            .filter(|item| item.status == UploadStatus::Pending)
            .map(|item| item.id.clone())
            .collect();

        if pending.is_empty() {
            debug!("队列中没有待处理项");
            return;
        }

        let batch_size = self.config.max_concurrent.max(1);
        let batch_count = pending.len().div_ceil(batch_size);

        info!(
            "开始批量上传: 待处理={}, 并发上限={}, 批次数={}",
            pending.len(),
            batch_size,
            batch_count
        );

        for (index, batch) in pending.chunks(batch_size).enumerate() {
            // 暂停只在批次边界生效，已发出的上传让其自然完成
            if self.cancel.is_cancelled() {
                info!("收到暂停信号，停止发起后续批次: 已完成批次={}", index);
                return;
            }

            debug!("发起第 {} 批，共 {} 个文件", index + 1, batch.len());

            // 批内并发，等待整批落定后再进入下一批；
            // 单个文件失败不影响同批其他文件
            join_all(batch.iter().map(|id| self.upload_one(id))).await;
        }

        info!("批量上传完成: 共 {} 批", batch_count);
    }

    /// 上传单个队列项并落定其状态
    async fn upload_one(&self, id: &str) {
        // 认领该项；项可能已被移除或已不是待处理状态
        let file = match self.claim(id).await {
            Some(file) => file,
            None => {
                debug!("队列项已不可认领，跳过: id={}", id);
                return;
            }
        };

        // 启动模拟进度推进，响应返回后停止
        let ticker_cancel = self.cancel.child_token();
        let ticker = self.spawn_progress_ticker(id.to_string(), ticker_cancel.clone());

        let outcome = self.transport.upload(&file).await;

        ticker_cancel.cancel();
        let _ = ticker.await;

        match outcome {
            Ok(uploaded) => {
                if self.settle_completed(id, uploaded.clone()).await {
                    self.notify_uploaded(&file, &uploaded).await;
                }
            }
            Err(e) => {
                warn!("文件上传失败: name={}, 原因={}", file.name, e);
                self.settle_failed(id, e.to_string()).await;
            }
        }
    }

    /// 认领待处理项，返回其文件负载
    async fn claim(&self, id: &str) -> Option<FilePayload> {
        let mut items = self.items.write().await;
        let item = items.iter_mut().find(|item| item.id == id)?;

        if item.status != UploadStatus::Pending {
            return None;
        }

        item.mark_uploading();
        Some(item.file.clone())
    }

    /// 落定为完成，返回该项是否仍然存在
    async fn settle_completed(&self, id: &str, uploaded: UploadedFile) -> bool {
        let mut items = self.items.write().await;
        match items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.mark_completed(uploaded);
                true
            }
            None => {
                // 上传期间项被移除或队列被清空，迟到的结果静默忽略
                debug!("完成结果找不到对应队列项，忽略: id={}", id);
                false
            }
        }
    }

    /// 落定为失败（项已移除时静默忽略）
    async fn settle_failed(&self, id: &str, error: String) {
        let mut items = self.items.write().await;
        if let Some(item) = items.iter_mut().find(|item| item.id == id) {
            item.mark_failed(error);
        } else {
            debug!("失败结果找不到对应队列项，忽略: id={}", id);
        }
    }

    /// 调用消费方注册的完成回调（未注册时无副作用）
    async fn notify_uploaded(&self, file: &FilePayload, uploaded: &UploadedFile) {
        let callback = self.on_uploaded.read().await.clone();
        if let Some(callback) = callback {
            callback(file, uploaded);
        }
    }

    /// 为上传中的项启动固定间隔的模拟进度推进
    fn spawn_progress_ticker(&self, id: String, cancel: CancellationToken) -> JoinHandle<()> {
        let items = self.items.clone();
        let pacer = ProgressPacer::from_config(&self.config);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(pacer.interval());
            // interval 的第一次 tick 立即返回，先消耗掉
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let mut items = items.write().await;
                        match items.iter_mut().find(|item| item.id == id) {
                            Some(item) if item.status == UploadStatus::Uploading => {
                                item.progress = pacer.advance(item.progress);
                            }
                            // 项被移除或已落定，停止推进
                            _ => break,
                        }
                    }
                }
            }
        })
    }
}
