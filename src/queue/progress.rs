// 模拟进度推进
//
// 进度只是界面观感，不反映实际传输字节数：
// 固定间隔按步长推进，封顶在上限以下，真实响应返回时由状态流转直接跳到 100。
// 保证单次尝试内单调不减

use crate::config::QueueConfig;
use std::time::Duration;

/// 进度步进器
///
/// 纯计算结构，推进循环本身由批处理器驱动
#[derive(Debug, Clone, Copy)]
pub struct ProgressPacer {
    /// 推进间隔
    interval: Duration,
    /// 每次推进的百分比
    step: u8,
    /// 响应返回前的进度上限
    ceiling: u8,
}

impl ProgressPacer {
    pub fn new(interval: Duration, step: u8, ceiling: u8) -> Self {
        Self {
            interval,
            step,
            // 上限不允许达到 100，100 只能由真实完成产生
            ceiling: ceiling.min(99),
        }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(
            Duration::from_millis(config.progress_interval_ms),
            config.progress_step,
            config.progress_ceiling,
        )
    }

    /// 推进间隔
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 计算下一个进度值
    ///
    /// 超过上限时保持原值不回退
    pub fn advance(&self, current: u8) -> u8 {
        let next = current.saturating_add(self.step).min(self.ceiling);
        next.max(current)
    }
}
