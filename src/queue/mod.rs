// 上传队列模块
//
// 文档接收流水线的核心：
// - 入队校验（类型 + 大小，不合格的文件以失败状态入队）
// - 逐项状态机（pending -> uploading -> completed | failed，显式重试回到 pending）
// - 并发受限的批量执行（批内并发、批间串行，暂停只在批次边界生效）
// - 单订阅者的完成回调

pub mod controller;
pub mod item;
pub mod progress;
pub mod validate;

mod runner;

pub use controller::{QueueSnapshot, UploadCallback, UploadQueue};
pub use item::{FilePayload, QueueItem, UploadStatus};
pub use progress::ProgressPacer;
pub use validate::validate_file;
