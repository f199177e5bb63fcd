// 入队校验（入口闸门）
//
// 两项检查：MIME 类型在允许列表内、文件不超过大小上限。
// 任一失败即拒绝；被拒绝的文件仍以失败状态入队，
// 让用户在队列里看到它，而不是被静默丢弃

use super::item::FilePayload;
use crate::config::QueueConfig;
use crate::error::IntakeError;

/// 校验文件类型与大小
pub fn validate_file(file: &FilePayload, config: &QueueConfig) -> Result<(), IntakeError> {
    if !config
        .allowed_types
        .iter()
        .any(|t| t.eq_ignore_ascii_case(&file.content_type))
    {
        return Err(IntakeError::UnsupportedFileType);
    }

    if file.size > config.max_file_size {
        return Err(IntakeError::FileTooLarge {
            limit_mb: config.max_file_size / (1024 * 1024),
        });
    }

    Ok(())
}
