// 错误类型定义
//
// 注意：队列操作本身从不向调用方抛出单个文件的失败，
// 失败信息只记录在对应的队列项上（error 字段）

use thiserror::Error;

/// 文档接收服务错误类型
#[derive(Error, Debug)]
pub enum IntakeError {
    /// 文件格式不在允许列表内（入队前校验）
    #[error("不支持的文件格式，请上传 PDF、DOC、DOCX、XLS、XLSX 或图片文件")]
    UnsupportedFileType,

    /// 文件超过大小上限（入队前校验）
    #[error("文件太大，请选择小于 {limit_mb} MB 的文件")]
    FileTooLarge { limit_mb: u64 },

    /// 上传请求发送失败或服务端返回非成功状态
    #[error("上传文件到存储服务失败: {0}")]
    Transport(String),

    /// 服务端响应无法解析或缺少必需的 fileId
    #[error("存储服务响应格式不正确: {0}")]
    InvalidResponse(String),

    /// HTTP 客户端错误
    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, IntakeError>;

impl IntakeError {
    /// 判断是否为入队前的本地校验错误
    ///
    /// 校验错误的队列项直接以失败状态入队，批处理器永远不会尝试上传
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            IntakeError::UnsupportedFileType | IntakeError::FileTooLarge { .. }
        )
    }
}
