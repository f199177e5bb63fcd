// 文件存储服务模块
//
// 上传队列的外部协作方：接收 multipart 上传，返回文件标识和访问地址

pub mod client;
pub mod types;

pub use client::{FileStorageClient, UploadTransport};
pub use types::{UploadResponse, UploadedFile};
