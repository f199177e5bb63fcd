// 文件存储服务类型定义

use serde::{Deserialize, Serialize};

/// 上传接口响应
///
/// 响应示例: {"status":"success","data":{"fileId":"cmdnyyv6q059ao4c6q0fhsr0y","url":"..."}}
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    /// 成功标识，值为 "success" 时表示成功
    #[serde(default)]
    pub status: Option<String>,
    /// 旧格式成功标识（兼容）
    #[serde(default)]
    pub success: Option<bool>,
    /// 响应数据
    #[serde(default)]
    pub data: Option<UploadResponseData>,
    /// 错误信息
    #[serde(default)]
    pub msg: Option<String>,
}

/// 上传接口响应数据
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponseData {
    /// 文件在存储服务的唯一标识
    #[serde(rename = "fileId")]
    pub file_id: Option<String>,
    /// 文件访问地址
    pub url: Option<String>,
}

impl UploadResponse {
    /// 判断响应是否表示成功（兼容新旧两种格式）
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success") || self.success == Some(true)
    }
}

/// 上传成功后的文件信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    /// 文件在存储服务的唯一标识
    pub file_id: String,
    /// 文件访问地址
    pub url: String,
    /// 公开访问地址（如有）
    pub public_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_new_format() {
        let body = r#"{"status":"success","data":{"fileId":"cmdnyyv6q059ao4c6q0fhsr0y","url":"https://files.example/a.pdf"}}"#;
        let resp: UploadResponse = serde_json::from_str(body).unwrap();

        assert!(resp.is_success());
        let data = resp.data.unwrap();
        assert_eq!(data.file_id.as_deref(), Some("cmdnyyv6q059ao4c6q0fhsr0y"));
        assert_eq!(data.url.as_deref(), Some("https://files.example/a.pdf"));
    }

    #[test]
    fn test_parse_legacy_format() {
        let body = r#"{"success":true,"data":{"fileId":"f1","url":"u1"}}"#;
        let resp: UploadResponse = serde_json::from_str(body).unwrap();
        assert!(resp.is_success());
    }

    #[test]
    fn test_parse_failure_with_msg() {
        let body = r#"{"status":"error","msg":"令牌无效"}"#;
        let resp: UploadResponse = serde_json::from_str(body).unwrap();

        assert!(!resp.is_success());
        assert_eq!(resp.msg.as_deref(), Some("令牌无效"));
    }
}
