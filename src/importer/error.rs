// ==========================================
// 销售 CRM 线索导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分层: DecodeError（会话致命）→ ImportError（提交前致命）
// 行级错误不走此类型，见 RowFailure
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 解码错误（会话无法继续，需重新上传）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Unsupported file format: {0} (only .csv and .xlsx are accepted)")]
    UnsupportedFormat(String),

    #[error("File is empty")]
    EmptyFile,

    #[error("Corrupt file: {0}")]
    Corrupt(String),
}

// 实现 From<csv::Error>
impl From<csv::Error> for DecodeError {
    fn from(err: csv::Error) -> Self {
        DecodeError::Corrupt(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for DecodeError {
    fn from(err: calamine::XlsxError) -> Self {
        DecodeError::Corrupt(err.to_string())
    }
}

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error(transparent)]
    Decode(#[from] DecodeError),

    // ===== 映射错误（用户可修正） =====
    #[error("Missing required field mappings: {}", .0.join(", "))]
    MissingRequiredMappings(Vec<String>),

    #[error("Invalid field mappings: {}", .0.join(", "))]
    UnknownTargetFields(Vec<String>),

    #[error("Invalid column mappings format: {0}")]
    InvalidMappingPayload(String),

    // ===== 协作方错误 =====
    #[error("User {0} not found or inactive")]
    AssigneeNotFound(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    // ===== 配置错误 =====
    #[error("Config error (key: {key}): {message}")]
    Config { key: String, message: String },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::InvalidMappingPayload(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_mappings_lists_every_field() {
        let err = ImportError::MissingRequiredMappings(vec!["name".into(), "email".into()]);
        assert_eq!(err.to_string(), "Missing required field mappings: name, email");
    }

    #[test]
    fn test_decode_error_is_transparent() {
        let err: ImportError = DecodeError::EmptyFile.into();
        assert_eq!(err.to_string(), "File is empty");
    }
}
