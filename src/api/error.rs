// ==========================================
// 销售 CRM 线索导入 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换导入层/仓储层错误为用户可读的错误消息
// 约束: 所有错误信息必须包含显式原因
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 上传文件错误
    // ==========================================
    #[error("{0}")]
    InvalidFile(String),

    // ==========================================
    // 映射 / 输入错误
    // ==========================================
    #[error("Missing required field mappings: {}", .0.join(", "))]
    MissingRequiredMappings(Vec<String>),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 对应的 HTTP 风格状态码（4xx = 调用方可修正）
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidFile(_)
            | ApiError::MissingRequiredMappings(_)
            | ApiError::InvalidInput(_) => 400,
            ApiError::NotFound(_) => 404,
            _ => 500,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("lock failed: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::InvalidInput(format!("Unique constraint violated: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::InvalidInput(format!("Foreign key constraint violated: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("Invalid value for {}: {}", field, message))
            }
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Decode(e) => ApiError::InvalidFile(e.to_string()),
            ImportError::MissingRequiredMappings(fields) => ApiError::MissingRequiredMappings(fields),
            e @ ImportError::UnknownTargetFields(_) => ApiError::InvalidInput(e.to_string()),
            e @ ImportError::InvalidMappingPayload(_) => ApiError::InvalidInput(e.to_string()),
            e @ ImportError::AssigneeNotFound(_) => ApiError::NotFound(e.to_string()),
            ImportError::Repository(e) => ApiError::from(e),
            e @ ImportError::Config { .. } => ApiError::ConfigError(e.to_string()),
            ImportError::Other(e) => ApiError::Other(e),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
