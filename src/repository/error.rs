// ==========================================
// 销售 CRM 线索导入 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 用途: 持久化协作方 / 指派人目录返回的错误
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("Database connection failed: {0}")]
    DatabaseConnectionError(String),

    #[error("Database lock failed: {0}")]
    LockError(String),

    #[error("Database query failed: {0}")]
    DatabaseQueryError(String),

    #[error("Unique constraint violated: {0}")]
    UniqueConstraintViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    // ===== 数据质量错误 =====
    #[error("Field value error (field={field}): {message}")]
    FieldValueError { field: String, message: String },
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for RepositoryError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        RepositoryError::LockError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
