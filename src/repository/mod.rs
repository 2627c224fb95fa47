// ==========================================
// 销售 CRM 线索导入 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod lead_import_repo;
pub mod lead_import_repo_impl;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use lead_import_repo::{AssigneeDirectory, LeadImportRepository};
pub use lead_import_repo_impl::{LeadImportRepositoryImpl, UserDirectoryImpl, LEAD_COLUMNS};
