// ==========================================
// 销售 CRM 线索导入 - 导入 Repository Trait
// ==========================================
// 职责: 定义线索落库与指派人查询接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::lead::{AssigneeId, LeadRecord, RecordId};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// LeadImportRepository Trait
// ==========================================
// 用途: 校验通过的线索落库
// 实现者: LeadImportRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait LeadImportRepository: Send + Sync {
    /// 持久化单条线索
    ///
    /// # 参数
    /// - record: 校验通过的线索记录
    /// - assignee: 已解析的指派人
    /// - batch_id: 导入批次 ID（用于追溯）
    ///
    /// # 返回
    /// - Ok(RecordId): 新记录 ID
    /// - Err: 数据库错误（只影响当前行）
    ///
    /// # 说明
    /// - 每次调用独立提交，返回 Ok 即已持久
    async fn persist_lead(
        &self,
        record: &LeadRecord,
        assignee: &AssigneeId,
        batch_id: &str,
    ) -> RepositoryResult<RecordId>;
}

// ==========================================
// AssigneeDirectory Trait
// ==========================================
// 用途: 指派人解析（标识 → 有效用户）
// 实现者: UserDirectoryImpl（users 表）
#[async_trait]
pub trait AssigneeDirectory: Send + Sync {
    /// 解析指派人
    ///
    /// # 返回
    /// - Ok(Some): 有效用户
    /// - Ok(None): 用户不存在或已停用
    async fn resolve_assignee(&self, identifier: &str) -> RepositoryResult<Option<AssigneeId>>;
}
