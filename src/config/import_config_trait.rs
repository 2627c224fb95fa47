// ==========================================
// 销售 CRM 线索导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取预览行数
    ///
    /// # 默认值
    /// - 10
    async fn get_preview_row_limit(&self) -> ImportResult<usize>;

    /// 邮箱是否必填
    ///
    /// # 默认值
    /// - false
    ///
    /// # 用途
    /// - true 时 email 进入必填字段集合（映射校验与行校验同时生效）
    async fn get_require_email(&self) -> ImportResult<bool>;

    /// 非法枚举值是否回退到默认值
    ///
    /// # 默认值
    /// - false（整行失败）
    async fn get_enum_fallback(&self) -> ImportResult<bool>;
}
