// ==========================================
// 销售 CRM 线索导入 - 配置层
// ==========================================
// 职责: 导入策略配置（预览行数 / 邮箱必填 / 枚举回退）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULT_PREVIEW_ROW_LIMIT};
pub use import_config_trait::ImportConfigReader;
