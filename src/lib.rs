// ==========================================
// 销售 CRM 线索导入 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 通用表格线索导入（人工确认映射后落库）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 解码 / 映射 / 校验 / 落库编排
pub mod importer;

// 配置层 - 导入策略配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{EnumPolicy, FieldKind, FileFormat};

// 领域实体
pub use domain::{
    AssigneeId, ColumnMapping, DecodedTable, ImportReport, LeadRecord, RawRow, RowFailure,
};

// 导入
pub use importer::{FieldSchema, ImportError, LeadImporter, LeadImporterImpl};

// API
pub use api::{ApiError, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Lead Importer";
