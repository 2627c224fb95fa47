// ==========================================
// 销售 CRM 线索导入 - 领域模型层
// ==========================================
// 职责: 定义导入会话中流转的数据结构与类型
// 红线: 不含数据访问逻辑，不含校验逻辑
// ==========================================

pub mod lead;
pub mod types;

// 重导出核心类型
pub use lead::{
    AssigneeId, BoundMapping, ColumnMapping, DecodedRow, DecodedTable, FieldDescriptor,
    ImportReport, ImportRowOutcome, LeadRecord, RawRow, RecordId, RowFailure,
};
pub use types::{EnumPolicy, FieldKind, FileFormat};
