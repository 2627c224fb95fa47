// ==========================================
// 销售 CRM 线索导入 - 导入层
// ==========================================
// 职责: 上传表格 → 映射 → 校验 → 线索落库
// 支持: CSV, Excel (.xlsx)
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod field_schema;
pub mod file_parser;
pub mod lead_importer_impl;
pub mod lead_importer_trait;
pub mod mapping_validator;
pub mod row_transformer;
pub mod template;

// 重导出核心类型
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{DecodeError, ImportError, ImportResult};
pub use field_mapper::{infer_field, FieldMapper as FieldMapperImpl};
pub use field_schema::{FieldDefinition, FieldSchema, LEAD_FIELDS};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use lead_importer_impl::LeadImporterImpl;
pub use mapping_validator::{MappingPlan, MappingValidator};
pub use row_transformer::RowTransformer as RowTransformerImpl;
pub use template::generic_template_csv;

// 重导出 Trait 接口
pub use lead_importer_trait::{DataCleaner, FieldMapper, FileParser, LeadImporter, RowTransformer};
