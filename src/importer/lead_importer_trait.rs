// ==========================================
// 销售 CRM 线索导入 - 导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 解码 → 映射推断 → 映射校验 → 行转换/校验 → 持久化
// ==========================================

use crate::domain::lead::{
    BoundMapping, ColumnMapping, DecodedRow, DecodedTable, ImportReport, ImportRowOutcome,
};
use crate::domain::types::EnumPolicy;
use crate::importer::error::{DecodeError, ImportResult};
use crate::importer::field_schema::FieldSchema;
use async_trait::async_trait;

// ==========================================
// LeadImporter Trait
// ==========================================
// 用途: 线索导入主接口
// 实现者: LeadImporterImpl
#[async_trait]
pub trait LeadImporter: Send + Sync {
    /// 预览上传文件（表头 + 前 N 行 + 真实总行数）
    ///
    /// # 参数
    /// - file_name: 原始文件名（用于判定格式）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(DecodedTable): rows 为前 N 行
    /// - Err: 格式不支持 / 空文件 / 文件损坏
    async fn preview_file(&self, file_name: &str, bytes: &[u8]) -> ImportResult<DecodedTable>;

    /// 按确认后的映射导入文件
    ///
    /// # 参数
    /// - file_name: 原始文件名
    /// - bytes: 文件内容
    /// - mappings: 人工确认后的列映射
    /// - assignee: 指派人标识（邮箱）
    ///
    /// # 返回
    /// - Ok(ImportReport): 行级成功/失败完整汇总
    /// - Err: 解码错误 / 映射缺必填字段 / 指派人不存在（此时未写入任何数据）
    ///
    /// # 说明
    /// - 单行失败不会中断批次
    async fn import_file(
        &self,
        file_name: &str,
        bytes: &[u8],
        mappings: &[ColumnMapping],
        assignee: &str,
    ) -> ImportResult<ImportReport>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 表格解码接口（阶段 0）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解码字节流为表头 + 数据行
    ///
    /// # 参数
    /// - bytes: 文件内容
    /// - row_limit: Some(n) 只物化前 n 行（其余仅计数）；None 全部物化
    fn decode(&self, bytes: &[u8], row_limit: Option<usize>) -> Result<DecodedTable, DecodeError>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 映射推断接口（阶段 1）
// 实现者: FieldMapper
pub trait FieldMapper: Send + Sync {
    /// 为每个表头推断目标字段
    ///
    /// # 保证
    /// - 返回长度 == headers.len()，顺序一致
    /// - 不失败；无法推断时 target_field = None
    /// - 同一表头文本始终得到同一结果
    fn infer_mappings(&self, headers: &[String]) -> Vec<ColumnMapping>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格清洗接口（阶段 2）
// 实现者: DataCleaner
pub trait DataCleaner: Send + Sync {
    /// 标准化空值（空字符串/空白 → None），非空值去首尾空白
    fn normalize_null(&self, value: &str) -> Option<String>;

    /// 清洗电话号码：只保留数字
    fn clean_phone(&self, value: &str) -> String;

    /// 清洗邮箱：TRIM + 小写
    fn clean_email(&self, value: &str) -> String;
}

// ==========================================
// RowTransformer Trait
// ==========================================
// 用途: 行转换与校验接口（阶段 3）
// 实现者: RowTransformer
// 红线: 纯函数，不访问持久化
pub trait RowTransformer: Send + Sync {
    /// 将一行原始数据转换为校验后的记录或行级失败
    ///
    /// # 参数
    /// - row: 原始行
    /// - headers: 表头（用于回显原始数据）
    /// - mappings: 已绑定列位置的映射
    /// - schema: 字段注册表视图
    /// - policy: 非法枚举值处理策略
    fn transform(
        &self,
        row: &DecodedRow,
        headers: &[String],
        mappings: &[BoundMapping],
        schema: &FieldSchema,
        policy: EnumPolicy,
    ) -> ImportRowOutcome;
}
