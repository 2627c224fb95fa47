// ==========================================
// 销售 CRM 线索导入 - 导入领域模型
// ==========================================
// 职责: 解码表格 / 字段描述 / 列映射 / 行结果 / 导入汇总
// 红线: 纯数据结构，不含 IO，不含校验逻辑
// ==========================================

use crate::domain::types::FieldKind;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// DecodedTable - 解码后的表格
// ==========================================
// 不变量: 每一行的单元格数量 == headers.len()
// 不变量: total_row_count >= rows.len()（预览时 rows 只是前缀）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedTable {
    pub headers: Vec<String>,    // 表头（允许重名，按位置区分）
    pub rows: Vec<DecodedRow>,   // 已物化的数据行
    pub total_row_count: usize,  // 文件中数据行总数（不含表头、空白行）
    pub padded_rows: usize,      // 短行补齐数量
    pub truncated_rows: usize,   // 长行截断数量（仅统计丢弃了非空单元格的行）
    pub notes: Vec<String>,      // 解码过程提示（如编码回退）
}

impl DecodedTable {
    /// 是否为预览（只物化了部分行）
    pub fn is_partial(&self) -> bool {
        self.rows.len() < self.total_row_count
    }
}

// ==========================================
// DecodedRow - 单行原始数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedRow {
    pub line_number: usize, // 源文件中的物理行号（1 起）
    pub cells: Vec<String>, // 原始文本，空字符串表示空单元格
}

impl DecodedRow {
    /// 按表头回显原始数据（不做 trim / 转换）
    pub fn to_raw(&self, headers: &[String]) -> RawRow {
        RawRow(
            headers
                .iter()
                .zip(self.cells.iter())
                .map(|(h, c)| (h.clone(), c.clone()))
                .collect(),
        )
    }

    /// 读取指定位置的单元格
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }
}

// ==========================================
// RawRow - 原始行回显
// ==========================================
// 有序 (源列名, 原始单元格) 列表；序列化为 JSON 对象，保持列顺序
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow(pub Vec<(String, String)>);

impl RawRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, cell) in &self.0 {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

// ==========================================
// FieldDescriptor - 目标字段描述
// ==========================================
// 静态注册表中的一项，进程内只读
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
    pub example: Option<&'static str>,
    pub allowed_values: &'static [&'static str], // 空 = 不约束
    pub kind: FieldKind,
    pub max_length: Option<usize>,
    pub default_value: Option<&'static str>,
    pub default_requires: Option<&'static str>, // 默认值仅在该字段有值时生效
}

impl FieldDescriptor {
    /// 大小写不敏感地匹配枚举值，返回注册表中的规范写法
    pub fn canonical_value(&self, value: &str) -> Option<&'static str> {
        self.allowed_values
            .iter()
            .find(|v| v.eq_ignore_ascii_case(value))
            .copied()
    }
}

// ==========================================
// ColumnMapping - 列映射
// ==========================================
// target_field = None 表示跳过该列
// 线上格式兼容前端: { "csvColumn": "...", "leadField": "..." }，leadField 为空串/null 即跳过
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(rename = "csvColumn")]
    pub source_column: String,
    #[serde(rename = "leadField", default, deserialize_with = "empty_as_none")]
    pub target_field: Option<String>,
}

impl ColumnMapping {
    pub fn new(source_column: impl Into<String>, target_field: Option<&str>) -> Self {
        Self {
            source_column: source_column.into(),
            target_field: target_field.map(str::to_string),
        }
    }

    pub fn skip(source_column: impl Into<String>) -> Self {
        Self::new(source_column, None)
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }))
}

// ==========================================
// BoundMapping - 已绑定到列位置的映射
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundMapping {
    pub column_index: usize,
    pub source_column: String,
    pub target_field: Option<String>,
}

// ==========================================
// LeadRecord - 校验通过的线索记录
// ==========================================
// 字段名 → 规范化后的值；只包含有值字段与默认值
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LeadRecord {
    fields: BTreeMap<String, String>,
}

impl LeadRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, value: impl Into<String>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// ==========================================
// 外部协作方标识
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssigneeId(pub String);

impl fmt::Display for AssigneeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==========================================
// RowFailure / ImportRowOutcome - 单行结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub row: usize,   // 源文件物理行号
    pub data: RawRow, // 原始单元格回显
    #[serde(rename = "error")]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportRowOutcome {
    Success {
        row: usize,
        record: LeadRecord,
        warnings: Vec<String>,
    },
    Failure(RowFailure),
}

impl ImportRowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ImportRowOutcome::Success { .. })
    }
}

// ==========================================
// ImportReport - 导入汇总
// ==========================================
// 每次导入构建一次，构建后不可变，不落库
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub successful_count: usize,
    pub failed_count: usize,
    pub warnings: Vec<String>,
    pub failures: Vec<RowFailure>,
}

impl ImportReport {
    pub fn total_rows(&self) -> usize {
        self.successful_count + self.failed_count
    }
}
