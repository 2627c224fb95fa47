// ==========================================
// 销售 CRM 线索导入 - 领域类型定义
// ==========================================
// 职责: 文件格式 / 字段类型 / 枚举值策略
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 文件格式 (File Format)
// ==========================================
// 仅支持 .csv / .xlsx，按文件扩展名判定（不嗅探内容）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    /// 根据文件名扩展名识别格式（大小写不敏感）
    ///
    /// # 返回
    /// - Some(FileFormat): 支持的格式
    /// - None: 不支持的扩展名（由调用方转换为 UnsupportedFormat）
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Some(FileFormat::Csv),
            "xlsx" => Some(FileFormat::Xlsx),
            _ => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Csv => write!(f, "csv"),
            FileFormat::Xlsx => write!(f, "xlsx"),
        }
    }
}

// ==========================================
// 字段类型 (Field Kind)
// ==========================================
// 决定行校验阶段使用的规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,  // 仅校验存在性/长度
    Email, // 必须包含 '@'
    Phone, // 至少 10 位数字
    Enum,  // 必须属于 allowed_values（大小写不敏感）
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Email => write!(f, "email"),
            FieldKind::Phone => write!(f, "phone"),
            FieldKind::Enum => write!(f, "enum"),
        }
    }
}

// ==========================================
// 枚举值策略 (Enum Policy)
// ==========================================
// Reject: 非法枚举值使整行失败（默认）
// FallbackToDefault: 非法枚举值替换为字段默认值并记录警告
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnumPolicy {
    #[default]
    Reject,
    FallbackToDefault,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_format_from_extension() {
        assert_eq!(FileFormat::from_extension("csv"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_extension(".XLSX"), Some(FileFormat::Xlsx));
        assert_eq!(FileFormat::from_extension("xls"), None);
        assert_eq!(FileFormat::from_extension("txt"), None);
    }

    #[test]
    fn test_enum_policy_default_is_reject() {
        assert_eq!(EnumPolicy::default(), EnumPolicy::Reject);
    }
}
