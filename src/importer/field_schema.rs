// ==========================================
// 销售 CRM 线索导入 - 字段注册表
// ==========================================
// 职责: 线索可导入字段的唯一来源（推断规则与校验器共用）
// 红线: 纯数据，进程内只读，不在其他模块重复定义字段
// ==========================================

use crate::domain::lead::FieldDescriptor;
use crate::domain::types::FieldKind;
use serde::Serialize;

// ===== 枚举取值 =====

pub const LEAD_STATUS_OPTIONS: &[&str] = &["open", "qualified", "proposal", "closed"];

pub const PHONE_LABELS: &[&str] = &["work", "mobile", "home", "fax", "other"];

pub const TYPE_OPTIONS: &[&str] = &[
    "None",
    "Oil & Gas",
    "Secondary Containment",
    "Industrial",
    "Municipal",
    "Construction",
    "Other",
];

const fn text(
    name: &'static str,
    description: &'static str,
    example: &'static str,
    max_length: Option<usize>,
) -> FieldDescriptor {
    FieldDescriptor {
        name,
        required: false,
        description,
        example: Some(example),
        allowed_values: &[],
        kind: FieldKind::Text,
        max_length,
        default_value: None,
        default_requires: None,
    }
}

// ==========================================
// LEAD_FIELDS - 线索字段表
// ==========================================
// 顺序即校验顺序（必填字段优先，失败时快速返回）
pub static LEAD_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "name",
        required: true,
        description: "Company or organization name",
        example: Some("Example Corp"),
        allowed_values: &[],
        kind: FieldKind::Text,
        max_length: Some(100),
        default_value: None,
        default_requires: None,
    },
    text("contact_person", "Primary contact person name", "John Smith", Some(100)),
    text("contact_title", "Contact person job title", "Manager", Some(100)),
    FieldDescriptor {
        name: "email",
        required: false,
        description: "Primary email address",
        example: Some("john@example.com"),
        allowed_values: &[],
        kind: FieldKind::Email,
        max_length: Some(120),
        default_value: None,
        default_requires: None,
    },
    FieldDescriptor {
        name: "phone",
        required: false,
        description: "Primary phone number",
        example: Some("(555) 123-4567"),
        allowed_values: &[],
        kind: FieldKind::Phone,
        max_length: Some(20),
        default_value: None,
        default_requires: None,
    },
    FieldDescriptor {
        name: "phone_label",
        required: false,
        description: "Primary phone type (work, mobile, home, fax, other)",
        example: Some("work"),
        allowed_values: PHONE_LABELS,
        kind: FieldKind::Enum,
        max_length: None,
        default_value: Some("work"),
        default_requires: Some("phone"),
    },
    FieldDescriptor {
        name: "secondary_phone",
        required: false,
        description: "Secondary phone number",
        example: Some("(555) 234-5678"),
        allowed_values: &[],
        kind: FieldKind::Phone,
        max_length: Some(20),
        default_value: None,
        default_requires: None,
    },
    FieldDescriptor {
        name: "secondary_phone_label",
        required: false,
        description: "Secondary phone type",
        example: Some("mobile"),
        allowed_values: PHONE_LABELS,
        kind: FieldKind::Enum,
        max_length: None,
        default_value: Some("mobile"),
        default_requires: Some("secondary_phone"),
    },
    text("address", "Street address", "123 Main St", Some(255)),
    text("city", "City name", "Houston", Some(100)),
    text("state", "State or province", "TX", Some(100)),
    text("zip", "ZIP or postal code", "77001", Some(20)),
    text("notes", "Additional notes or comments", "Contact from trade show", None),
    FieldDescriptor {
        name: "type",
        required: false,
        description: "Business or industry type",
        example: Some("Oil & Gas"),
        allowed_values: TYPE_OPTIONS,
        kind: FieldKind::Enum,
        max_length: None,
        default_value: Some("None"),
        default_requires: None,
    },
    FieldDescriptor {
        name: "lead_status",
        required: false,
        description: "Current lead status (open, qualified, proposal, closed)",
        example: Some("open"),
        allowed_values: LEAD_STATUS_OPTIONS,
        kind: FieldKind::Enum,
        max_length: None,
        default_value: Some("open"),
        default_requires: None,
    },
];

// ==========================================
// FieldSchema - 字段注册表视图
// ==========================================
// 默认视图直接引用 LEAD_FIELDS；with_required 生成额外必填的派生视图
#[derive(Debug, Clone)]
pub struct FieldSchema {
    fields: Vec<FieldDescriptor>,
}

impl FieldSchema {
    /// 线索字段注册表
    pub fn lead() -> Self {
        Self {
            fields: LEAD_FIELDS.to_vec(),
        }
    }

    /// 从任意描述表构建（测试与其他实体复用）
    pub fn from_fields(fields: &[FieldDescriptor]) -> Self {
        Self {
            fields: fields.to_vec(),
        }
    }

    /// 额外标记若干字段为必填（未知字段名忽略）
    pub fn with_required(mut self, names: &[&str]) -> Self {
        for field in &mut self.fields {
            if names.contains(&field.name) {
                field.required = true;
            }
        }
        self
    }

    pub fn all_fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn required_fields(&self) -> Vec<&FieldDescriptor> {
        self.fields.iter().filter(|f| f.required).collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// 导出字段定义（供映射界面使用）
    pub fn definitions(&self) -> Vec<FieldDefinition> {
        self.fields.iter().map(FieldDefinition::from).collect()
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::lead()
    }
}

/// 字段定义（前端展示用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    pub field: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl From<&FieldDescriptor> for FieldDefinition {
    fn from(d: &FieldDescriptor) -> Self {
        Self {
            field: d.name.to_string(),
            required: d.required,
            kind: d.kind,
            description: d.description.to_string(),
            example: d.example.map(str::to_string),
            max_length: d.max_length,
            choices: d.allowed_values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_are_unique() {
        let mut seen = HashSet::new();
        for field in LEAD_FIELDS {
            assert!(seen.insert(field.name), "重复字段: {}", field.name);
        }
    }

    #[test]
    fn test_required_fields_default() {
        let schema = FieldSchema::lead();
        let required: Vec<&str> = schema.required_fields().iter().map(|f| f.name).collect();
        assert_eq!(required, vec!["name"]);
    }

    #[test]
    fn test_with_required_marks_email() {
        let schema = FieldSchema::lead().with_required(&["email", "no_such_field"]);
        let required: Vec<&str> = schema.required_fields().iter().map(|f| f.name).collect();
        assert_eq!(required, vec!["name", "email"]);
        // 静态表不受影响
        assert!(!FieldSchema::lead().field("email").unwrap().required);
    }

    #[test]
    fn test_enum_fields_have_valid_defaults() {
        for field in LEAD_FIELDS.iter().filter(|f| f.kind == FieldKind::Enum) {
            assert!(!field.allowed_values.is_empty(), "{} 缺少取值", field.name);
            if let Some(default) = field.default_value {
                assert!(field.canonical_value(default).is_some(), "{} 默认值非法", field.name);
            }
            if let Some(dep) = field.default_requires {
                assert!(FieldSchema::lead().contains(dep));
            }
        }
    }

    #[test]
    fn test_canonical_value_case_insensitive() {
        let schema = FieldSchema::lead();
        let status = schema.field("lead_status").unwrap();
        assert_eq!(status.canonical_value("QUALIFIED"), Some("qualified"));
        assert_eq!(status.canonical_value("bogus"), None);

        let kind = schema.field("type").unwrap();
        assert_eq!(kind.canonical_value("oil & gas"), Some("Oil & Gas"));
    }

    #[test]
    fn test_definitions_serialize() {
        let defs = FieldSchema::lead().definitions();
        let status = defs.iter().find(|d| d.field == "lead_status").unwrap();
        let value = serde_json::to_value(status).unwrap();

        assert_eq!(value["type"], "enum");
        assert_eq!(value["choices"][0], "open");
        assert!(value.get("max_length").is_none());
    }
}
