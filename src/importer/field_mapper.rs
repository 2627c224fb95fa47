// ==========================================
// 销售 CRM 线索导入 - 映射推断器实现
// ==========================================
// 职责: 源列名 → 目标字段（启发式，结果供人工确认）
// 算法:
// 1. 表头标准化（小写 + 去除非字母数字字符）
// 2. 按优先级顺序逐条匹配 INFERENCE_RULES，首条命中即采用
// 3. 无命中 → 跳过该列（不是错误）
// 红线: 纯函数，同一表头文本永远得到同一结果
// ==========================================

use crate::domain::lead::ColumnMapping;
use crate::importer::lead_importer_trait::FieldMapper as FieldMapperTrait;

// ==========================================
// InferenceRule - 推断规则
// ==========================================
// require 中每一组至少命中一个片段，且 exclude 中片段均不出现
#[derive(Debug, Clone, Copy)]
pub struct InferenceRule {
    pub target: &'static str,
    pub require: &'static [&'static [&'static str]],
    pub exclude: &'static [&'static str],
}

impl InferenceRule {
    pub fn matches(&self, normalized: &str) -> bool {
        self.require
            .iter()
            .all(|group| group.iter().any(|token| normalized.contains(token)))
            && !self.exclude.iter().any(|token| normalized.contains(token))
    }
}

const SECONDARY: &[&str] = &["secondary", "alternate", "alt", "second", "other"];
const PHONE: &[&str] = &["phone", "telephone", "cell", "mobile"];
const LABEL: &[&str] = &["type", "label", "kind"];

// 具体规则必须排在通用规则之前（如 secondary phone 在 phone 之前）
pub static INFERENCE_RULES: &[InferenceRule] = &[
    // ===== 电话族 =====
    InferenceRule {
        target: "secondary_phone_label",
        require: &[SECONDARY, PHONE, LABEL],
        exclude: &[],
    },
    InferenceRule {
        target: "phone_label",
        require: &[PHONE, LABEL],
        exclude: &[],
    },
    InferenceRule {
        target: "secondary_phone",
        require: &[SECONDARY, PHONE],
        exclude: &[],
    },
    InferenceRule {
        target: "phone",
        require: &[PHONE],
        exclude: &[],
    },
    // ===== 联系方式 =====
    InferenceRule {
        target: "email",
        require: &[&["email", "mail"]],
        exclude: &["mailing", "street"],
    },
    // ===== 地址族（先于公司名，避免 "Company Address" 被名称规则吞掉） =====
    InferenceRule {
        target: "zip",
        require: &[&["zip", "postal", "postcode"]],
        exclude: &["address", "street"],
    },
    InferenceRule {
        target: "address",
        require: &[&["address", "street"]],
        exclude: &[],
    },
    InferenceRule {
        target: "city",
        require: &[&["city", "town"]],
        exclude: &[],
    },
    InferenceRule {
        target: "state",
        require: &[&["state", "province", "region"]],
        exclude: &["estate"],
    },
    // ===== 联系人 =====
    InferenceRule {
        target: "contact_title",
        require: &[&["title", "position", "role"]],
        exclude: &[],
    },
    InferenceRule {
        target: "contact_person",
        require: &[&["contact", "person", "firstname", "lastname", "fullname"]],
        exclude: &[],
    },
    // ===== 状态与分类 =====
    InferenceRule {
        target: "lead_status",
        require: &[&["status", "stage"]],
        exclude: &[],
    },
    InferenceRule {
        target: "type",
        require: &[&["type", "industry", "category", "sector"]],
        exclude: &[],
    },
    InferenceRule {
        target: "notes",
        require: &[&["note", "comment", "description", "remark"]],
        exclude: &[],
    },
    // ===== 名称 =====
    InferenceRule {
        target: "name",
        require: &[&[
            "company",
            "plant",
            "organization",
            "organisation",
            "business",
            "account",
            "customer",
            "facility",
        ]],
        exclude: &[],
    },
    InferenceRule {
        target: "name",
        require: &[&["name"]],
        exclude: &[],
    },
];

/// 表头标准化：小写 + 去除所有非字母数字字符
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// 推断单个表头的目标字段
pub fn infer_field(header: &str) -> Option<&'static str> {
    let normalized = normalize_header(header);
    if normalized.is_empty() {
        return None;
    }
    INFERENCE_RULES
        .iter()
        .find(|rule| rule.matches(&normalized))
        .map(|rule| rule.target)
}

pub struct FieldMapper;

impl FieldMapperTrait for FieldMapper {
    fn infer_mappings(&self, headers: &[String]) -> Vec<ColumnMapping> {
        headers
            .iter()
            .map(|header| ColumnMapping::new(header.clone(), infer_field(header)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::field_schema::FieldSchema;

    fn headers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rule_targets_exist_in_registry() {
        let schema = FieldSchema::lead();
        for rule in INFERENCE_RULES {
            assert!(schema.contains(rule.target), "未知目标字段: {}", rule.target);
        }
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Company Name"), "companyname");
        assert_eq!(normalize_header(" ZIP-Code (5) "), "zipcode5");
        assert_eq!(normalize_header("---"), "");
        // 只保留 ASCII 字母数字
        assert_eq!(normalize_header("Café Name"), "cafname");
    }

    #[test]
    fn test_infer_common_headers() {
        let cases = [
            ("Company Name", Some("name")),
            ("Plant", Some("name")),
            ("Name", Some("name")),
            ("Contact Email", Some("email")),
            ("E-mail Address", Some("email")),
            ("Status", Some("lead_status")),
            ("Lead Status", Some("lead_status")),
            ("Phone", Some("phone")),
            ("Telephone", Some("phone")),
            ("Secondary Phone", Some("secondary_phone")),
            ("Alt. Phone", Some("secondary_phone")),
            ("Phone Type", Some("phone_label")),
            ("secondary_phone_type", Some("secondary_phone_label")),
            ("Contact Person", Some("contact_person")),
            ("Contact Name", Some("contact_person")),
            ("Contact Title", Some("contact_title")),
            ("Street Address", Some("address")),
            ("Company Address", Some("address")),
            ("City", Some("city")),
            ("State", Some("state")),
            ("Zip Code", Some("zip")),
            ("Business Type", Some("type")),
            ("Industry", Some("type")),
            ("Notes", Some("notes")),
            ("Favourite Colour", None),
            // 通用片段不能抢走更具体的字段
            ("Mailing Address", Some("address")),
            ("Postal Address", Some("address")),
            ("Postal Code", Some("zip")),
            ("Hotel Name", Some("name")),
            ("Real Estate Name", Some("name")),
            ("Mail", Some("email")),
            ("", None),
        ];

        for (header, expected) in cases {
            assert_eq!(infer_field(header), expected, "header: {:?}", header);
        }
    }

    #[test]
    fn test_specific_phone_rule_not_shadowed() {
        // 通用 phone 规则不能吞掉 secondary phone
        assert_eq!(infer_field("Phone (Secondary)"), Some("secondary_phone"));
        assert_eq!(infer_field("Phone"), Some("phone"));
    }

    #[test]
    fn test_infer_mappings_is_total_and_order_preserving() {
        let input = headers(&["Company Name", "???", "Contact Email", "Company Name"]);
        let mappings = FieldMapper.infer_mappings(&input);

        assert_eq!(mappings.len(), input.len());
        for (mapping, header) in mappings.iter().zip(input.iter()) {
            assert_eq!(&mapping.source_column, header);
        }
        assert_eq!(mappings[1].target_field, None);
        // 重复表头各自推断
        assert_eq!(mappings[0].target_field.as_deref(), Some("name"));
        assert_eq!(mappings[3].target_field.as_deref(), Some("name"));
    }

    #[test]
    fn test_infer_is_idempotent() {
        let input = headers(&["Company Name", "Contact Email", "Status", "Mobile #"]);
        let first = FieldMapper.infer_mappings(&input);
        let second = FieldMapper.infer_mappings(&input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_infer_empty_headers() {
        assert!(FieldMapper.infer_mappings(&[]).is_empty());
    }
}
