// ==========================================
// 销售 CRM 线索导入 - 行转换与校验器实现
// ==========================================
// 职责: 单行原始数据 + 映射 → 校验后的 LeadRecord 或行级失败
// 校验顺序:
// 1. 必填字段存在性（首个缺失即失败）
// 2. 逐字段格式校验（邮箱 / 电话 / 枚举 / 长度），收集全部错误后以 "; " 拼接
// 3. 缺省枚举字段填充默认值
// 红线: 纯函数，不访问持久化；失败回显的原始数据不做任何修改
// ==========================================

use crate::domain::lead::{
    BoundMapping, DecodedRow, FieldDescriptor, ImportRowOutcome, LeadRecord, RowFailure,
};
use crate::domain::types::{EnumPolicy, FieldKind};
use crate::importer::data_cleaner::{DataCleaner, MIN_PHONE_DIGITS};
use crate::importer::field_schema::FieldSchema;
use crate::importer::lead_importer_trait::{
    DataCleaner as DataCleanerTrait, RowTransformer as RowTransformerTrait,
};
use std::collections::HashMap;

pub struct RowTransformer {
    cleaner: DataCleaner,
}

impl RowTransformer {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    /// 按映射提取单元格（同一目标字段首个映射列生效）
    fn extract<'m>(
        &self,
        row: &DecodedRow,
        mappings: &'m [BoundMapping],
    ) -> HashMap<&'m str, Option<String>> {
        let mut values: HashMap<&str, Option<String>> = HashMap::new();
        for mapping in mappings {
            let Some(target) = mapping.target_field.as_deref() else {
                continue;
            };
            values.entry(target).or_insert_with(|| {
                row.cell(mapping.column_index)
                    .and_then(|cell| self.cleaner.normalize_null(cell))
            });
        }
        values
    }

    /// 校验单个有值字段
    ///
    /// # 返回
    /// - Ok((规范化值, 可选警告))
    /// - Err(失败原因)
    fn validate_value(
        &self,
        field: &FieldDescriptor,
        value: &str,
        policy: EnumPolicy,
    ) -> Result<(String, Option<String>), String> {
        let (normalized, warning) = match field.kind {
            FieldKind::Text => (value.to_string(), None),
            FieldKind::Email => {
                if !self.cleaner.is_valid_email(value) {
                    return Err(format!("invalid email format for {}", field.name));
                }
                (self.cleaner.clean_email(value), None)
            }
            FieldKind::Phone => {
                let digits = self.cleaner.clean_phone(value);
                if !self.cleaner.is_valid_phone(&digits) {
                    return Err(format!(
                        "invalid phone number for {}: expected at least {} digits",
                        field.name, MIN_PHONE_DIGITS
                    ));
                }
                (digits, None)
            }
            FieldKind::Enum => match field.canonical_value(value) {
                Some(canonical) => (canonical.to_string(), None),
                None => match (policy, field.default_value) {
                    (EnumPolicy::FallbackToDefault, Some(default)) => (
                        default.to_string(),
                        Some(format!(
                            "Unknown {} '{}', using '{}'",
                            field.name, value, default
                        )),
                    ),
                    _ => {
                        return Err(format!(
                            "invalid value '{}' for {}; must be one of: {}",
                            value,
                            field.name,
                            field.allowed_values.join(", ")
                        ))
                    }
                },
            },
        };

        if let Some(max) = field.max_length {
            if normalized.chars().count() > max {
                return Err(format!("{} exceeds maximum length of {}", field.name, max));
            }
        }

        Ok((normalized, warning))
    }
}

impl Default for RowTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl RowTransformerTrait for RowTransformer {
    fn transform(
        &self,
        row: &DecodedRow,
        headers: &[String],
        mappings: &[BoundMapping],
        schema: &FieldSchema,
        policy: EnumPolicy,
    ) -> ImportRowOutcome {
        let fail = |reason: String| {
            ImportRowOutcome::Failure(RowFailure {
                row: row.line_number,
                data: row.to_raw(headers),
                reason,
            })
        };

        let values = self.extract(row, mappings);
        let present = |name: &str| values.get(name).is_some_and(Option::is_some);

        // === 阶段 1: 必填字段 ===
        if let Some(missing) = schema.required_fields().into_iter().find(|f| !present(f.name)) {
            return fail(format!("missing required field {}", missing.name));
        }

        // === 阶段 2: 格式校验 ===
        let mut record = LeadRecord::new();
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        for field in schema.all_fields() {
            match values.get(field.name).and_then(Option::as_deref) {
                Some(value) => match self.validate_value(field, value, policy) {
                    Ok((normalized, warning)) => {
                        record.insert(field.name, normalized);
                        warnings.extend(warning);
                    }
                    Err(reason) => errors.push(reason),
                },
                None => {
                    // === 阶段 3: 默认值 ===
                    if let Some(default) = field.default_value {
                        let applies = field.default_requires.map_or(true, |dep| present(dep));
                        if applies {
                            record.insert(field.name, default);
                        }
                    }
                }
            }
        }

        if !errors.is_empty() {
            return fail(errors.join("; "));
        }

        ImportRowOutcome::Success {
            row: row.line_number,
            record,
            warnings,
        }
    }
}
