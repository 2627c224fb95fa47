// ==========================================
// 销售 CRM 线索导入 - 映射校验器实现
// ==========================================
// 职责: 提交前的映射闸门
// - 必填字段是否都有源列（缺失以列表返回，便于一次性修正）
// - 目标字段是否存在于注册表
// - 映射项绑定到表头位置（重名表头按出现顺序依次绑定）
// - 多列映射到同一字段: 按表头顺序首列生效，其余忽略并告警
// ==========================================

use crate::domain::lead::{BoundMapping, ColumnMapping};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_schema::FieldSchema;
use std::collections::{HashMap, HashSet};

/// 重复映射（同一目标字段对应多列）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateTarget {
    pub field: String,
    pub kept_column: String,
    pub ignored_column: String,
}

impl DuplicateTarget {
    pub fn warning(&self) -> String {
        format!(
            "Columns '{}' and '{}' both map to {}; using '{}'",
            self.kept_column, self.ignored_column, self.field, self.kept_column
        )
    }
}

/// 校验通过的映射方案
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingPlan {
    pub bound: Vec<BoundMapping>,
    pub warnings: Vec<String>,
}

pub struct MappingValidator;

impl MappingValidator {
    /// 缺失的必填字段（空列表 = 通过）
    pub fn missing_required(mappings: &[ColumnMapping], schema: &FieldSchema) -> Vec<String> {
        Self::missing_from(
            mappings.iter().filter_map(|m| m.target_field.as_deref()),
            schema,
        )
    }

    fn missing_from<'a>(targets: impl Iterator<Item = &'a str>, schema: &FieldSchema) -> Vec<String> {
        let mapped: HashSet<&str> = targets.collect();
        schema
            .required_fields()
            .into_iter()
            .filter(|f| !mapped.contains(f.name))
            .map(|f| f.name.to_string())
            .collect()
    }

    /// 注册表中不存在的目标字段（去重，保持出现顺序）
    pub fn unknown_targets(mappings: &[ColumnMapping], schema: &FieldSchema) -> Vec<String> {
        let mut seen = HashSet::new();
        mappings
            .iter()
            .filter_map(|m| m.target_field.as_deref())
            .filter(|t| !schema.contains(t))
            .filter(|t| seen.insert(*t))
            .map(str::to_string)
            .collect()
    }

    /// 同一目标字段被多列映射的情况（按给定顺序，首列保留）
    pub fn duplicate_targets(mappings: &[ColumnMapping]) -> Vec<DuplicateTarget> {
        let mut first_column: HashMap<&str, &str> = HashMap::new();
        let mut duplicates = Vec::new();

        for mapping in mappings {
            let Some(target) = mapping.target_field.as_deref() else {
                continue;
            };
            match first_column.get(target) {
                Some(kept) => duplicates.push(DuplicateTarget {
                    field: target.to_string(),
                    kept_column: kept.to_string(),
                    ignored_column: mapping.source_column.clone(),
                }),
                None => {
                    first_column.insert(target, &mapping.source_column);
                }
            }
        }

        duplicates
    }

    /// 将映射项绑定到表头位置
    ///
    /// # 规则
    /// - 第 i 个映射项优先绑定第 i 列（表头同名时），否则绑定第一个未占用的同名列
    /// - 文件中不存在的列: 有目标字段时告警，随后忽略
    /// - 返回结果按列位置排序
    pub fn bind(headers: &[String], mappings: &[ColumnMapping]) -> (Vec<BoundMapping>, Vec<String>) {
        let mut claimed = vec![false; headers.len()];
        let mut bound = Vec::with_capacity(mappings.len());
        let mut warnings = Vec::new();

        for (idx, mapping) in mappings.iter().enumerate() {
            let source = mapping.source_column.trim();
            let position = if idx < headers.len() && !claimed[idx] && headers[idx] == source {
                Some(idx)
            } else {
                headers
                    .iter()
                    .enumerate()
                    .position(|(j, h)| !claimed[j] && h == source)
            };

            match position {
                Some(column_index) => {
                    claimed[column_index] = true;
                    bound.push(BoundMapping {
                        column_index,
                        source_column: headers[column_index].clone(),
                        target_field: mapping.target_field.clone(),
                    });
                }
                None => {
                    if let Some(target) = &mapping.target_field {
                        warnings.push(format!(
                            "Mapped column '{}' (-> {}) not found in file; ignored",
                            mapping.source_column, target
                        ));
                    }
                }
            }
        }

        bound.sort_by_key(|b| b.column_index);
        (bound, warnings)
    }

    /// 提交前闸门：绑定 + 未知字段 + 必填字段 + 重复映射处理
    ///
    /// # 返回
    /// - Ok(MappingPlan): 可直接交给批量导入
    /// - Err(UnknownTargetFields / MissingRequiredMappings): 映射需修正，不得写入任何数据
    pub fn check(
        headers: &[String],
        mappings: &[ColumnMapping],
        schema: &FieldSchema,
    ) -> ImportResult<MappingPlan> {
        let unknown = Self::unknown_targets(mappings, schema);
        if !unknown.is_empty() {
            return Err(ImportError::UnknownTargetFields(unknown));
        }

        let (mut bound, mut warnings) = Self::bind(headers, mappings);

        let missing = Self::missing_from(
            bound.iter().filter_map(|b| b.target_field.as_deref()),
            schema,
        );
        if !missing.is_empty() {
            return Err(ImportError::MissingRequiredMappings(missing));
        }

        // 首列生效：后续重复映射改为跳过
        let as_mappings: Vec<ColumnMapping> = bound
            .iter()
            .map(|b| ColumnMapping::new(b.source_column.clone(), b.target_field.as_deref()))
            .collect();
        let duplicates = Self::duplicate_targets(&as_mappings);
        if !duplicates.is_empty() {
            let mut seen = HashSet::new();
            for b in &mut bound {
                if let Some(target) = &b.target_field {
                    if !seen.insert(target.clone()) {
                        b.target_field = None;
                    }
                }
            }
            warnings.extend(duplicates.iter().map(DuplicateTarget::warning));
        }

        Ok(MappingPlan { bound, warnings })
    }
}
