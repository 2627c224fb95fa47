// ==========================================
// 销售 CRM 线索导入 - 导入器实现
// ==========================================
// 职责: 整合导入流程，从上传文件到落库
// 流程: 解码 → 映射校验 → 指派人解析 → 逐行转换/校验 → 逐行落库 → 汇总
// 红线:
// - 映射校验失败 / 指派人不存在时不写入任何数据
// - 单行失败（校验或落库）只记录，不中断批次
// - 行按文件顺序串行处理，落库调用逐个 await
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::lead::{
    AssigneeId, ColumnMapping, DecodedTable, ImportReport, ImportRowOutcome, RowFailure,
};
use crate::domain::types::EnumPolicy;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_schema::FieldSchema;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::lead_importer_trait::{FieldMapper, LeadImporter, RowTransformer};
use crate::importer::mapping_validator::{MappingPlan, MappingValidator};
use crate::repository::{AssigneeDirectory, LeadImportRepository};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// LeadImporterImpl - 线索导入器实现
// ==========================================
pub struct LeadImporterImpl<R, D, C>
where
    R: LeadImportRepository,
    D: AssigneeDirectory,
    C: ImportConfigReader,
{
    // 数据访问层
    lead_repo: R,
    directory: D,

    // 配置读取器
    config: C,

    // 导入组件
    file_parser: UniversalFileParser,
    field_mapper: Box<dyn FieldMapper>,
    row_transformer: Box<dyn RowTransformer>,
}

impl<R, D, C> LeadImporterImpl<R, D, C>
where
    R: LeadImportRepository,
    D: AssigneeDirectory,
    C: ImportConfigReader,
{
    /// 创建新的 LeadImporter 实例
    ///
    /// # 参数
    /// - lead_repo: 线索仓储
    /// - directory: 指派人目录
    /// - config: 配置读取器
    /// - field_mapper: 映射推断器
    /// - row_transformer: 行转换器
    pub fn new(
        lead_repo: R,
        directory: D,
        config: C,
        field_mapper: Box<dyn FieldMapper>,
        row_transformer: Box<dyn RowTransformer>,
    ) -> Self {
        Self {
            lead_repo,
            directory,
            config,
            file_parser: UniversalFileParser,
            field_mapper,
            row_transformer,
        }
    }

    /// 为表头推断映射建议
    pub fn infer_mappings(&self, headers: &[String]) -> Vec<ColumnMapping> {
        self.field_mapper.infer_mappings(headers)
    }

    /// 按当前配置构造字段注册表视图
    pub async fn schema(&self) -> ImportResult<FieldSchema> {
        let schema = FieldSchema::lead();
        if self.config.get_require_email().await? {
            Ok(schema.with_required(&["email"]))
        } else {
            Ok(schema)
        }
    }

    async fn enum_policy(&self) -> ImportResult<EnumPolicy> {
        if self.config.get_enum_fallback().await? {
            Ok(EnumPolicy::FallbackToDefault)
        } else {
            Ok(EnumPolicy::Reject)
        }
    }

    /// 解析指派人（不存在或停用 → AssigneeNotFound）
    pub async fn resolve_assignee(&self, identifier: &str) -> ImportResult<AssigneeId> {
        match self.directory.resolve_assignee(identifier).await? {
            Some(id) => Ok(id),
            None => {
                warn!(assignee = %identifier, "指派人不存在或已停用");
                Err(ImportError::AssigneeNotFound(identifier.trim().to_string()))
            }
        }
    }

    /// 批量导入（映射已校验、指派人已解析）
    ///
    /// # 参数
    /// - batch_id: 批次 ID
    /// - table: 完整解码后的表格
    /// - plan: 校验通过的映射方案
    /// - schema: 字段注册表视图
    /// - assignee: 指派人
    /// - policy: 非法枚举值处理策略
    ///
    /// # 返回
    /// - ImportReport: 不失败；所有行级问题都进入 failures
    pub async fn run_import(
        &self,
        batch_id: &str,
        table: &DecodedTable,
        plan: &MappingPlan,
        schema: &FieldSchema,
        assignee: &AssigneeId,
        policy: EnumPolicy,
    ) -> ImportReport {
        let mut successful_count = 0;
        let mut failures = Vec::new();
        let mut row_warnings = Vec::new();

        for row in &table.rows {
            let outcome = self.row_transformer.transform(
                row,
                &table.headers,
                &plan.bound,
                schema,
                policy,
            );

            match outcome {
                ImportRowOutcome::Success {
                    row: line,
                    record,
                    warnings,
                } => match self.lead_repo.persist_lead(&record, assignee, batch_id).await {
                    Ok(record_id) => {
                        debug!(row = line, record_id = %record_id, "行导入成功");
                        successful_count += 1;
                        row_warnings.extend(warnings);
                    }
                    Err(e) => {
                        warn!(row = line, error = %e, "行落库失败");
                        failures.push(RowFailure {
                            row: line,
                            data: row.to_raw(&table.headers),
                            reason: e.to_string(),
                        });
                    }
                },
                ImportRowOutcome::Failure(failure) => {
                    debug!(row = failure.row, reason = %failure.reason, "行校验失败");
                    failures.push(failure);
                }
            }
        }

        let warnings = collect_warnings(table, plan, row_warnings);

        ImportReport {
            batch_id: batch_id.to_string(),
            successful_count,
            failed_count: failures.len(),
            warnings,
            failures,
        }
    }
}

/// 汇总批次警告（解码提示 → 行宽异常 → 映射 → 行级），去重并保持首次出现顺序
fn collect_warnings(table: &DecodedTable, plan: &MappingPlan, row_warnings: Vec<String>) -> Vec<String> {
    let mut all = table.notes.clone();

    if table.padded_rows > 0 {
        all.push(format!(
            "{} row(s) had fewer cells than the header; missing cells were treated as empty",
            table.padded_rows
        ));
    }
    if table.truncated_rows > 0 {
        all.push(format!(
            "{} row(s) had more cells than the header; extra cells were ignored",
            table.truncated_rows
        ));
    }

    all.extend(plan.warnings.iter().cloned());
    all.extend(row_warnings);

    let mut seen = HashSet::new();
    all.retain(|w| seen.insert(w.clone()));
    all
}

#[async_trait]
impl<R, D, C> LeadImporter for LeadImporterImpl<R, D, C>
where
    R: LeadImportRepository + Send + Sync,
    D: AssigneeDirectory + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn preview_file(&self, file_name: &str, bytes: &[u8]) -> ImportResult<DecodedTable> {
        let limit = self.config.get_preview_row_limit().await?;
        let table = self
            .file_parser
            .decode_file_name(file_name, bytes, Some(limit))?;

        info!(
            columns = table.headers.len(),
            preview_rows = table.rows.len(),
            total_rows = table.total_row_count,
            "文件预览完成"
        );
        Ok(table)
    }

    #[instrument(skip(self, bytes, mappings), fields(batch_id))]
    async fn import_file(
        &self,
        file_name: &str,
        bytes: &[u8],
        mappings: &[ColumnMapping],
        assignee: &str,
    ) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, file_name = %file_name, "开始导入线索");

        // === 步骤 1: 解码（全量） ===
        let table = self.file_parser.decode_file_name(file_name, bytes, None)?;
        debug!(total_rows = table.total_row_count, "文件解码完成");

        // === 步骤 2: 映射校验 ===
        let schema = self.schema().await?;
        let plan = MappingValidator::check(&table.headers, mappings, &schema)?;

        // === 步骤 3: 指派人解析 ===
        let assignee_id = self.resolve_assignee(assignee).await?;

        // === 步骤 4: 逐行导入 ===
        let policy = self.enum_policy().await?;
        let report = self
            .run_import(&batch_id, &table, &plan, &schema, &assignee_id, policy)
            .await;

        info!(
            batch_id = %batch_id,
            success = report.successful_count,
            failed = report.failed_count,
            warnings = report.warnings.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "线索导入完成"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(notes: Vec<String>, padded: usize, truncated: usize) -> DecodedTable {
        DecodedTable {
            headers: vec!["Company".into()],
            rows: vec![],
            total_row_count: 0,
            padded_rows: padded,
            truncated_rows: truncated,
            notes,
        }
    }

    #[test]
    fn test_collect_warnings_order_and_dedup() {
        let plan = MappingPlan {
            bound: vec![],
            warnings: vec!["mapping".into(), "dup".into()],
        };
        let warnings = collect_warnings(
            &table(vec!["decoded as Latin-1".into()], 2, 0),
            &plan,
            vec!["dup".into(), "row".into(), "row".into()],
        );

        assert_eq!(warnings.len(), 5);
        assert_eq!(warnings[0], "decoded as Latin-1");
        assert!(warnings[1].starts_with("2 row(s) had fewer cells"));
        assert_eq!(&warnings[2..], &["mapping", "dup", "row"]);
    }

    #[test]
    fn test_collect_warnings_empty() {
        let plan = MappingPlan {
            bound: vec![],
            warnings: vec![],
        };
        assert!(collect_warnings(&table(vec![], 0, 0), &plan, vec![]).is_empty());
    }

    #[test]
    fn test_truncation_warning() {
        let plan = MappingPlan {
            bound: vec![],
            warnings: vec![],
        };
        let warnings = collect_warnings(&table(vec![], 0, 3), &plan, vec![]);
        assert_eq!(
            warnings,
            vec!["3 row(s) had more cells than the header; extra cells were ignored"]
        );
    }
}
