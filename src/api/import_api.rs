// ==========================================
// 线索导入API
// ==========================================
// 职责: 封装线索导入相关功能（预览 / 映射建议 / 导入 / 字段定义 / 模板）
// 约束: 上传通道不在此层；所有入口接收 (文件名, 字节)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{config_keys, ConfigManager};
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::lead::{ColumnMapping, RowFailure};
use crate::importer::{
    generic_template_csv, FieldDefinition, FieldMapperImpl, ImportError, LeadImporter,
    LeadImporterImpl, RowTransformerImpl,
};
use crate::repository::{LeadImportRepositoryImpl, UserDirectoryImpl};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::info;

type SqliteLeadImporter = LeadImporterImpl<LeadImportRepositoryImpl, UserDirectoryImpl, ConfigManager>;

/// 预览响应
#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    /// 表头（文件原始顺序）
    pub headers: Vec<String>,
    /// 前 N 行（按列位置排列的原始单元格，重复表头不会互相覆盖）
    pub rows: Vec<Vec<String>>,
    /// 数据行总数（不受预览行数限制）
    #[serde(rename = "totalRows")]
    pub total_rows: usize,
}

/// 映射建议响应
#[derive(Debug, Clone, Serialize)]
pub struct MappingSuggestionResponse {
    pub headers: Vec<String>,
    /// 每个表头一项，leadField 为 null 表示建议跳过
    pub mappings: Vec<ColumnMapping>,
    #[serde(rename = "totalRows")]
    pub total_rows: usize,
}

/// 导入响应
#[derive(Debug, Clone, Serialize)]
pub struct ImportApiResponse {
    pub message: String,
    pub successful_imports: usize,
    pub failed_imports: usize,
    pub warnings: Vec<String>,
    pub failures: Vec<RowFailure>,
    /// 导入批次ID（落库记录可据此追溯）
    pub batch_id: String,
}

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// 预览上传文件
    ///
    /// # 参数
    /// - file_name: 原始文件名（.csv / .xlsx）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(PreviewResponse): 表头 + 前 N 行 + 总行数
    /// - Err(ApiError::InvalidFile): 格式不支持 / 空文件 / 文件损坏
    pub async fn preview_lead_file(&self, file_name: &str, bytes: &[u8]) -> ApiResult<PreviewResponse> {
        let importer = self.create_importer()?;
        let table = importer.preview_file(file_name, bytes).await?;

        Ok(PreviewResponse {
            rows: table.rows.into_iter().map(|r| r.cells).collect(),
            headers: table.headers,
            total_rows: table.total_row_count,
        })
    }

    /// 为上传文件生成映射建议（供人工确认）
    pub async fn suggest_lead_mappings(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> ApiResult<MappingSuggestionResponse> {
        let importer = self.create_importer()?;
        let table = importer.preview_file(file_name, bytes).await?;
        let mappings = importer.infer_mappings(&table.headers);

        Ok(MappingSuggestionResponse {
            headers: table.headers,
            mappings,
            total_rows: table.total_row_count,
        })
    }

    /// 通用线索导入（映射以 JSON 提交）
    ///
    /// # 参数
    /// - file_name: 原始文件名
    /// - bytes: 文件内容
    /// - column_mappings_json: `[{"csvColumn": "...", "leadField": "..."}]`
    /// - assigned_user: 指派人邮箱
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 行级成功/失败汇总
    /// - Err(ApiError): 映射格式错误 / 缺必填映射 / 指派人不存在 / 文件错误
    pub async fn import_leads_generic(
        &self,
        file_name: &str,
        bytes: &[u8],
        column_mappings_json: &str,
        assigned_user: &str,
    ) -> ApiResult<ImportApiResponse> {
        let mappings: Vec<ColumnMapping> =
            serde_json::from_str(column_mappings_json).map_err(ImportError::from)?;
        self.import_leads_with_mappings(file_name, bytes, &mappings, assigned_user)
            .await
    }

    /// 通用线索导入（映射已结构化）
    pub async fn import_leads_with_mappings(
        &self,
        file_name: &str,
        bytes: &[u8],
        mappings: &[ColumnMapping],
        assigned_user: &str,
    ) -> ApiResult<ImportApiResponse> {
        let importer = self.create_importer()?;
        let report = importer
            .import_file(file_name, bytes, mappings, assigned_user)
            .await?;

        Ok(ImportApiResponse {
            message: format!(
                "Import completed: {} successful, {} failed",
                report.successful_count, report.failed_count
            ),
            successful_imports: report.successful_count,
            failed_imports: report.failed_count,
            warnings: report.warnings,
            failures: report.failures,
            batch_id: report.batch_id,
        })
    }

    /// 获取线索字段定义（按当前配置标记必填）
    pub async fn get_lead_field_definitions(&self) -> ApiResult<Vec<FieldDefinition>> {
        let importer = self.create_importer()?;
        Ok(importer.schema().await?.definitions())
    }

    /// 下载通用导入模板（CSV 文本）
    pub async fn download_generic_template(&self, with_examples: bool) -> ApiResult<String> {
        let importer = self.create_importer()?;
        let schema = importer.schema().await?;
        Ok(generic_template_csv(&schema, with_examples)?)
    }

    /// 注册可被指派的用户
    pub fn register_user(&self, email: &str, display_name: &str) -> ApiResult<String> {
        let directory = UserDirectoryImpl::from_connection(self.open_shared_connection()?);
        let id = directory.register_user(email, display_name, true)?;
        info!(user_id = %id, email = %email, "用户已注册");
        Ok(id.0)
    }

    /// 写入导入配置（仅接受已知键）
    pub fn set_import_config(&self, key: &str, value: &str) -> ApiResult<()> {
        if !config_keys::ALL.contains(&key) {
            return Err(ApiError::InvalidInput(format!(
                "Unknown config key '{}'; expected one of: {}",
                key,
                config_keys::ALL.join(", ")
            )));
        }
        let config = ConfigManager::from_connection(self.open_shared_connection()?)?;
        config.set_global_config_value(key, value)?;
        Ok(())
    }

    /// 导入配置快照（JSON）
    pub fn get_import_config_snapshot(&self) -> ApiResult<String> {
        let config = ConfigManager::from_connection(self.open_shared_connection()?)?;
        Ok(config.get_config_snapshot()?)
    }

    /// 打开共享连接并确保表结构存在
    fn open_shared_connection(&self) -> ApiResult<Arc<Mutex<Connection>>> {
        let conn = open_sqlite_connection(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(Arc::new(Mutex::new(conn)))
    }

    /// 创建导入器（三个协作方共享同一连接）
    fn create_importer(&self) -> ApiResult<SqliteLeadImporter> {
        let conn = self.open_shared_connection()?;
        let config = ConfigManager::from_connection(conn.clone())?;

        Ok(LeadImporterImpl::new(
            LeadImportRepositoryImpl::from_connection(conn.clone()),
            UserDirectoryImpl::from_connection(conn),
            config,
            Box::new(FieldMapperImpl),
            Box::new(RowTransformerImpl::new()),
        ))
    }
}
