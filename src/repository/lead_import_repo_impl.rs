// ==========================================
// 销售 CRM 线索导入 - 导入 Repository 实现
// ==========================================
// 职责: 实现线索落库与指派人查询（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 约束: 每条线索单独提交（autocommit），不包批次事务
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::lead::{AssigneeId, LeadRecord, RecordId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::lead_import_repo::{AssigneeDirectory, LeadImportRepository};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// leads 表中与线索字段一一对应的列
pub const LEAD_COLUMNS: &[&str] = &[
    "name",
    "contact_person",
    "contact_title",
    "email",
    "phone",
    "phone_label",
    "secondary_phone",
    "secondary_phone_label",
    "address",
    "city",
    "state",
    "zip",
    "notes",
    "type",
    "lead_status",
];

fn open(db_path: &str) -> RepositoryResult<Connection> {
    open_sqlite_connection(db_path)
        .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))
}

fn quoted_columns() -> String {
    LEAD_COLUMNS
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ")
}

// ==========================================
// LeadImportRepositoryImpl
// ==========================================
pub struct LeadImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl LeadImportRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(open(db_path)?)),
        })
    }

    /// 从已有连接创建（与其他仓储共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 查询指定批次写入的线索（按写入顺序）
    pub fn list_by_batch(&self, batch_id: &str) -> RepositoryResult<Vec<(RecordId, LeadRecord)>> {
        let conn = self.conn.lock()?;

        let sql = format!(
            "SELECT id, {} FROM leads WHERE import_batch_id = ?1 ORDER BY rowid",
            quoted_columns()
        );
        let mut stmt = conn.prepare(&sql)?;

        let leads = stmt
            .query_map(params![batch_id], |row| {
                let id: String = row.get(0)?;
                let mut record = LeadRecord::new();
                for (idx, column) in LEAD_COLUMNS.iter().enumerate() {
                    if let Some(value) = row.get::<_, Option<String>>(idx + 1)? {
                        record.insert(column, value);
                    }
                }
                Ok((RecordId(id), record))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(leads)
    }
}

#[async_trait]
impl LeadImportRepository for LeadImportRepositoryImpl {
    async fn persist_lead(
        &self,
        record: &LeadRecord,
        assignee: &AssigneeId,
        batch_id: &str,
    ) -> RepositoryResult<RecordId> {
        if let Some((field, _)) = record.iter().find(|(f, _)| !LEAD_COLUMNS.contains(f)) {
            return Err(RepositoryError::FieldValueError {
                field: field.to_string(),
                message: "no such column in leads".to_string(),
            });
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        // 只写入有值的列，缺省列交给表默认值
        let present: Vec<(&str, &str)> = LEAD_COLUMNS
            .iter()
            .filter_map(|c| record.get(c).map(|v| (*c, v)))
            .collect();

        let columns = present
            .iter()
            .map(|(c, _)| format!(", \"{}\"", c))
            .collect::<String>();
        let placeholders = (1..=present.len() + 5)
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO leads (id{}, assigned_user_id, import_batch_id, created_at, updated_at) VALUES ({})",
            columns, placeholders
        );

        let mut bound: Vec<&dyn ToSql> = Vec::with_capacity(present.len() + 5);
        bound.push(&id);
        for (_, value) in &present {
            bound.push(value);
        }
        bound.push(&assignee.0);
        bound.push(&batch_id);
        bound.push(&now);
        bound.push(&now);

        let conn = self.conn.lock()?;
        conn.execute(&sql, bound.as_slice())?;

        debug!(lead_id = %id, batch_id = %batch_id, "线索已写入");
        Ok(RecordId(id))
    }
}

// ==========================================
// UserDirectoryImpl - 指派人目录（users 表）
// ==========================================
pub struct UserDirectoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl UserDirectoryImpl {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        Ok(Self {
            conn: Arc::new(Mutex::new(open(db_path)?)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 注册用户（邮箱唯一）
    ///
    /// # 返回
    /// - Ok(AssigneeId): 新用户 ID
    /// - Err(UniqueConstraintViolation): 邮箱已存在
    pub fn register_user(
        &self,
        email: &str,
        display_name: &str,
        is_active: bool,
    ) -> RepositoryResult<AssigneeId> {
        let conn = self.conn.lock()?;
        let id = Uuid::new_v4().to_string();

        conn.execute(
            "INSERT INTO users (id, email, display_name, is_active, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                email.trim().to_lowercase(),
                display_name,
                is_active as i32,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(AssigneeId(id))
    }
}

#[async_trait]
impl AssigneeDirectory for UserDirectoryImpl {
    async fn resolve_assignee(&self, identifier: &str) -> RepositoryResult<Option<AssigneeId>> {
        let conn = self.conn.lock()?;

        let id = conn
            .query_row(
                "SELECT id FROM users WHERE lower(email) = lower(?1) AND is_active = 1",
                params![identifier.trim()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(id.map(AssigneeId))
    }
}
