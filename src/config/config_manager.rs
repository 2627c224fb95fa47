// ==========================================
// 销售 CRM 线索导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 缺省: 键不存在或值非法时回退到默认值（非法值记录警告）
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// 预览行数默认值
pub const DEFAULT_PREVIEW_ROW_LIMIT: usize = 10;

fn config_error(key: &str, err: impl std::fmt::Display) -> ImportError {
    ImportError::Config {
        key: key.to_string(),
        message: err.to_string(),
    }
}

/// 解析布尔配置（true/false, 1/0, yes/no, on/off，大小写不敏感）
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| config_error("db_path", e))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let guard = conn.lock().map_err(|e| config_error("connection", e))?;
            configure_sqlite_connection(&guard).map_err(|e| config_error("connection", e))?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| config_error(key, e))?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| config_error(key, e))
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self.conn.lock().map_err(|e| config_error(key, e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )
        .map_err(|e| config_error(key, e))?;

        Ok(())
    }

    /// 获取 global 配置快照（JSON 格式，按键排序）
    pub fn get_config_snapshot(&self) -> ImportResult<String> {
        let conn = self.conn.lock().map_err(|e| config_error("snapshot", e))?;

        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")
            .map_err(|e| config_error("snapshot", e))?;

        let config_map = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .and_then(|rows| rows.collect::<Result<BTreeMap<_, _>, _>>())
            .map_err(|e| config_error("snapshot", e))?;

        serde_json::to_string(&json!(config_map)).map_err(|e| config_error("snapshot", e))
    }

    /// 读取布尔配置，缺失或非法时返回默认值
    fn get_bool_or_default(&self, key: &str, default: bool) -> ImportResult<bool> {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        Ok(parse_bool(&raw).unwrap_or_else(|| {
            warn!(config_key = key, value = %raw, default, "配置值非法，使用默认值");
            default
        }))
    }
}

// ==========================================
// ImportConfigReader 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_preview_row_limit(&self) -> ImportResult<usize> {
        let Some(raw) = self.get_global_config_value(config_keys::PREVIEW_ROW_LIMIT)? else {
            return Ok(DEFAULT_PREVIEW_ROW_LIMIT);
        };

        match raw.trim().parse::<usize>() {
            Ok(limit) if limit > 0 => Ok(limit),
            _ => {
                warn!(
                    config_key = config_keys::PREVIEW_ROW_LIMIT,
                    value = %raw,
                    "预览行数配置非法，使用默认值"
                );
                Ok(DEFAULT_PREVIEW_ROW_LIMIT)
            }
        }
    }

    async fn get_require_email(&self) -> ImportResult<bool> {
        self.get_bool_or_default(config_keys::REQUIRE_EMAIL, false)
    }

    async fn get_enum_fallback(&self) -> ImportResult<bool> {
        self.get_bool_or_default(config_keys::ENUM_FALLBACK, false)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 预览
    pub const PREVIEW_ROW_LIMIT: &str = "import.preview_row_limit";

    // 行校验策略
    pub const REQUIRE_EMAIL: &str = "import.require_email";
    pub const ENUM_FALLBACK: &str = "import.enum_fallback";

    /// 全部已知键（CLI 写入时校验）
    pub const ALL: &[&str] = &[PREVIEW_ROW_LIMIT, REQUIRE_EMAIL, ENUM_FALLBACK];
}
