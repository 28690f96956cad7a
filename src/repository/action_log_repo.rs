// ==========================================
// 高校课表管理系统 - 操作日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑, 只做数据映射
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 从共享连接创建仓储并确保表结构存在
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS action_log (
              action_id TEXT PRIMARY KEY,
              action_type TEXT NOT NULL,
              actor TEXT NOT NULL,
              target_type TEXT NOT NULL,
              target_id TEXT,
              payload_json TEXT,
              detail TEXT,
              action_ts TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_action_log_target
              ON action_log(target_type, target_id);
            CREATE INDEX IF NOT EXISTS idx_action_log_ts
              ON action_log(action_ts DESC);
            "#,
        )?;
        Ok(())
    }

    /// 插入操作日志
    ///
    /// # 返回
    /// - `Ok(action_id)`: 成功插入, 返回 action_id
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO action_log (
                action_id, action_type, actor, target_type, target_id,
                payload_json, detail, action_ts
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                log.action_id,
                log.action_type,
                log.actor,
                log.target_type,
                log.target_id,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.detail,
                log.action_ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;
        Ok(log.action_id.clone())
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<ActionLog> {
        let payload_raw: Option<String> = row.get(5)?;
        let payload_json = payload_raw
            .map(|s| {
                serde_json::from_str(&s).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
            })
            .transpose()?;
        let ts_raw: String = row.get(7)?;
        let action_ts = NaiveDateTime::parse_from_str(&ts_raw, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    7,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
        Ok(ActionLog {
            action_id: row.get(0)?,
            action_type: row.get(1)?,
            actor: row.get(2)?,
            target_type: row.get(3)?,
            target_id: row.get(4)?,
            payload_json,
            detail: row.get(6)?,
            action_ts,
        })
    }

    /// 最近的操作日志（按时间倒序）
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT action_id, action_type, actor, target_type, target_id,
                    payload_json, detail, action_ts
             FROM action_log
             ORDER BY action_ts DESC, action_id ASC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 某目标的操作历史（按时间倒序）
    pub fn list_by_target(
        &self,
        target_type: &str,
        target_id: &str,
    ) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT action_id, action_type, actor, target_type, target_id,
                    payload_json, detail, action_ts
             FROM action_log
             WHERE target_type = ?1 AND target_id = ?2
             ORDER BY action_ts DESC, action_id ASC",
        )?;
        let rows = stmt
            .query_map(params![target_type, target_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}
