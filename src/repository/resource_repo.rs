// ==========================================
// 高校课表管理系统 - 资源分配仓储
// ==========================================
// 职责: 管理 department_resources 表
// 不变量: 同一 (归属院系, 资源类型, 资源引用) 至多一条有效记录
//         —— 由部分唯一索引与分配时的幂等跳过共同保证
// 事务: 批量分配整体成功或整体回滚, 不允许出现部分分配
// ==========================================

use crate::domain::resource::{DepartmentResource, ResourceType};
use crate::domain::snapshot::AssignmentOutcome;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// ResourceRepository - 资源分配仓储
// ==========================================
pub struct ResourceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ResourceRepository {
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

    /// 确保表存在（如果不存在则创建）
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS department_resources (
              resource_id TEXT PRIMARY KEY,
              owner_department_id TEXT NOT NULL,
              resource_type TEXT NOT NULL CHECK (resource_type IN ('classroom', 'faculty')),
              resource_ref_id TEXT NOT NULL,
              sharing_conditions TEXT,
              shared_with_department_id TEXT,
              start_date TEXT,
              end_date TEXT,
              is_active INTEGER NOT NULL DEFAULT 1,
              created_by TEXT NOT NULL,
              created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
              FOREIGN KEY (owner_department_id) REFERENCES departments(department_id)
            );

            CREATE UNIQUE INDEX IF NOT EXISTS uq_department_resources_active
              ON department_resources(owner_department_id, resource_type, resource_ref_id)
              WHERE is_active = 1;
            CREATE INDEX IF NOT EXISTS idx_department_resources_owner
              ON department_resources(owner_department_id);
            CREATE INDEX IF NOT EXISTS idx_department_resources_shared
              ON department_resources(shared_with_department_id);
            "#,
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<DepartmentResource> {
        let type_raw: String = row.get(2)?;
        let resource_type = ResourceType::parse(&type_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("未知资源类型: {}", type_raw).into(),
            )
        })?;
        Ok(DepartmentResource {
            resource_id: row.get(0)?,
            owner_department_id: row.get(1)?,
            resource_type,
            resource_ref_id: row.get(3)?,
            sharing_conditions: row.get(4)?,
            shared_with_department_id: row.get(5)?,
            start_date: row.get(6)?,
            end_date: row.get(7)?,
            is_active: row.get(8)?,
            created_by: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    const SELECT_COLUMNS: &'static str = "resource_id, owner_department_id, resource_type, \
         resource_ref_id, sharing_conditions, shared_with_department_id, \
         start_date, end_date, is_active, created_by, created_at";

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查找分配记录
    pub fn find_by_id(&self, resource_id: &str) -> RepositoryResult<Option<DepartmentResource>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM department_resources WHERE resource_id = ?1",
            Self::SELECT_COLUMNS
        );
        let result = conn
            .query_row(&sql, params![resource_id], Self::map_row)
            .optional()?;
        Ok(result)
    }

    /// 列出某院系的有效分配记录（按创建时间倒序）
    pub fn list_by_department(
        &self,
        owner_department_id: &str,
    ) -> RepositoryResult<Vec<DepartmentResource>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM department_resources
             WHERE owner_department_id = ?1 AND is_active = 1
             ORDER BY created_at DESC, resource_id ASC",
            Self::SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![owner_department_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 统计某院系有效分配数 (教室, 教师)
    pub fn count_active_by_type(
        &self,
        owner_department_id: &str,
    ) -> RepositoryResult<(i64, i64)> {
        let conn = self.get_conn()?;
        let counts = conn.query_row(
            r#"
            SELECT
              COALESCE(SUM(CASE WHEN resource_type = 'classroom' THEN 1 ELSE 0 END), 0),
              COALESCE(SUM(CASE WHEN resource_type = 'faculty' THEN 1 ELSE 0 END), 0)
            FROM department_resources
            WHERE owner_department_id = ?1 AND is_active = 1
            "#,
            params![owner_department_id],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;
        Ok(counts)
    }

    // ==========================================
    // 批量分配（单一事务）
    // ==========================================

    /// 批量分配教室（幂等 + 原子）
    ///
    /// 逐教室处理: 已存在有效分配则跳过; 否则新建分配记录并把教室的
    /// 归属院系指向本系。任一教室不存在即整体回滚, 零教室被分配。
    pub fn assign_classrooms(
        &self,
        department_id: &str,
        classroom_ids: &[String],
        sharing_conditions: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        created_by: &str,
    ) -> RepositoryResult<AssignmentOutcome> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut assigned = 0usize;
        let mut skipped = 0usize;

        for classroom_id in classroom_ids {
            let exists: Option<i64> = tx
                .query_row(
                    "SELECT 1 FROM classrooms WHERE classroom_id = ?1 AND is_active = 1",
                    params![classroom_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Err(RepositoryError::NotFound {
                    entity: "Classroom".to_string(),
                    id: classroom_id.clone(),
                });
            }

            if self.active_assignment_exists(
                &tx,
                department_id,
                ResourceType::Classroom,
                classroom_id,
            )? {
                skipped += 1;
                continue;
            }

            let entity = DepartmentResource::new(
                department_id.to_string(),
                ResourceType::Classroom,
                classroom_id.clone(),
                sharing_conditions.map(|s| s.to_string()),
                None,
                start_date.map(|s| s.to_string()),
                end_date.map(|s| s.to_string()),
                created_by.to_string(),
            );
            self.insert_in_tx(&tx, &entity)?;
            tx.execute(
                "UPDATE classrooms SET department_id = ?1 WHERE classroom_id = ?2",
                params![department_id, classroom_id],
            )?;
            assigned += 1;
        }

        tx.commit()?;

        Ok(AssignmentOutcome {
            requested: classroom_ids.len(),
            assigned,
            skipped,
        })
    }

    /// 批量分配教师（幂等 + 原子）
    ///
    /// 与教室批量分配同一契约, 但教师分配是纯协作元数据:
    /// 不改动教师的归属院系, 也没有有效期窗口。
    pub fn assign_faculty(
        &self,
        department_id: &str,
        faculty_ids: &[String],
        sharing_conditions: Option<&str>,
        created_by: &str,
    ) -> RepositoryResult<AssignmentOutcome> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut assigned = 0usize;
        let mut skipped = 0usize;

        for faculty_id in faculty_ids {
            let user: Option<(String, bool)> = tx
                .query_row(
                    "SELECT role, is_active FROM users WHERE user_id = ?1",
                    params![faculty_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            match user {
                None => {
                    return Err(RepositoryError::NotFound {
                        entity: "User".to_string(),
                        id: faculty_id.clone(),
                    })
                }
                Some((role, _)) if role != "faculty" => {
                    return Err(RepositoryError::FieldValueError {
                        field: "faculty_ids".to_string(),
                        message: format!("用户不是教师, 不能作为教师资源分配: {}", faculty_id),
                    })
                }
                Some((_, false)) => {
                    return Err(RepositoryError::FieldValueError {
                        field: "faculty_ids".to_string(),
                        message: format!("教师已停用: {}", faculty_id),
                    })
                }
                Some(_) => {}
            }

            if self.active_assignment_exists(
                &tx,
                department_id,
                ResourceType::Faculty,
                faculty_id,
            )? {
                skipped += 1;
                continue;
            }

            let entity = DepartmentResource::new(
                department_id.to_string(),
                ResourceType::Faculty,
                faculty_id.clone(),
                sharing_conditions.map(|s| s.to_string()),
                None,
                None,
                None,
                created_by.to_string(),
            );
            self.insert_in_tx(&tx, &entity)?;
            assigned += 1;
        }

        tx.commit()?;

        Ok(AssignmentOutcome {
            requested: faculty_ids.len(),
            assigned,
            skipped,
        })
    }

    fn active_assignment_exists(
        &self,
        tx: &Transaction<'_>,
        department_id: &str,
        resource_type: ResourceType,
        resource_ref_id: &str,
    ) -> RepositoryResult<bool> {
        let found: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM department_resources
                 WHERE owner_department_id = ?1 AND resource_type = ?2
                   AND resource_ref_id = ?3 AND is_active = 1",
                params![department_id, resource_type.as_str(), resource_ref_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_in_tx(
        &self,
        tx: &Transaction<'_>,
        entity: &DepartmentResource,
    ) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO department_resources (
                resource_id, owner_department_id, resource_type, resource_ref_id,
                sharing_conditions, shared_with_department_id,
                start_date, end_date, is_active, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                entity.resource_id,
                entity.owner_department_id,
                entity.resource_type.as_str(),
                entity.resource_ref_id,
                entity.sharing_conditions,
                entity.shared_with_department_id,
                entity.start_date,
                entity.end_date,
                entity.is_active,
                entity.created_by,
                entity.created_at,
            ],
        )?;
        Ok(())
    }

    // ==========================================
    // 共享关系/软移除
    // ==========================================

    /// 仅更新一条分配记录的共享字段
    pub fn update_sharing(
        &self,
        resource_id: &str,
        shared_with_department_id: Option<&str>,
        sharing_conditions: Option<&str>,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE department_resources
             SET shared_with_department_id = ?2, sharing_conditions = ?3
             WHERE resource_id = ?1",
            params![resource_id, shared_with_department_id, sharing_conditions],
        )?;
        Ok(rows)
    }

    /// 软移除分配记录 (is_active=0); 底层教室/教师实体不受影响
    pub fn soft_remove(&self, resource_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE department_resources SET is_active = 0
             WHERE resource_id = ?1 AND is_active = 1",
            params![resource_id],
        )?;
        Ok(rows)
    }
}
