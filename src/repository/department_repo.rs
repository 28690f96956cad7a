// ==========================================
// 高校课表管理系统 - 院系仓储
// ==========================================
// 职责: 管理 departments 表
// 红线: Repository 不做业务逻辑, 只做数据映射与事务编排
// 事务: 停用转移/硬删除为批量写入, 必须整体成功或整体回滚
// ==========================================

use crate::domain::department::Department;
use crate::domain::snapshot::ReassignmentOutcome;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// 查询辅助类型
// ==========================================

/// 院系列表过滤条件
#[derive(Debug, Clone, Default)]
pub struct DepartmentFilter {
    pub keyword: Option<String>,  // 匹配代码/名称 (LIKE)
    pub active_only: bool,        // 仅启用院系
}

/// 负责人候选（两级查找的查询结果）
#[derive(Debug, Clone, serde::Serialize)]
pub struct FacultyBrief {
    pub user_id: String,
    pub full_name: String,
    pub department_id: Option<String>,
}

// ==========================================
// DepartmentRepository - 院系仓储
// ==========================================
pub struct DepartmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DepartmentRepository {
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
    ///
    /// 注: code 在写入前已归一化为大写, 因此 UNIQUE 约束即可
    /// 保证大小写不敏感的唯一性
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS departments (
              department_id TEXT PRIMARY KEY,
              code TEXT NOT NULL UNIQUE,
              name TEXT NOT NULL,
              description TEXT,
              head_id TEXT,
              established_date TEXT,
              contact_email TEXT,
              contact_phone TEXT,
              building_location TEXT,
              budget_allocation REAL,
              is_active INTEGER NOT NULL DEFAULT 1,
              created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
              updated_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime'))
            );

            CREATE INDEX IF NOT EXISTS idx_departments_is_active
              ON departments(is_active);
            CREATE INDEX IF NOT EXISTS idx_departments_head
              ON departments(head_id);
            "#,
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<Department> {
        Ok(Department {
            department_id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            head_id: row.get(4)?,
            established_date: row.get(5)?,
            contact_email: row.get(6)?,
            contact_phone: row.get(7)?,
            building_location: row.get(8)?,
            budget_allocation: row.get(9)?,
            is_active: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    const SELECT_COLUMNS: &'static str = "department_id, code, name, description, head_id, \
         established_date, contact_email, contact_phone, building_location, \
         budget_allocation, is_active, created_at, updated_at";

    // ==========================================
    // 基础 CRUD
    // ==========================================

    /// 插入院系
    pub fn insert(&self, department: &Department) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO departments (
                department_id, code, name, description, head_id,
                established_date, contact_email, contact_phone,
                building_location, budget_allocation, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                department.department_id,
                department.code,
                department.name,
                department.description,
                department.head_id,
                department.established_date,
                department.contact_email,
                department.contact_phone,
                department.building_location,
                department.budget_allocation,
                department.is_active,
                department.created_at,
                department.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 按ID查找院系
    pub fn find_by_id(&self, department_id: &str) -> RepositoryResult<Option<Department>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM departments WHERE department_id = ?1",
            Self::SELECT_COLUMNS
        );
        let result = conn
            .query_row(&sql, params![department_id], Self::map_row)
            .optional()?;
        Ok(result)
    }

    /// 按过滤条件列出院系（按代码排序）
    pub fn list(&self, filter: &DepartmentFilter) -> RepositoryResult<Vec<Department>> {
        let conn = self.get_conn()?;
        let keyword = filter
            .keyword
            .as_deref()
            .map(|k| format!("%{}%", k.trim()));
        let sql = format!(
            r#"
            SELECT {}
            FROM departments
            WHERE (?1 IS NULL OR code LIKE ?1 OR name LIKE ?1)
              AND (?2 = 0 OR is_active = 1)
            ORDER BY code ASC
            "#,
            Self::SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![keyword, filter.active_only], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 覆写院系行（update_department 已在上层合并变更字段）
    pub fn update(&self, department: &Department) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE departments SET
                code = ?2, name = ?3, description = ?4, head_id = ?5,
                established_date = ?6, contact_email = ?7, contact_phone = ?8,
                building_location = ?9, budget_allocation = ?10, updated_at = ?11
            WHERE department_id = ?1
            "#,
            params![
                department.department_id,
                department.code,
                department.name,
                department.description,
                department.head_id,
                department.established_date,
                department.contact_email,
                department.contact_phone,
                department.building_location,
                department.budget_allocation,
                department.updated_at,
            ],
        )?;
        Ok(rows)
    }

    /// 切换启用状态（无级联的启用/停用路径）
    pub fn set_active(&self, department_id: &str, active: bool) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let rows = conn.execute(
            "UPDATE departments SET is_active = ?2, updated_at = ?3 WHERE department_id = ?1",
            params![department_id, active, now],
        )?;
        Ok(rows)
    }

    // ==========================================
    // 唯一性/负责人查询
    // ==========================================

    /// 院系代码是否已被占用（大小写不敏感, code 入参已归一化为大写;
    /// 更新时通过 exclude_id 排除自身）
    pub fn code_exists(&self, code: &str, exclude_id: Option<&str>) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM departments
                 WHERE code = ?1 AND (?2 IS NULL OR department_id <> ?2)
                 LIMIT 1",
                params![code, exclude_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 该教师是否已担任其他启用院系的负责人, 返回冲突院系名称
    pub fn head_conflict(
        &self,
        head_id: &str,
        exclude_id: Option<&str>,
    ) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let name: Option<String> = conn
            .query_row(
                "SELECT name FROM departments
                 WHERE head_id = ?1 AND is_active = 1
                   AND (?2 IS NULL OR department_id <> ?2)
                 LIMIT 1",
                params![head_id, exclude_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    /// 负责人候选 - 第一级: 本院系在职教师, 且未担任其他启用院系负责人
    pub fn eligible_heads_in_department(
        &self,
        department_id: &str,
    ) -> RepositoryResult<Vec<FacultyBrief>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT u.user_id, u.full_name, u.department_id
            FROM users u
            WHERE u.is_active = 1 AND u.role = 'faculty'
              AND u.department_id = ?1
              AND NOT EXISTS (
                SELECT 1 FROM departments d
                WHERE d.head_id = u.user_id AND d.is_active = 1
                  AND d.department_id <> ?1
              )
            ORDER BY u.full_name ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![department_id], |row| {
                Ok(FacultyBrief {
                    user_id: row.get(0)?,
                    full_name: row.get(1)?,
                    department_id: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 负责人候选 - 第二级(回退): 全校在职教师, 且未担任启用院系负责人
    /// (exclude_department 允许当前院系的在任负责人出现在候选中)
    pub fn eligible_heads_all(
        &self,
        exclude_department: Option<&str>,
    ) -> RepositoryResult<Vec<FacultyBrief>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT u.user_id, u.full_name, u.department_id
            FROM users u
            WHERE u.is_active = 1 AND u.role = 'faculty'
              AND NOT EXISTS (
                SELECT 1 FROM departments d
                WHERE d.head_id = u.user_id AND d.is_active = 1
                  AND (?1 IS NULL OR d.department_id <> ?1)
              )
            ORDER BY u.full_name ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![exclude_department], |row| {
                Ok(FacultyBrief {
                    user_id: row.get(0)?,
                    full_name: row.get(1)?,
                    department_id: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    // ==========================================
    // 事务操作
    // ==========================================

    /// 停用院系并转移/解绑其依赖（单一事务）
    ///
    /// 执行顺序:
    /// 1. 校验院系仍存在且处于启用状态
    /// 2. 标记院系停用
    /// 3. 解析转移目标（配置的默认院系, 必须存在/启用/非自身, 否则整体回滚）
    /// 4. 用户转移到目标院系或清空引用; 课程/教室解绑; 资源分配软释放
    /// 5. 课表保持原样（与院系视角脱钩）
    pub fn deactivate_with_reassignment(
        &self,
        department_id: &str,
        reassign_target: Option<&str>,
    ) -> RepositoryResult<ReassignmentOutcome> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let is_active: Option<bool> = tx
            .query_row(
                "SELECT is_active FROM departments WHERE department_id = ?1",
                params![department_id],
                |row| row.get(0),
            )
            .optional()?;
        match is_active {
            None => {
                return Err(RepositoryError::NotFound {
                    entity: "Department".to_string(),
                    id: department_id.to_string(),
                })
            }
            Some(false) => {
                return Err(RepositoryError::BusinessRuleViolation(
                    "院系已处于停用状态".to_string(),
                ))
            }
            Some(true) => {}
        }

        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        tx.execute(
            "UPDATE departments SET is_active = 0, updated_at = ?2 WHERE department_id = ?1",
            params![department_id, now],
        )?;

        // 解析转移目标; 失败时提前返回, 事务随 drop 回滚
        let target: Option<String> = match reassign_target {
            Some(t) if t == department_id => {
                return Err(RepositoryError::BusinessRuleViolation(
                    "默认转移院系不能是被停用的院系自身".to_string(),
                ))
            }
            Some(t) => {
                let target_active: Option<bool> = tx
                    .query_row(
                        "SELECT is_active FROM departments WHERE department_id = ?1",
                        params![t],
                        |row| row.get(0),
                    )
                    .optional()?;
                match target_active {
                    Some(true) => Some(t.to_string()),
                    Some(false) => {
                        return Err(RepositoryError::BusinessRuleViolation(format!(
                            "默认转移院系已停用: {}",
                            t
                        )))
                    }
                    None => {
                        return Err(RepositoryError::BusinessRuleViolation(format!(
                            "默认转移院系不存在: {}",
                            t
                        )))
                    }
                }
            }
            None => None,
        };

        let users_reassigned = tx.execute(
            "UPDATE users SET department_id = ?2 WHERE department_id = ?1",
            params![department_id, target],
        )?;
        let subjects_detached = tx.execute(
            "UPDATE subjects SET department_id = NULL WHERE department_id = ?1",
            params![department_id],
        )?;
        let classrooms_detached = tx.execute(
            "UPDATE classrooms SET department_id = NULL WHERE department_id = ?1",
            params![department_id],
        )?;
        let resources_released = tx.execute(
            "UPDATE department_resources SET is_active = 0
             WHERE owner_department_id = ?1 AND is_active = 1",
            params![department_id],
        )?;

        tx.commit()?;

        Ok(ReassignmentOutcome {
            users_reassigned,
            subjects_detached,
            classrooms_detached,
            resources_released,
            reassign_target: target,
        })
    }

    /// 硬删除院系（单一事务）
    ///
    /// 前置条件（停用状态 + 依赖清零）由 API 层校验;
    /// 此处仍以 affected rows 守卫并发下的重复删除
    pub fn delete(&self, department_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        // 分配记录随院系一并移除, 其他院系指向本系的共享引用置空
        tx.execute(
            "DELETE FROM department_resources WHERE owner_department_id = ?1",
            params![department_id],
        )?;
        tx.execute(
            "UPDATE department_resources SET shared_with_department_id = NULL
             WHERE shared_with_department_id = ?1",
            params![department_id],
        )?;

        // 依赖快照只统计在册/启用实体, 停用实体可能仍残留引用, 此处一并清理
        tx.execute(
            "UPDATE users SET department_id = NULL WHERE department_id = ?1",
            params![department_id],
        )?;
        tx.execute(
            "UPDATE subjects SET department_id = NULL WHERE department_id = ?1",
            params![department_id],
        )?;
        tx.execute(
            "UPDATE classrooms SET department_id = NULL WHERE department_id = ?1",
            params![department_id],
        )?;

        let rows = tx.execute(
            "DELETE FROM departments WHERE department_id = ?1",
            params![department_id],
        )?;
        if rows == 0 {
            // 并发下第二次删除: 行已不存在, 事务随 drop 回滚
            return Err(RepositoryError::NotFound {
                entity: "Department".to_string(),
                id: department_id.to_string(),
            });
        }

        tx.commit()?;
        Ok(())
    }
}
