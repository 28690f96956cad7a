// ==========================================
// 高校课表管理系统 - 依赖聚合仓储
// ==========================================
// 职责: 院系依赖快照与驾驶舱聚合查询 (只读)
// 说明: 快照门控破坏性操作, 每次调用即时聚合, 不做缓存
// ==========================================

use crate::domain::snapshot::DependencySnapshot;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// DashboardOverview - 驾驶舱总览
// ==========================================
#[derive(Debug, Clone, serde::Serialize)]
pub struct DashboardOverview {
    pub total_departments: i64,      // 院系总数
    pub active_departments: i64,     // 启用院系数
    pub inactive_departments: i64,   // 停用院系数
    pub unassigned_users: i64,       // 未归属任何院系的在册用户数
    pub unassigned_subjects: i64,    // 未归属课程数
    pub unassigned_classrooms: i64,  // 未归属教室数
    pub total_budget_allocation: f64, // 启用院系预算合计
}

// ==========================================
// DependencyRepository - 依赖聚合仓储
// ==========================================
pub struct DependencyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DependencyRepository {
    /// 从共享连接创建仓储（只读, 不建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 计算某院系的依赖快照
    ///
    /// 课表计数口径: 经本系课程关联 ∪ 经本系教室关联 (DISTINCT 并集)
    /// —— 仅与教室关联的课表同样会因删除而失去挂靠, 故一并计入
    pub fn snapshot(&self, department_id: &str) -> RepositoryResult<DependencySnapshot> {
        let conn = self.get_conn()?;
        let snapshot = conn.query_row(
            r#"
            SELECT
              (SELECT COUNT(*) FROM users u
                 WHERE u.department_id = ?1 AND u.is_active = 1),
              (SELECT COUNT(*) FROM subjects s
                 WHERE s.department_id = ?1 AND s.is_active = 1),
              (SELECT COUNT(*) FROM classrooms c
                 WHERE c.department_id = ?1 AND c.is_active = 1),
              (SELECT COUNT(DISTINCT t.timetable_id) FROM timetables t
                 LEFT JOIN subjects s ON s.subject_id = t.subject_id
                 LEFT JOIN classrooms c ON c.classroom_id = t.classroom_id
                 WHERE t.is_active = 1
                   AND (s.department_id = ?1 OR c.department_id = ?1))
            "#,
            params![department_id],
            |row| {
                Ok(DependencySnapshot {
                    active_users: row.get(0)?,
                    active_subjects: row.get(1)?,
                    active_classrooms: row.get(2)?,
                    active_timetables: row.get(3)?,
                })
            },
        )?;
        Ok(snapshot)
    }

    /// 驾驶舱总览聚合
    pub fn overview(&self) -> RepositoryResult<DashboardOverview> {
        let conn = self.get_conn()?;
        let overview = conn.query_row(
            r#"
            SELECT
              (SELECT COUNT(*) FROM departments),
              (SELECT COUNT(*) FROM departments WHERE is_active = 1),
              (SELECT COUNT(*) FROM users
                 WHERE department_id IS NULL AND is_active = 1),
              (SELECT COUNT(*) FROM subjects
                 WHERE department_id IS NULL AND is_active = 1),
              (SELECT COUNT(*) FROM classrooms
                 WHERE department_id IS NULL AND is_active = 1),
              (SELECT COALESCE(SUM(budget_allocation), 0.0) FROM departments
                 WHERE is_active = 1)
            "#,
            [],
            |row| {
                let total: i64 = row.get(0)?;
                let active: i64 = row.get(1)?;
                Ok(DashboardOverview {
                    total_departments: total,
                    active_departments: active,
                    inactive_departments: total - active,
                    unassigned_users: row.get(2)?,
                    unassigned_subjects: row.get(3)?,
                    unassigned_classrooms: row.get(4)?,
                    total_budget_allocation: row.get(5)?,
                })
            },
        )?;
        Ok(overview)
    }
}
