// ==========================================
// 高校课表管理系统 - 基础名录仓储
// ==========================================
// 职责: 管理 users / subjects / classrooms / timetables 表
// 说明: 这四张表由各自的管理模块负责增删, 院系核心只做
// 存在性/角色查询, 并在停用转移与硬删除时改写其 department_id
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// 名录实体
// ==========================================

/// 用户记录（教师/学生/管理员）
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: String,
    pub full_name: String,
    pub role: String, // faculty / student / admin
    pub department_id: Option<String>,
    pub is_active: bool,
}

/// 教室记录
#[derive(Debug, Clone)]
pub struct ClassroomRecord {
    pub classroom_id: String,
    pub room_no: String,
    pub building: String,
    pub capacity: i64,
    pub department_id: Option<String>,
    pub is_active: bool,
}

/// 课程记录
#[derive(Debug, Clone)]
pub struct SubjectRecord {
    pub subject_id: String,
    pub code: String,
    pub name: String,
    pub department_id: Option<String>,
    pub is_active: bool,
}

/// 课表记录（经课程和/或教室与院系间接关联）
#[derive(Debug, Clone)]
pub struct TimetableRecord {
    pub timetable_id: String,
    pub subject_id: Option<String>,
    pub classroom_id: Option<String>,
    pub day_of_week: i64, // 1-7
    pub period: i64,      // 节次
    pub is_active: bool,
}

// ==========================================
// RosterRepository - 基础名录仓储
// ==========================================
pub struct RosterRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RosterRepository {
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
    /// 注: department_id 列不加外键 —— 名录表归属兄弟模块,
    /// 院系硬删除时核心层负责清理残留引用
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
              user_id TEXT PRIMARY KEY,
              full_name TEXT NOT NULL,
              role TEXT NOT NULL,
              department_id TEXT,
              is_active INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_users_department
              ON users(department_id);
            CREATE INDEX IF NOT EXISTS idx_users_role
              ON users(role);

            CREATE TABLE IF NOT EXISTS subjects (
              subject_id TEXT PRIMARY KEY,
              code TEXT NOT NULL,
              name TEXT NOT NULL,
              department_id TEXT,
              is_active INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_subjects_department
              ON subjects(department_id);

            CREATE TABLE IF NOT EXISTS classrooms (
              classroom_id TEXT PRIMARY KEY,
              room_no TEXT NOT NULL,
              building TEXT NOT NULL,
              capacity INTEGER NOT NULL DEFAULT 0,
              department_id TEXT,
              is_active INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_classrooms_department
              ON classrooms(department_id);

            CREATE TABLE IF NOT EXISTS timetables (
              timetable_id TEXT PRIMARY KEY,
              subject_id TEXT,
              classroom_id TEXT,
              day_of_week INTEGER NOT NULL,
              period INTEGER NOT NULL,
              is_active INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_timetables_subject
              ON timetables(subject_id);
            CREATE INDEX IF NOT EXISTS idx_timetables_classroom
              ON timetables(classroom_id);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查找用户
    pub fn find_user(&self, user_id: &str) -> RepositoryResult<Option<UserRecord>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                "SELECT user_id, full_name, role, department_id, is_active
                 FROM users WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(UserRecord {
                        user_id: row.get(0)?,
                        full_name: row.get(1)?,
                        role: row.get(2)?,
                        department_id: row.get(3)?,
                        is_active: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    /// 按ID查找教室
    pub fn find_classroom(&self, classroom_id: &str) -> RepositoryResult<Option<ClassroomRecord>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                "SELECT classroom_id, room_no, building, capacity, department_id, is_active
                 FROM classrooms WHERE classroom_id = ?1",
                params![classroom_id],
                |row| {
                    Ok(ClassroomRecord {
                        classroom_id: row.get(0)?,
                        room_no: row.get(1)?,
                        building: row.get(2)?,
                        capacity: row.get(3)?,
                        department_id: row.get(4)?,
                        is_active: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    // ==========================================
    // 写入操作（供兄弟模块/测试数据准备使用）
    // ==========================================

    /// 插入用户, 返回 user_id
    pub fn insert_user(
        &self,
        full_name: &str,
        role: &str,
        department_id: Option<&str>,
    ) -> RepositoryResult<String> {
        let user_id = Uuid::new_v4().to_string();
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO users (user_id, full_name, role, department_id, is_active)
             VALUES (?1, ?2, ?3, ?4, 1)",
            params![user_id, full_name, role, department_id],
        )?;
        Ok(user_id)
    }

    /// 插入课程, 返回 subject_id
    pub fn insert_subject(
        &self,
        code: &str,
        name: &str,
        department_id: Option<&str>,
    ) -> RepositoryResult<String> {
        let subject_id = Uuid::new_v4().to_string();
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO subjects (subject_id, code, name, department_id, is_active)
             VALUES (?1, ?2, ?3, ?4, 1)",
            params![subject_id, code, name, department_id],
        )?;
        Ok(subject_id)
    }

    /// 插入教室, 返回 classroom_id
    pub fn insert_classroom(
        &self,
        room_no: &str,
        building: &str,
        capacity: i64,
        department_id: Option<&str>,
    ) -> RepositoryResult<String> {
        let classroom_id = Uuid::new_v4().to_string();
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO classrooms (classroom_id, room_no, building, capacity, department_id, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, 1)",
            params![classroom_id, room_no, building, capacity, department_id],
        )?;
        Ok(classroom_id)
    }

    /// 插入课表, 返回 timetable_id
    pub fn insert_timetable(
        &self,
        subject_id: Option<&str>,
        classroom_id: Option<&str>,
        day_of_week: i64,
        period: i64,
    ) -> RepositoryResult<String> {
        let timetable_id = Uuid::new_v4().to_string();
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO timetables (timetable_id, subject_id, classroom_id, day_of_week, period, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, 1)",
            params![timetable_id, subject_id, classroom_id, day_of_week, period],
        )?;
        Ok(timetable_id)
    }

    /// 将用户标记为停用（测试停用路径使用）
    pub fn deactivate_user(&self, user_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE users SET is_active = 0 WHERE user_id = ?1",
            params![user_id],
        )?;
        Ok(rows)
    }
}
