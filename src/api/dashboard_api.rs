// ==========================================
// 高校课表管理系统 - 驾驶舱 API
// ==========================================
// 职责: 管理首页的聚合查询与操作日志查询 (只读)
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::ActionLog;
use crate::domain::snapshot::DependencySnapshot;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::department_repo::DepartmentRepository;
use crate::repository::dependency_repo::{DashboardOverview, DependencyRepository};
use crate::repository::resource_repo::ResourceRepository;

// ==========================================
// DepartmentStatistics - 单院系统计
// ==========================================
#[derive(Debug, Clone, serde::Serialize)]
pub struct DepartmentStatistics {
    pub department_id: String,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub snapshot: DependencySnapshot,  // 依赖快照 (在册用户/课程/教室/课表)
    pub assigned_classrooms: i64,      // 有效教室分配数
    pub assigned_faculty: i64,         // 有效教师分配数
    pub budget_allocation: Option<f64>,
}

// ==========================================
// DashboardApi - 驾驶舱 API
// ==========================================
pub struct DashboardApi {
    department_repo: Arc<DepartmentRepository>,
    dependency_repo: Arc<DependencyRepository>,
    resource_repo: Arc<ResourceRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl DashboardApi {
    pub fn new(
        department_repo: Arc<DepartmentRepository>,
        dependency_repo: Arc<DependencyRepository>,
        resource_repo: Arc<ResourceRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            department_repo,
            dependency_repo,
            resource_repo,
            action_log_repo,
        }
    }

    /// 管理首页总览
    pub fn overview(&self) -> ApiResult<DashboardOverview> {
        Ok(self.dependency_repo.overview()?)
    }

    /// 单院系统计（依赖快照 + 有效资源分配计数）
    pub fn department_statistics(&self, department_id: &str) -> ApiResult<DepartmentStatistics> {
        let department = self
            .department_repo
            .find_by_id(department_id)?
            .ok_or_else(|| ApiError::not_found("院系", department_id))?;

        let snapshot = self.dependency_repo.snapshot(department_id)?;
        let (assigned_classrooms, assigned_faculty) =
            self.resource_repo.count_active_by_type(department_id)?;

        Ok(DepartmentStatistics {
            department_id: department.department_id,
            code: department.code,
            name: department.name,
            is_active: department.is_active,
            snapshot,
            assigned_classrooms,
            assigned_faculty,
            budget_allocation: department.budget_allocation,
        })
    }

    /// 最近操作日志
    pub fn recent_actions(&self, limit: usize) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.list_recent(limit)?)
    }

    /// 某院系的操作历史
    pub fn department_actions(&self, department_id: &str) -> ApiResult<Vec<ActionLog>> {
        Ok(self
            .action_log_repo
            .list_by_target("department", department_id)?)
    }
}
