// ==========================================
// 高校课表管理系统 - 资源分配 API
// ==========================================
// 职责: 教室/教师与院系的分配、共享关系维护、软移除
// 契约: 空/畸形ID列表在事务开启前快速失败;
//       批量分配整体成功或整体回滚; 重复提交幂等跳过
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::context::RequestContext;
use crate::domain::resource::DepartmentResource;
use crate::domain::snapshot::AssignmentOutcome;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::department_repo::DepartmentRepository;
use crate::repository::resource_repo::ResourceRepository;

// ==========================================
// ResourceApi - 资源分配 API
// ==========================================
pub struct ResourceApi {
    resource_repo: Arc<ResourceRepository>,
    department_repo: Arc<DepartmentRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl ResourceApi {
    pub fn new(
        resource_repo: Arc<ResourceRepository>,
        department_repo: Arc<DepartmentRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            resource_repo,
            department_repo,
            action_log_repo,
        }
    }

    /// 去除空白项并去重 (保持原顺序); 清洗后为空即校验失败
    fn clean_id_list(field: &str, ids: &[String]) -> ApiResult<Vec<String>> {
        let mut cleaned: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.trim();
            if id.is_empty() {
                continue;
            }
            if !cleaned.iter().any(|c| c == id) {
                cleaned.push(id.to_string());
            }
        }
        if cleaned.is_empty() {
            return Err(ApiError::invalid_field(field, "ID列表不能为空"));
        }
        Ok(cleaned)
    }

    /// 校验可选有效期窗口 (仅教室分配): 均为 YYYY-MM-DD, 且开始不晚于结束
    fn validate_window(
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> ApiResult<(Option<String>, Option<String>)> {
        let parse = |field: &str, raw: Option<&str>| -> ApiResult<Option<NaiveDate>> {
            match raw.map(str::trim).filter(|v| !v.is_empty()) {
                None => Ok(None),
                Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
                    .map(Some)
                    .map_err(|_| {
                        ApiError::invalid_field(field, "日期必须为 YYYY-MM-DD 格式")
                    }),
            }
        };

        let start = parse("start_date", start_date)?;
        let end = parse("end_date", end_date)?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ApiError::invalid_field(
                    "end_date",
                    "有效期结束日期不能早于开始日期",
                ));
            }
        }
        Ok((start.map(|d| d.to_string()), end.map(|d| d.to_string())))
    }

    /// 分配目标院系必须存在且处于启用状态
    fn require_active_department(&self, department_id: &str) -> ApiResult<()> {
        let department = self
            .department_repo
            .find_by_id(department_id)?
            .ok_or_else(|| ApiError::not_found("院系", department_id))?;
        if !department.is_active {
            return Err(ApiError::Precondition {
                message: format!("院系「{}」已停用, 不能分配资源", department.name),
                blocking: Vec::new(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 批量分配
    // ==========================================

    /// 批量分配教室
    ///
    /// 幂等: 已有有效分配的教室跳过, 不计入 assigned。
    /// 原子: 任一教室失败则整批回滚, 零教室被分配。
    pub fn assign_classrooms(
        &self,
        department_id: &str,
        classroom_ids: &[String],
        sharing_conditions: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        ctx: &RequestContext,
    ) -> ApiResult<AssignmentOutcome> {
        // 写入开始前的快速失败校验
        let cleaned = Self::clean_id_list("classroom_ids", classroom_ids)?;
        let (start, end) = Self::validate_window(start_date, end_date)?;
        self.require_active_department(department_id)?;

        let outcome = self.resource_repo.assign_classrooms(
            department_id,
            &cleaned,
            sharing_conditions,
            start.as_deref(),
            end.as_deref(),
            &ctx.actor_id,
        )?;

        tracing::info!(
            department_id = %department_id,
            requested = outcome.requested,
            assigned = outcome.assigned,
            skipped = outcome.skipped,
            actor = %ctx.actor_id,
            "教室批量分配完成"
        );
        self.action_log_repo.insert(&ActionLog::new(
            ActionType::AssignClassrooms,
            ctx.actor_id.clone(),
            "department",
            Some(department_id.to_string()),
            Some(json!({
                "classroom_ids": cleaned,
                "assigned": outcome.assigned,
                "skipped": outcome.skipped,
            })),
            None,
        ))?;

        Ok(outcome)
    }

    /// 批量分配教师
    ///
    /// 与教室分配同一幂等/原子契约; 纯协作元数据,
    /// 不改动教师的归属院系, 无有效期窗口。
    pub fn assign_faculty(
        &self,
        department_id: &str,
        faculty_ids: &[String],
        sharing_conditions: Option<&str>,
        ctx: &RequestContext,
    ) -> ApiResult<AssignmentOutcome> {
        let cleaned = Self::clean_id_list("faculty_ids", faculty_ids)?;
        self.require_active_department(department_id)?;

        let outcome = self.resource_repo.assign_faculty(
            department_id,
            &cleaned,
            sharing_conditions,
            &ctx.actor_id,
        )?;

        tracing::info!(
            department_id = %department_id,
            requested = outcome.requested,
            assigned = outcome.assigned,
            skipped = outcome.skipped,
            actor = %ctx.actor_id,
            "教师批量分配完成"
        );
        self.action_log_repo.insert(&ActionLog::new(
            ActionType::AssignFaculty,
            ctx.actor_id.clone(),
            "department",
            Some(department_id.to_string()),
            Some(json!({
                "faculty_ids": cleaned,
                "assigned": outcome.assigned,
                "skipped": outcome.skipped,
            })),
            None,
        ))?;

        Ok(outcome)
    }

    // ==========================================
    // 共享关系/软移除
    // ==========================================

    /// 更新一条分配记录的共享字段（只动共享字段, 其余不变）
    pub fn update_sharing(
        &self,
        resource_id: &str,
        shared_with_department_id: Option<&str>,
        sharing_conditions: Option<&str>,
        ctx: &RequestContext,
    ) -> ApiResult<()> {
        let resource = self
            .resource_repo
            .find_by_id(resource_id)?
            .ok_or_else(|| ApiError::not_found("资源分配", resource_id))?;

        let shared_with = shared_with_department_id
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let sharing_conditions = sharing_conditions
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(target) = shared_with {
            if target == resource.owner_department_id {
                return Err(ApiError::invalid_field(
                    "shared_with_department_id",
                    "不能与资源归属院系自身共享",
                ));
            }
            if self.department_repo.find_by_id(target)?.is_none() {
                return Err(ApiError::not_found("院系", target));
            }
        }

        self.resource_repo
            .update_sharing(resource_id, shared_with, sharing_conditions)?;

        tracing::info!(
            resource_id = %resource_id,
            shared_with = ?shared_with,
            actor = %ctx.actor_id,
            "资源共享关系已更新"
        );
        self.action_log_repo.insert(&ActionLog::new(
            ActionType::UpdateSharing,
            ctx.actor_id.clone(),
            "resource",
            Some(resource_id.to_string()),
            Some(json!({ "shared_with_department_id": shared_with })),
            None,
        ))?;

        Ok(())
    }

    /// 软移除分配记录 (is_active=0)
    ///
    /// 底层教室/教师实体不受影响, 立即恢复可分配状态
    pub fn remove_resource(&self, resource_id: &str, ctx: &RequestContext) -> ApiResult<()> {
        if self.resource_repo.find_by_id(resource_id)?.is_none() {
            return Err(ApiError::not_found("资源分配", resource_id));
        }

        self.resource_repo.soft_remove(resource_id)?;

        tracing::info!(
            resource_id = %resource_id,
            actor = %ctx.actor_id,
            "资源分配已软移除"
        );
        self.action_log_repo.insert(&ActionLog::new(
            ActionType::RemoveResource,
            ctx.actor_id.clone(),
            "resource",
            Some(resource_id.to_string()),
            None,
            None,
        ))?;

        Ok(())
    }

    /// 列出某院系的有效分配记录
    pub fn list_department_resources(
        &self,
        department_id: &str,
    ) -> ApiResult<Vec<DepartmentResource>> {
        if self.department_repo.find_by_id(department_id)?.is_none() {
            return Err(ApiError::not_found("院系", department_id));
        }
        Ok(self.resource_repo.list_by_department(department_id)?)
    }
}
