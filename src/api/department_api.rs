// ==========================================
// 高校课表管理系统 - 院系管理 API
// ==========================================
// 职责: 院系生命周期 (校验/创建/更新/启停/停用转移/硬删除)
// 与负责人候选查询, 供表现层调用
// 红线: 所有写入必须记录操作日志
// 架构: API 层 → Repository 层
// ==========================================

use std::sync::Arc;

use serde_json::json;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{DepartmentInput, DepartmentValidator};
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::context::RequestContext;
use crate::domain::department::Department;
use crate::domain::snapshot::{DependencySnapshot, ReassignmentOutcome};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::department_repo::{DepartmentFilter, DepartmentRepository, FacultyBrief};
use crate::repository::dependency_repo::DependencyRepository;

// ==========================================
// HeadLookupMode - 负责人候选查找层级
// ==========================================
// 说明: 原面板在首选查询为空时会静默放宽到全校教师;
// 此处把回退建模为显式的层级标志, 由返回值告知调用方
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum HeadLookupMode {
    /// 第一级: 本院系在职教师
    DepartmentFaculty,
    /// 第二级(回退): 全校在职教师
    AllFaculty,
}

// ==========================================
// DepartmentApi - 院系管理 API
// ==========================================
pub struct DepartmentApi {
    department_repo: Arc<DepartmentRepository>,
    dependency_repo: Arc<DependencyRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config: Arc<ConfigManager>,
    validator: DepartmentValidator,
}

impl DepartmentApi {
    pub fn new(
        department_repo: Arc<DepartmentRepository>,
        dependency_repo: Arc<DependencyRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config: Arc<ConfigManager>,
        validator: DepartmentValidator,
    ) -> Self {
        Self {
            department_repo,
            dependency_repo,
            action_log_repo,
            config,
            validator,
        }
    }

    // ==========================================
    // 创建/更新
    // ==========================================

    /// 创建院系
    ///
    /// # 返回
    /// - Ok(department_id): 新院系ID (默认启用)
    /// - Err(ApiError::Validation): 聚合的字段错误
    pub fn create_department(
        &self,
        input: &DepartmentInput,
        ctx: &RequestContext,
    ) -> ApiResult<String> {
        let payload = self.validator.validate(input, None)?;
        let department = Department::from_payload(payload);
        let department_id = department.department_id.clone();

        self.department_repo.insert(&department)?;

        tracing::info!(
            department_id = %department_id,
            code = %department.code,
            actor = %ctx.actor_id,
            "院系已创建"
        );
        self.action_log_repo.insert(&ActionLog::new(
            ActionType::CreateDepartment,
            ctx.actor_id.clone(),
            "department",
            Some(department_id.clone()),
            Some(json!({ "code": department.code, "name": department.name })),
            None,
        ))?;

        Ok(department_id)
    }

    /// 更新院系（仅套用变更字段, 刷新 updated_at）
    pub fn update_department(
        &self,
        department_id: &str,
        input: &DepartmentInput,
        ctx: &RequestContext,
    ) -> ApiResult<()> {
        let mut department = self
            .department_repo
            .find_by_id(department_id)?
            .ok_or_else(|| ApiError::not_found("院系", department_id))?;

        let payload = self.validator.validate(input, Some(department_id))?;
        department.apply_payload(payload);
        self.department_repo.update(&department)?;

        tracing::info!(
            department_id = %department_id,
            actor = %ctx.actor_id,
            "院系已更新"
        );
        self.action_log_repo.insert(&ActionLog::new(
            ActionType::UpdateDepartment,
            ctx.actor_id.clone(),
            "department",
            Some(department_id.to_string()),
            Some(json!({ "code": department.code, "name": department.name })),
            None,
        ))?;

        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按ID查询院系
    pub fn get_department(&self, department_id: &str) -> ApiResult<Department> {
        self.department_repo
            .find_by_id(department_id)?
            .ok_or_else(|| ApiError::not_found("院系", department_id))
    }

    /// 按过滤条件列出院系
    pub fn list_departments(&self, filter: &DepartmentFilter) -> ApiResult<Vec<Department>> {
        Ok(self.department_repo.list(filter)?)
    }

    /// 院系依赖快照（每次调用即时聚合, 门控破坏性操作）
    pub fn dependency_snapshot(&self, department_id: &str) -> ApiResult<DependencySnapshot> {
        if self.department_repo.find_by_id(department_id)?.is_none() {
            return Err(ApiError::not_found("院系", department_id));
        }
        Ok(self.dependency_repo.snapshot(department_id)?)
    }

    /// 负责人候选两级查找
    ///
    /// 第一级为本院系在职教师; 为空则回退到全校在职教师。
    /// 返回值携带实际命中的层级标志, 不做静默放宽。
    pub fn list_eligible_heads(
        &self,
        department_id: Option<&str>,
    ) -> ApiResult<(Vec<FacultyBrief>, HeadLookupMode)> {
        if let Some(dept) = department_id {
            if self.department_repo.find_by_id(dept)?.is_none() {
                return Err(ApiError::not_found("院系", dept));
            }
            let primary = self.department_repo.eligible_heads_in_department(dept)?;
            if !primary.is_empty() {
                return Ok((primary, HeadLookupMode::DepartmentFaculty));
            }
            tracing::debug!(department_id = %dept, "本院系无负责人候选, 回退到全校教师");
            let fallback = self.department_repo.eligible_heads_all(Some(dept))?;
            return Ok((fallback, HeadLookupMode::AllFaculty));
        }

        let all = self.department_repo.eligible_heads_all(None)?;
        Ok((all, HeadLookupMode::AllFaculty))
    }

    // ==========================================
    // 启停/停用转移
    // ==========================================

    /// 切换启用状态（无依赖路径的停用/重新启用, 不做级联）
    ///
    /// 重新启用前复查负责人唯一性: 停用期间该教师可能已
    /// 另任其他启用院系的负责人
    pub fn change_status(
        &self,
        department_id: &str,
        active: bool,
        ctx: &RequestContext,
    ) -> ApiResult<()> {
        let department = self
            .department_repo
            .find_by_id(department_id)?
            .ok_or_else(|| ApiError::not_found("院系", department_id))?;

        if active {
            if let Some(head) = &department.head_id {
                if let Some(other) = self
                    .department_repo
                    .head_conflict(head, Some(department_id))?
                {
                    return Err(ApiError::Precondition {
                        message: format!(
                            "负责人已担任「{}」的负责人, 请先调整负责人再重新启用",
                            other
                        ),
                        blocking: Vec::new(),
                    });
                }
            }
        }

        let rows = self.department_repo.set_active(department_id, active)?;
        if rows == 0 {
            return Err(ApiError::not_found("院系", department_id));
        }

        tracing::info!(
            department_id = %department_id,
            active,
            actor = %ctx.actor_id,
            "院系启用状态已切换"
        );
        self.action_log_repo.insert(&ActionLog::new(
            ActionType::ChangeStatus,
            ctx.actor_id.clone(),
            "department",
            Some(department_id.to_string()),
            Some(json!({ "is_active": active })),
            None,
        ))?;

        Ok(())
    }

    /// 停用院系并转移/解绑其依赖（单一事务, 不允许部分生效）
    ///
    /// 用户转移到配置的默认院系 (config: department.reassign_target),
    /// 未配置则清空引用; 课程/教室解绑; 资源分配软释放; 课表保持原样。
    pub fn deactivate_with_reassignment(
        &self,
        department_id: &str,
        ctx: &RequestContext,
    ) -> ApiResult<ReassignmentOutcome> {
        let department = self
            .department_repo
            .find_by_id(department_id)?
            .ok_or_else(|| ApiError::not_found("院系", department_id))?;
        if !department.is_active {
            return Err(ApiError::Precondition {
                message: format!("院系「{}」已处于停用状态", department.name),
                blocking: Vec::new(),
            });
        }

        let reassign_target = self.config.get_reassign_target()?;
        let outcome = self
            .department_repo
            .deactivate_with_reassignment(department_id, reassign_target.as_deref())?;

        tracing::info!(
            department_id = %department_id,
            users_reassigned = outcome.users_reassigned,
            subjects_detached = outcome.subjects_detached,
            classrooms_detached = outcome.classrooms_detached,
            resources_released = outcome.resources_released,
            actor = %ctx.actor_id,
            "院系已停用并完成依赖转移"
        );
        self.action_log_repo.insert(&ActionLog::new(
            ActionType::DeactivateReassign,
            ctx.actor_id.clone(),
            "department",
            Some(department_id.to_string()),
            Some(json!({
                "users_reassigned": outcome.users_reassigned,
                "subjects_detached": outcome.subjects_detached,
                "classrooms_detached": outcome.classrooms_detached,
                "resources_released": outcome.resources_released,
                "reassign_target": outcome.reassign_target,
            })),
            None,
        ))?;

        Ok(outcome)
    }

    // ==========================================
    // 硬删除
    // ==========================================

    /// 硬删除院系
    ///
    /// 前置条件: 已停用 且 依赖快照全零。启用院系不允许一步删除 ——
    /// 必须先停用、确认无依赖, 以保证可审计的两步确认流程。
    pub fn delete_department(
        &self,
        department_id: &str,
        ctx: &RequestContext,
    ) -> ApiResult<()> {
        let department = self
            .department_repo
            .find_by_id(department_id)?
            .ok_or_else(|| ApiError::not_found("院系", department_id))?;

        if department.is_active {
            return Err(ApiError::Precondition {
                message: format!("院系「{}」仍处于启用状态, 必须先停用再删除", department.name),
                blocking: Vec::new(),
            });
        }

        let snapshot = self.dependency_repo.snapshot(department_id)?;
        if !snapshot.is_empty() {
            let blocking = snapshot.blocking();
            tracing::warn!(
                department_id = %department_id,
                ?blocking,
                "硬删除被依赖阻止"
            );
            return Err(ApiError::Precondition {
                message: format!(
                    "院系「{}」仍存在依赖 (用户{} 课程{} 教室{} 课表{}), 不允许删除",
                    department.name,
                    snapshot.active_users,
                    snapshot.active_subjects,
                    snapshot.active_classrooms,
                    snapshot.active_timetables
                ),
                blocking,
            });
        }

        self.department_repo.delete(department_id)?;

        tracing::info!(
            department_id = %department_id,
            code = %department.code,
            actor = %ctx.actor_id,
            "院系已永久删除"
        );
        self.action_log_repo.insert(&ActionLog::new(
            ActionType::DeleteDepartment,
            ctx.actor_id.clone(),
            "department",
            Some(department_id.to_string()),
            Some(json!({ "code": department.code, "name": department.name })),
            None,
        ))?;

        Ok(())
    }
}
