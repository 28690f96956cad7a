// ==========================================
// 高校课表管理系统 - 操作日志领域模型
// ==========================================
// 红线: 所有写入必须记录
// 用途: 审计追踪
// 对齐: action_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,               // 日志ID (UUID)
    pub action_type: String,             // 操作类型 (存储为字符串)
    pub actor: String,                   // 操作人
    pub target_type: String,             // 目标类型 (department/resource/config)
    pub target_id: Option<String>,       // 目标ID
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,          // 详细描述
    pub action_ts: NaiveDateTime,        // 操作时间戳
}

impl ActionLog {
    /// 创建新日志（自动生成 UUID 和时间戳）
    pub fn new(
        action_type: ActionType,
        actor: String,
        target_type: &str,
        target_id: Option<String>,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: Uuid::new_v4().to_string(),
            action_type: action_type.as_str().to_string(),
            actor,
            target_type: target_type.to_string(),
            target_id,
            payload_json,
            detail,
            action_ts: chrono::Local::now().naive_local(),
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateDepartment,   // 创建院系
    UpdateDepartment,   // 更新院系
    ChangeStatus,       // 启用/停用 (无依赖路径)
    DeactivateReassign, // 停用并转移依赖
    DeleteDepartment,   // 硬删除院系
    AssignClassrooms,   // 批量分配教室
    AssignFaculty,      // 批量分配教师
    UpdateSharing,      // 更新共享关系
    RemoveResource,     // 软移除资源分配
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateDepartment => "create_department",
            ActionType::UpdateDepartment => "update_department",
            ActionType::ChangeStatus => "change_status",
            ActionType::DeactivateReassign => "deactivate_reassign",
            ActionType::DeleteDepartment => "delete_department",
            ActionType::AssignClassrooms => "assign_classrooms",
            ActionType::AssignFaculty => "assign_faculty",
            ActionType::UpdateSharing => "update_sharing",
            ActionType::RemoveResource => "remove_resource",
        }
    }
}
