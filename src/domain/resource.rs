// ==========================================
// 高校课表管理系统 - 院系资源领域模型
// ==========================================
// 对齐: department_resources 表
// 不变量: 同一 (归属院系, 资源类型, 资源引用) 至多存在一条 is_active=1 的记录
// ==========================================

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// ResourceType - 资源类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    Classroom, // 教室
    Faculty,   // 教师
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Classroom => "classroom",
            ResourceType::Faculty => "faculty",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "classroom" => Some(ResourceType::Classroom),
            "faculty" => Some(ResourceType::Faculty),
            _ => None,
        }
    }
}

// ==========================================
// DepartmentResource - 资源分配记录
// ==========================================
// 说明: 记录教室/教师与归属院系的分配关系, 可共享给第二个院系;
// 移除只做软删除 (is_active=0), 底层教室/教师实体不受影响
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentResource {
    pub resource_id: String,                       // 分配记录ID (UUID)
    pub owner_department_id: String,               // 归属院系
    pub resource_type: ResourceType,               // 资源类型
    pub resource_ref_id: String,                   // 教室ID/教师user_id
    pub sharing_conditions: Option<String>,        // 共享条件 (自由文本)
    pub shared_with_department_id: Option<String>, // 共享院系 (可选)
    pub start_date: Option<String>,                // 有效期开始 (仅教室)
    pub end_date: Option<String>,                  // 有效期结束 (仅教室)
    pub is_active: bool,                           // 软删除标志
    pub created_by: String,                        // 创建人
    pub created_at: String,                        // 创建时间
}

impl DepartmentResource {
    /// 创建新的分配记录（自动生成 UUID 和时间戳, 默认启用）
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        owner_department_id: String,
        resource_type: ResourceType,
        resource_ref_id: String,
        sharing_conditions: Option<String>,
        shared_with_department_id: Option<String>,
        start_date: Option<String>,
        end_date: Option<String>,
        created_by: String,
    ) -> Self {
        let now = chrono::Local::now()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

        Self {
            resource_id: Uuid::new_v4().to_string(),
            owner_department_id,
            resource_type,
            resource_ref_id,
            sharing_conditions,
            shared_with_department_id,
            start_date,
            end_date,
            is_active: true,
            created_by,
            created_at: now,
        }
    }
}
