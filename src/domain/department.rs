// ==========================================
// 高校课表管理系统 - 院系领域模型
// ==========================================
// 对齐: departments 表
// 生命周期: 创建(启用) → 更新 → 停用/重新启用 → 硬删除(仅停用且无依赖时)
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Department - 院系实体
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub department_id: String,            // 院系ID (UUID)
    pub code: String,                     // 院系代码 (2-10位大写字母/数字, 全局唯一)
    pub name: String,                     // 院系名称 (<=100字符)
    pub description: Option<String>,      // 简介 (<=500字符)
    pub head_id: Option<String>,          // 负责人 (教师user_id, 同一教师至多负责一个启用院系)
    pub established_date: Option<String>, // 成立日期 (ISO DATE, 不得晚于今天)
    pub contact_email: Option<String>,    // 联系邮箱
    pub contact_phone: Option<String>,    // 联系电话
    pub building_location: Option<String>, // 办公楼位置
    pub budget_allocation: Option<f64>,   // 预算拨款 (非负)
    pub is_active: bool,                  // 启用标志 (软删除)
    pub created_at: String,               // 创建时间
    pub updated_at: String,               // 更新时间
}

impl Department {
    /// 由校验后的写入载荷创建新院系（自动生成 UUID 和时间戳, 默认启用）
    pub fn from_payload(payload: DepartmentPayload) -> Self {
        let now = chrono::Local::now()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();

        Self {
            department_id: Uuid::new_v4().to_string(),
            code: payload.code,
            name: payload.name,
            description: payload.description,
            head_id: payload.head_id,
            established_date: payload.established_date.map(|d| d.to_string()),
            contact_email: payload.contact_email,
            contact_phone: payload.contact_phone,
            building_location: payload.building_location,
            budget_allocation: payload.budget_allocation,
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// 将校验后的写入载荷套用到已有院系（保留主键/启用状态/创建时间, 刷新更新时间）
    pub fn apply_payload(&mut self, payload: DepartmentPayload) {
        self.code = payload.code;
        self.name = payload.name;
        self.description = payload.description;
        self.head_id = payload.head_id;
        self.established_date = payload.established_date.map(|d| d.to_string());
        self.contact_email = payload.contact_email;
        self.contact_phone = payload.contact_phone;
        self.building_location = payload.building_location;
        self.budget_allocation = payload.budget_allocation;
        self.updated_at = chrono::Local::now()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
    }
}

// ==========================================
// DepartmentPayload - 校验后的写入载荷
// ==========================================
// 说明: 由 DepartmentValidator 产出, 所有字段已归一化
// (code 已转大写、空白可选字段已折叠为 None)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentPayload {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub head_id: Option<String>,
    pub established_date: Option<NaiveDate>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub building_location: Option<String>,
    pub budget_allocation: Option<f64>,
}
