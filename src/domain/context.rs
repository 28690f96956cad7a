// ==========================================
// 高校课表管理系统 - 请求上下文
// ==========================================
// 说明: 取代原面板对全局请求状态的隐式依赖 ——
// 操作人信息由调用方显式传入, 核心层不做鉴权,
// 信任上游会话/权限中间件已完成校验
// ==========================================

use serde::{Deserialize, Serialize};

/// 操作人角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorRole {
    Admin,          // 系统管理员
    Registrar,      // 教务员
    DepartmentHead, // 院系负责人
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Admin => "admin",
            ActorRole::Registrar => "registrar",
            ActorRole::DepartmentHead => "department_head",
        }
    }
}

/// 请求上下文
///
/// 每次 API 调用携带一个, 用于审计日志与 created_by 字段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    pub actor_id: String, // 操作人 user_id
    pub role: ActorRole,  // 操作人角色 (已由上游鉴权)
}

impl RequestContext {
    pub fn new(actor_id: impl Into<String>, role: ActorRole) -> Self {
        Self {
            actor_id: actor_id.into(),
            role,
        }
    }
}
