// ==========================================
// 高校课表管理系统 - 依赖快照与操作结果
// ==========================================
// 说明: DependencySnapshot 为派生数据, 每次调用即时聚合,
// 不做缓存 —— 它用于门控破坏性操作, 必须反映最新状态
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// DependencySnapshot - 院系依赖快照
// ==========================================
// 课表计数口径: 经课程关联 ∪ 经教室关联 (DISTINCT 并集)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DependencySnapshot {
    pub active_users: i64,      // 在册用户数
    pub active_subjects: i64,   // 启用课程数
    pub active_classrooms: i64, // 启用教室数
    pub active_timetables: i64, // 启用课表数
}

impl DependencySnapshot {
    /// 是否不存在任何依赖（硬删除的前置条件之一）
    pub fn is_empty(&self) -> bool {
        self.active_users == 0
            && self.active_subjects == 0
            && self.active_classrooms == 0
            && self.active_timetables == 0
    }

    /// 列出阻止删除的依赖名称
    pub fn blocking(&self) -> Vec<&'static str> {
        let mut blocking = Vec::new();
        if self.active_users > 0 {
            blocking.push("users");
        }
        if self.active_subjects > 0 {
            blocking.push("subjects");
        }
        if self.active_classrooms > 0 {
            blocking.push("classrooms");
        }
        if self.active_timetables > 0 {
            blocking.push("timetables");
        }
        blocking
    }
}

// ==========================================
// ReassignmentOutcome - 停用并转移的执行结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReassignmentOutcome {
    pub users_reassigned: usize,        // 转移/解绑的用户数
    pub subjects_detached: usize,       // 解绑的课程数
    pub classrooms_detached: usize,     // 解绑的教室数
    pub resources_released: usize,      // 软释放的资源分配数
    pub reassign_target: Option<String>, // 用户被转移到的默认院系 (None=清空引用)
}

// ==========================================
// AssignmentOutcome - 批量资源分配的执行结果
// ==========================================
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssignmentOutcome {
    pub requested: usize, // 请求分配的资源数 (去重后)
    pub assigned: usize,  // 实际新建的分配数
    pub skipped: usize,   // 因已存在有效分配而跳过的数量 (幂等)
}
