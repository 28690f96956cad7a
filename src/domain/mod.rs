// ==========================================
// 高校课表管理系统 - 领域层
// ==========================================
// 职责: 定义院系管理核心的实体与值类型
// ==========================================

pub mod action_log;
pub mod context;
pub mod department;
pub mod resource;
pub mod snapshot;

pub use action_log::{ActionLog, ActionType};
pub use context::{ActorRole, RequestContext};
pub use department::{Department, DepartmentPayload};
pub use resource::{DepartmentResource, ResourceType};
pub use snapshot::{AssignmentOutcome, DependencySnapshot, ReassignmentOutcome};
