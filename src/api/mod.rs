// ==========================================
// 高校课表管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供表现层调用
// ==========================================

pub mod dashboard_api;
pub mod department_api;
pub mod error;
pub mod resource_api;
pub mod validator;

// 重导出核心类型
pub use dashboard_api::{DashboardApi, DepartmentStatistics};
pub use department_api::{DepartmentApi, HeadLookupMode};
pub use error::{ApiError, ApiResult, FieldError};
pub use resource_api::ResourceApi;
pub use self::validator::{DepartmentInput, DepartmentValidator};
