// ==========================================
// 高校课表管理系统 - 数据仓储层
// ==========================================
// 职责: 数据访问与事务编排, 所有仓储共享同一个
// Arc<Mutex<Connection>>, 由 AppState 统一装配
// ==========================================

pub mod action_log_repo;
pub mod department_repo;
pub mod dependency_repo;
pub mod error;
pub mod resource_repo;
pub mod roster_repo;

pub use action_log_repo::ActionLogRepository;
pub use department_repo::{DepartmentFilter, DepartmentRepository, FacultyBrief};
pub use dependency_repo::{DashboardOverview, DependencyRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use resource_repo::ResourceRepository;
pub use roster_repo::{ClassroomRecord, RosterRepository, SubjectRecord, TimetableRecord, UserRecord};
