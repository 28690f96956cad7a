// ==========================================
// 高校课表管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 教务管理后台核心 (院系/资源/驾驶舱)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    ActionLog, ActionType, ActorRole, AssignmentOutcome, Department, DepartmentPayload,
    DepartmentResource, DependencySnapshot, ReassignmentOutcome, RequestContext, ResourceType,
};

// 仓储
pub use repository::{
    ActionLogRepository, DashboardOverview, DepartmentFilter, DepartmentRepository,
    DependencyRepository, FacultyBrief, RepositoryError, RepositoryResult, ResourceRepository,
    RosterRepository,
};

// API
pub use api::{
    ApiError, ApiResult, DashboardApi, DepartmentApi, DepartmentInput, DepartmentStatistics,
    DepartmentValidator, FieldError, HeadLookupMode, ResourceApi,
};

// 配置
pub use config::ConfigManager;

// 应用状态
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "高校课表管理系统";

// 数据库版本
pub const DB_VERSION: &str = "v1";

// ==========================================
// 预编译检查
// ==========================================
