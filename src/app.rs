// ==========================================
// 高校课表管理系统 - 应用状态
// ==========================================
// 职责: 装配共享连接、各仓储与 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{DashboardApi, DepartmentApi, DepartmentValidator, ResourceApi};
use crate::config::ConfigManager;
use crate::db::{
    open_sqlite_connection, read_schema_version, record_schema_version, CURRENT_SCHEMA_VERSION,
};
use crate::repository::{
    ActionLogRepository, DepartmentRepository, DependencyRepository, ResourceRepository,
    RosterRepository,
};

/// 应用状态
///
/// 包含所有 API 实例和共享资源, 由表现层作为全局状态持有
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 院系管理API
    pub department_api: Arc<DepartmentApi>,

    /// 资源分配API
    pub resource_api: Arc<ResourceApi>,

    /// 驾驶舱API
    pub dashboard_api: Arc<DashboardApi>,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 基础名录仓储（兄弟模块/测试数据准备使用）
    pub roster_repo: Arc<RosterRepository>,
}

impl AppState {
    /// 打开数据库并装配全部仓储与 API
    pub fn new(db_path: &str) -> anyhow::Result<Self> {
        let conn = open_sqlite_connection(db_path)?;
        if let Some(version) = read_schema_version(&conn)? {
            if version != CURRENT_SCHEMA_VERSION {
                tracing::warn!(
                    found = version,
                    expected = CURRENT_SCHEMA_VERSION,
                    "数据库 schema 版本与当前代码不一致"
                );
            }
        }
        record_schema_version(&conn)?;
        let conn = Arc::new(Mutex::new(conn));
        Self::from_connection(db_path, conn)
    }

    /// 从共享连接装配（测试场景直接传入已初始化的连接）
    pub fn from_connection(
        db_path: &str,
        conn: Arc<Mutex<Connection>>,
    ) -> anyhow::Result<Self> {
        // 建表顺序: 先 departments, 再依赖它的 department_resources
        let department_repo = Arc::new(DepartmentRepository::from_connection(Arc::clone(&conn))?);
        let roster_repo = Arc::new(RosterRepository::from_connection(Arc::clone(&conn))?);
        let resource_repo = Arc::new(ResourceRepository::from_connection(Arc::clone(&conn))?);
        let action_log_repo = Arc::new(ActionLogRepository::from_connection(Arc::clone(&conn))?);
        let dependency_repo = Arc::new(DependencyRepository::from_connection(Arc::clone(&conn)));
        let config = Arc::new(ConfigManager::from_connection(Arc::clone(&conn))?);

        let validator =
            DepartmentValidator::new(Arc::clone(&department_repo), Arc::clone(&roster_repo));

        let department_api = Arc::new(DepartmentApi::new(
            Arc::clone(&department_repo),
            Arc::clone(&dependency_repo),
            Arc::clone(&action_log_repo),
            Arc::clone(&config),
            validator,
        ));
        let resource_api = Arc::new(ResourceApi::new(
            Arc::clone(&resource_repo),
            Arc::clone(&department_repo),
            Arc::clone(&action_log_repo),
        ));
        let dashboard_api = Arc::new(DashboardApi::new(
            Arc::clone(&department_repo),
            Arc::clone(&dependency_repo),
            Arc::clone(&resource_repo),
            Arc::clone(&action_log_repo),
        ));

        Ok(Self {
            db_path: db_path.to_string(),
            department_api,
            resource_api,
            dashboard_api,
            config,
            roster_repo,
        })
    }
}
