// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

use std::error::Error;

use tempfile::NamedTempFile;

use timetable_admin::api::DepartmentInput;
use timetable_admin::app::AppState;
use timetable_admin::domain::{ActorRole, RequestContext};

/// 创建临时测试数据库并装配 AppState
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - AppState: 完整装配的应用状态
pub fn create_test_state() -> Result<(NamedTempFile, AppState), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();
    let state = AppState::new(&db_path)?;
    Ok((temp_file, state))
}

/// 管理员请求上下文
pub fn admin_ctx() -> RequestContext {
    RequestContext::new("admin-001", ActorRole::Admin)
}

/// 最小合法的院系输入
pub fn dept_input(code: &str, name: &str) -> DepartmentInput {
    DepartmentInput {
        code: code.to_string(),
        name: name.to_string(),
        ..Default::default()
    }
}

/// 创建院系并返回ID
pub fn create_department(state: &AppState, code: &str, name: &str) -> String {
    state
        .department_api
        .create_department(&dept_input(code, name), &admin_ctx())
        .expect("创建院系失败")
}
