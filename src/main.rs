// ==========================================
// 高校课表管理系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 教务管理后台核心
// ==========================================

use timetable_admin::app::AppState;

fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    timetable_admin::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 管理后台核心", timetable_admin::APP_NAME);
    tracing::info!("系统版本: {}", timetable_admin::VERSION);
    tracing::info!("==================================================");

    // 数据库路径: 命令行第一个参数, 默认当前目录
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "timetable_admin.db".to_string());
    tracing::info!("使用数据库: {}", db_path);

    tracing::info!("正在初始化AppState...");
    let state = AppState::new(&db_path)?;
    tracing::info!("AppState初始化成功");

    // 输出驾驶舱总览, 确认数据库可用
    let overview = state.dashboard_api.overview()?;
    tracing::info!(
        "院系总数: {} (启用 {} / 停用 {})",
        overview.total_departments,
        overview.active_departments,
        overview.inactive_departments
    );
    tracing::info!(
        "未挂靠: 用户 {} / 课程 {} / 教室 {}",
        overview.unassigned_users,
        overview.unassigned_subjects,
        overview.unassigned_classrooms
    );

    Ok(())
}
