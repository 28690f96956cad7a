// ==========================================
// 驾驶舱 API 集成测试
// ==========================================
// 测试目标: 总览聚合、单院系统计、操作日志查询
// ==========================================

mod test_helpers;

use timetable_admin::api::ApiError;
use timetable_admin::logging;

use test_helpers::{admin_ctx, create_department, create_test_state, dept_input};

#[test]
fn test_overview_counts() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let mut cs = dept_input("CS", "计算机学院");
    cs.budget_allocation = Some("500000".to_string());
    let cs_id = state
        .department_api
        .create_department(&cs, &ctx)
        .expect("创建失败");

    let mut math = dept_input("MATH", "数学学院");
    math.budget_allocation = Some("250000".to_string());
    let math_id = state
        .department_api
        .create_department(&math, &ctx)
        .expect("创建失败");
    state
        .department_api
        .change_status(&math_id, false, &ctx)
        .expect("停用失败");

    // 挂靠一人 + 游离一人/一课程/一教室
    state
        .roster_repo
        .insert_user("甲", "student", Some(&cs_id))
        .expect("插入用户失败");
    state
        .roster_repo
        .insert_user("乙", "faculty", None)
        .expect("插入用户失败");
    state
        .roster_repo
        .insert_subject("GE101", "通识课", None)
        .expect("插入课程失败");
    state
        .roster_repo
        .insert_classroom("101", "一号楼", 60, None)
        .expect("插入教室失败");

    let overview = state.dashboard_api.overview().expect("总览失败");
    assert_eq!(overview.total_departments, 2);
    assert_eq!(overview.active_departments, 1);
    assert_eq!(overview.inactive_departments, 1);
    assert_eq!(overview.unassigned_users, 1);
    assert_eq!(overview.unassigned_subjects, 1);
    assert_eq!(overview.unassigned_classrooms, 1);
    // 预算合计只统计启用院系
    assert!((overview.total_budget_allocation - 500000.0).abs() < f64::EPSILON);
}

#[test]
fn test_department_statistics() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let dept = create_department(&state, "CS", "计算机学院");
    state
        .roster_repo
        .insert_user("甲", "student", Some(&dept))
        .expect("插入用户失败");
    state
        .roster_repo
        .insert_subject("CS101", "程序设计", Some(&dept))
        .expect("插入课程失败");
    let room = state
        .roster_repo
        .insert_classroom("101", "一号楼", 60, None)
        .expect("插入教室失败");
    let teacher = state
        .roster_repo
        .insert_user("王五", "faculty", None)
        .expect("插入用户失败");
    state
        .resource_api
        .assign_classrooms(&dept, &[room], None, None, None, &ctx)
        .expect("分配教室失败");
    state
        .resource_api
        .assign_faculty(&dept, &[teacher], None, &ctx)
        .expect("分配教师失败");

    let stats = state
        .dashboard_api
        .department_statistics(&dept)
        .expect("统计失败");
    assert_eq!(stats.code, "CS");
    assert!(stats.is_active);
    assert_eq!(stats.snapshot.active_users, 1);
    assert_eq!(stats.snapshot.active_subjects, 1);
    // 分配教室时归属指针指向本系, 计入依赖快照
    assert_eq!(stats.snapshot.active_classrooms, 1);
    assert_eq!(stats.assigned_classrooms, 1);
    assert_eq!(stats.assigned_faculty, 1);

    let err = state
        .dashboard_api
        .department_statistics("no-such-id")
        .expect_err("不存在的院系应返回 NotFound");
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_corrupt_action_log_row_surfaces_error() {
    let (tmp, state) = create_test_state().expect("初始化失败");

    create_department(&state, "CS", "计算机学院");

    // 绕过仓储写入损坏行 (畸形 JSON + 非法时间戳)
    let raw = rusqlite::Connection::open(tmp.path()).expect("打开连接失败");
    raw.execute(
        "INSERT INTO action_log (
            action_id, action_type, actor, target_type, target_id,
            payload_json, detail, action_ts
         ) VALUES ('bad-row', 'create_department', 'admin-001', 'department',
                   NULL, '{not json', NULL, 'not-a-timestamp')",
        [],
    )
    .expect("插入损坏行失败");
    drop(raw);

    // 损坏数据不允许被静默吞掉
    let err = state
        .dashboard_api
        .recent_actions(10)
        .expect_err("损坏行应导致查询失败");
    assert!(matches!(err, ApiError::Persistence(_)), "实际 {:?}", err);
}

#[test]
fn test_action_log_queries() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let dept = create_department(&state, "CS", "计算机学院");
    state
        .department_api
        .change_status(&dept, false, &ctx)
        .expect("停用失败");
    state
        .department_api
        .change_status(&dept, true, &ctx)
        .expect("启用失败");

    let recent = state.dashboard_api.recent_actions(10).expect("查询失败");
    assert_eq!(recent.len(), 3);
    assert!(recent.iter().all(|log| log.actor == "admin-001"));

    // limit 截断
    let limited = state.dashboard_api.recent_actions(2).expect("查询失败");
    assert_eq!(limited.len(), 2);

    let history = state
        .dashboard_api
        .department_actions(&dept)
        .expect("查询失败");
    assert_eq!(history.len(), 3);
    assert!(history
        .iter()
        .any(|log| log.action_type == "create_department"));
    assert!(history
        .iter()
        .any(|log| log.action_type == "change_status"));
}
