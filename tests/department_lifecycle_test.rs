// ==========================================
// 院系生命周期集成测试
// ==========================================
// 测试目标: 停用转移事务、硬删除前置条件、回滚语义
// ==========================================

mod test_helpers;

use timetable_admin::api::ApiError;
use timetable_admin::config::config_keys;
use timetable_admin::logging;

use test_helpers::{admin_ctx, create_department, create_test_state};

// ==========================================
// 启停切换
// ==========================================

#[test]
fn test_change_status_round_trip() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let id = create_department(&state, "CS", "计算机学院");
    state
        .department_api
        .change_status(&id, false, &ctx)
        .expect("停用失败");
    assert!(!state.department_api.get_department(&id).unwrap().is_active);

    state
        .department_api
        .change_status(&id, true, &ctx)
        .expect("重新启用失败");
    assert!(state.department_api.get_department(&id).unwrap().is_active);

    let err = state
        .department_api
        .change_status("no-such-id", false, &ctx)
        .expect_err("不存在的院系应返回 NotFound");
    assert!(matches!(err, ApiError::NotFound(_)));
}

// ==========================================
// 停用转移
// ==========================================

#[test]
fn test_deactivate_detaches_dependents() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let id = create_department(&state, "CS", "计算机学院");
    for name in ["甲", "乙", "丙"] {
        state
            .roster_repo
            .insert_user(name, "student", Some(&id))
            .expect("插入用户失败");
    }
    state
        .roster_repo
        .insert_subject("CS101", "程序设计", Some(&id))
        .expect("插入课程失败");
    let room = state
        .roster_repo
        .insert_classroom("101", "一号楼", 60, None)
        .expect("插入教室失败");
    state
        .resource_api
        .assign_classrooms(&id, &[room.clone()], None, None, None, &ctx)
        .expect("分配教室失败");

    let outcome = state
        .department_api
        .deactivate_with_reassignment(&id, &ctx)
        .expect("停用转移失败");
    assert_eq!(outcome.users_reassigned, 3);
    assert_eq!(outcome.subjects_detached, 1);
    // 分配时教室归属指针指向本院系, 停用时被解绑
    assert_eq!(outcome.classrooms_detached, 1);
    assert_eq!(outcome.resources_released, 1);
    assert_eq!(outcome.reassign_target, None);

    let dept = state.department_api.get_department(&id).expect("查询失败");
    assert!(!dept.is_active);

    // 未配置转移目标时用户引用清空
    let snapshot = state
        .department_api
        .dependency_snapshot(&id)
        .expect("快照失败");
    assert!(snapshot.is_empty());

    // 分配记录已软释放, 教室恢复可分配
    let resources = state
        .resource_api
        .list_department_resources(&id)
        .expect("查询失败");
    assert!(resources.is_empty());
}

#[test]
fn test_deactivate_moves_users_to_configured_target() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let source = create_department(&state, "CS", "计算机学院");
    let target = create_department(&state, "GEN", "通识教育学院");
    state
        .config
        .set_global_config_value(config_keys::REASSIGN_TARGET, &target)
        .expect("写配置失败");

    let user = state
        .roster_repo
        .insert_user("甲", "student", Some(&source))
        .expect("插入用户失败");

    let outcome = state
        .department_api
        .deactivate_with_reassignment(&source, &ctx)
        .expect("停用转移失败");
    assert_eq!(outcome.users_reassigned, 1);
    assert_eq!(outcome.reassign_target.as_deref(), Some(target.as_str()));

    let record = state
        .roster_repo
        .find_user(&user)
        .expect("查询失败")
        .expect("用户应存在");
    assert_eq!(record.department_id.as_deref(), Some(target.as_str()));
}

#[test]
fn test_deactivate_rolls_back_on_invalid_target() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let id = create_department(&state, "CS", "计算机学院");
    let user = state
        .roster_repo
        .insert_user("甲", "student", Some(&id))
        .expect("插入用户失败");
    state
        .config
        .set_global_config_value(config_keys::REASSIGN_TARGET, "no-such-dept")
        .expect("写配置失败");

    let err = state
        .department_api
        .deactivate_with_reassignment(&id, &ctx)
        .expect_err("非法转移目标应失败");
    assert!(matches!(err, ApiError::Precondition { .. }), "实际 {:?}", err);

    // 整个事务回滚: 院系仍启用, 用户仍挂靠
    let dept = state.department_api.get_department(&id).expect("查询失败");
    assert!(dept.is_active, "停用标记应随事务回滚");
    let record = state
        .roster_repo
        .find_user(&user)
        .expect("查询失败")
        .expect("用户应存在");
    assert_eq!(record.department_id.as_deref(), Some(id.as_str()));
}

#[test]
fn test_deactivate_twice_is_rejected() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let id = create_department(&state, "CS", "计算机学院");
    state
        .department_api
        .deactivate_with_reassignment(&id, &ctx)
        .expect("首次停用失败");
    let err = state
        .department_api
        .deactivate_with_reassignment(&id, &ctx)
        .expect_err("重复停用应被拒绝");
    assert!(matches!(err, ApiError::Precondition { .. }));
}

// ==========================================
// 硬删除
// ==========================================

#[test]
fn test_delete_requires_inactive() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let id = create_department(&state, "CS", "计算机学院");
    let err = state
        .department_api
        .delete_department(&id, &ctx)
        .expect_err("启用院系不允许删除");
    assert!(matches!(err, ApiError::Precondition { .. }));
}

#[test]
fn test_delete_blocked_by_dependents() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let id = create_department(&state, "CS", "计算机学院");
    // change_status 不做级联, 课程仍挂靠
    state
        .roster_repo
        .insert_subject("CS101", "程序设计", Some(&id))
        .expect("插入课程失败");
    state
        .department_api
        .change_status(&id, false, &ctx)
        .expect("停用失败");

    let err = state
        .department_api
        .delete_department(&id, &ctx)
        .expect_err("有依赖时不允许删除");
    match err {
        ApiError::Precondition { blocking, .. } => {
            assert!(blocking.contains(&"subjects"), "blocking: {:?}", blocking);
        }
        other => panic!("期望 Precondition, 实际 {:?}", other),
    }
}

#[test]
fn test_delete_blocked_by_timetable() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let id = create_department(&state, "CS", "计算机学院");
    let subject = state
        .roster_repo
        .insert_subject("CS101", "程序设计", Some(&id))
        .expect("插入课程失败");
    state
        .roster_repo
        .insert_timetable(Some(&subject), None, 1, 2)
        .expect("插入课表失败");
    state
        .department_api
        .change_status(&id, false, &ctx)
        .expect("停用失败");

    let snapshot = state
        .department_api
        .dependency_snapshot(&id)
        .expect("快照失败");
    assert_eq!(snapshot.active_timetables, 1);

    let err = state
        .department_api
        .delete_department(&id, &ctx)
        .expect_err("课表依赖应阻止删除");
    match err {
        ApiError::Precondition { blocking, .. } => {
            assert!(blocking.contains(&"timetables"), "blocking: {:?}", blocking);
        }
        other => panic!("期望 Precondition, 实际 {:?}", other),
    }
}

#[test]
fn test_delete_clean_department() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let id = create_department(&state, "CS", "计算机学院");
    state
        .department_api
        .deactivate_with_reassignment(&id, &ctx)
        .expect("停用失败");
    state
        .department_api
        .delete_department(&id, &ctx)
        .expect("删除失败");

    let err = state
        .department_api
        .get_department(&id)
        .expect_err("删除后的查询应返回 NotFound");
    assert!(matches!(err, ApiError::NotFound(_)));

    // 重复删除同样返回 NotFound
    let err = state
        .department_api
        .delete_department(&id, &ctx)
        .expect_err("重复删除应返回 NotFound");
    assert!(matches!(err, ApiError::NotFound(_)));
}
