// ==========================================
// 资源分配 API 集成测试
// ==========================================
// 测试目标: 批量分配的幂等/原子契约、共享关系、软移除
// ==========================================

mod test_helpers;

use timetable_admin::api::ApiError;
use timetable_admin::domain::ResourceType;
use timetable_admin::logging;

use test_helpers::{admin_ctx, create_department, create_test_state};

/// 校验错误中是否包含指定字段
fn has_field_error(err: &ApiError, field: &str) -> bool {
    match err {
        ApiError::Validation { errors } => errors.iter().any(|e| e.field == field),
        _ => false,
    }
}

// ==========================================
// 教室分配
// ==========================================

#[test]
fn test_assign_classrooms_idempotent() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let dept = create_department(&state, "CS", "计算机学院");
    let room = state
        .roster_repo
        .insert_classroom("101", "一号楼", 60, None)
        .expect("插入教室失败");

    let first = state
        .resource_api
        .assign_classrooms(&dept, &[room.clone()], None, None, None, &ctx)
        .expect("首次分配失败");
    assert_eq!(first.assigned, 1);
    assert_eq!(first.skipped, 0);

    // 教室归属指针已指向本系
    let record = state
        .roster_repo
        .find_classroom(&room)
        .expect("查询失败")
        .expect("教室应存在");
    assert_eq!(record.department_id.as_deref(), Some(dept.as_str()));

    // 重复分配: 跳过, 不新建记录
    let second = state
        .resource_api
        .assign_classrooms(&dept, &[room.clone()], None, None, None, &ctx)
        .expect("重复分配不应报错");
    assert_eq!(second.assigned, 0);
    assert_eq!(second.skipped, 1);

    let resources = state
        .resource_api
        .list_department_resources(&dept)
        .expect("查询失败");
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].resource_type, ResourceType::Classroom);
    assert_eq!(resources[0].resource_ref_id, room);
}

#[test]
fn test_assign_classrooms_batch_is_atomic() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let dept = create_department(&state, "CS", "计算机学院");
    let room = state
        .roster_repo
        .insert_classroom("101", "一号楼", 60, None)
        .expect("插入教室失败");

    let batch = vec![room.clone(), "no-such-room".to_string()];
    let err = state
        .resource_api
        .assign_classrooms(&dept, &batch, None, None, None, &ctx)
        .expect_err("含不存在教室的批次应失败");
    assert!(matches!(err, ApiError::NotFound(_)), "实际 {:?}", err);

    // 整批回滚: 合法教室也未被分配
    let resources = state
        .resource_api
        .list_department_resources(&dept)
        .expect("查询失败");
    assert!(resources.is_empty());
    let record = state
        .roster_repo
        .find_classroom(&room)
        .expect("查询失败")
        .expect("教室应存在");
    assert_eq!(record.department_id, None);
}

#[test]
fn test_assign_classrooms_input_validation() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let dept = create_department(&state, "CS", "计算机学院");

    // 空ID列表
    let err = state
        .resource_api
        .assign_classrooms(&dept, &[" ".to_string()], None, None, None, &ctx)
        .expect_err("空ID列表应被拒绝");
    assert!(has_field_error(&err, "classroom_ids"));

    // 有效期窗口起止倒置
    let room = state
        .roster_repo
        .insert_classroom("101", "一号楼", 60, None)
        .expect("插入教室失败");
    let err = state
        .resource_api
        .assign_classrooms(
            &dept,
            &[room],
            None,
            Some("2026-09-01"),
            Some("2026-01-01"),
            &ctx,
        )
        .expect_err("起止倒置应被拒绝");
    assert!(matches!(err, ApiError::Validation { .. }), "实际 {:?}", err);
}

#[test]
fn test_assign_to_inactive_department_rejected() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let dept = create_department(&state, "CS", "计算机学院");
    state
        .department_api
        .change_status(&dept, false, &ctx)
        .expect("停用失败");

    let room = state
        .roster_repo
        .insert_classroom("101", "一号楼", 60, None)
        .expect("插入教室失败");
    let err = state
        .resource_api
        .assign_classrooms(&dept, &[room], None, None, None, &ctx)
        .expect_err("停用院系不能分配资源");
    assert!(matches!(err, ApiError::Precondition { .. }));
}

// ==========================================
// 教师分配
// ==========================================

#[test]
fn test_assign_faculty_requires_faculty_role() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let dept = create_department(&state, "CS", "计算机学院");
    let student = state
        .roster_repo
        .insert_user("张三", "student", None)
        .expect("插入用户失败");

    let err = state
        .resource_api
        .assign_faculty(&dept, &[student], None, &ctx)
        .expect_err("非教师应被拒绝");
    assert!(has_field_error(&err, "faculty_ids"), "实际 {:?}", err);
}

#[test]
fn test_assign_faculty_does_not_move_user() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let home = create_department(&state, "MATH", "数学学院");
    let dept = create_department(&state, "CS", "计算机学院");
    let teacher = state
        .roster_repo
        .insert_user("王五", "faculty", Some(&home))
        .expect("插入用户失败");

    let outcome = state
        .resource_api
        .assign_faculty(&dept, &[teacher.clone()], Some("每周四下午"), &ctx)
        .expect("分配失败");
    assert_eq!(outcome.assigned, 1);

    // 协作元数据, 教师归属院系不变
    let record = state
        .roster_repo
        .find_user(&teacher)
        .expect("查询失败")
        .expect("教师应存在");
    assert_eq!(record.department_id.as_deref(), Some(home.as_str()));

    let resources = state
        .resource_api
        .list_department_resources(&dept)
        .expect("查询失败");
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].resource_type, ResourceType::Faculty);
    assert_eq!(resources[0].sharing_conditions.as_deref(), Some("每周四下午"));
}

// ==========================================
// 共享关系
// ==========================================

#[test]
fn test_update_sharing() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let owner = create_department(&state, "CS", "计算机学院");
    let peer = create_department(&state, "MATH", "数学学院");
    let room = state
        .roster_repo
        .insert_classroom("101", "一号楼", 60, None)
        .expect("插入教室失败");
    state
        .resource_api
        .assign_classrooms(&owner, &[room], None, None, None, &ctx)
        .expect("分配失败");
    let resource_id = state
        .resource_api
        .list_department_resources(&owner)
        .expect("查询失败")[0]
        .resource_id
        .clone();

    // 不能与归属院系自身共享
    let err = state
        .resource_api
        .update_sharing(&resource_id, Some(&owner), None, &ctx)
        .expect_err("自共享应被拒绝");
    assert!(matches!(err, ApiError::Validation { .. }));

    // 共享目标必须存在
    let err = state
        .resource_api
        .update_sharing(&resource_id, Some("no-such-dept"), None, &ctx)
        .expect_err("不存在的共享目标应被拒绝");
    assert!(matches!(err, ApiError::NotFound(_)));

    state
        .resource_api
        .update_sharing(&resource_id, Some(&peer), Some("仅限晚间"), &ctx)
        .expect("更新共享失败");
    let updated = state
        .resource_api
        .list_department_resources(&owner)
        .expect("查询失败");
    assert_eq!(
        updated[0].shared_with_department_id.as_deref(),
        Some(peer.as_str())
    );
    assert_eq!(updated[0].sharing_conditions.as_deref(), Some("仅限晚间"));

    // 空白共享条件折叠为未填
    state
        .resource_api
        .update_sharing(&resource_id, Some(&peer), Some("   "), &ctx)
        .expect("更新共享失败");
    let updated = state
        .resource_api
        .list_department_resources(&owner)
        .expect("查询失败");
    assert_eq!(updated[0].sharing_conditions, None);

    let err = state
        .resource_api
        .update_sharing("no-such-resource", None, None, &ctx)
        .expect_err("不存在的分配记录应返回 NotFound");
    assert!(matches!(err, ApiError::NotFound(_)));
}

// ==========================================
// 软移除
// ==========================================

#[test]
fn test_remove_resource_allows_reassignment() {
    let (_tmp, state) = create_test_state().expect("初始化失败");
    let ctx = admin_ctx();

    let dept = create_department(&state, "CS", "计算机学院");
    let room = state
        .roster_repo
        .insert_classroom("101", "一号楼", 60, None)
        .expect("插入教室失败");
    state
        .resource_api
        .assign_classrooms(&dept, &[room.clone()], None, None, None, &ctx)
        .expect("分配失败");
    let resource_id = state
        .resource_api
        .list_department_resources(&dept)
        .expect("查询失败")[0]
        .resource_id
        .clone();

    state
        .resource_api
        .remove_resource(&resource_id, &ctx)
        .expect("移除失败");
    assert!(state
        .resource_api
        .list_department_resources(&dept)
        .expect("查询失败")
        .is_empty());

    // 软移除后同一教室可重新分配
    let again = state
        .resource_api
        .assign_classrooms(&dept, &[room], None, None, None, &ctx)
        .expect("重新分配失败");
    assert_eq!(again.assigned, 1);
}
