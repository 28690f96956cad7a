// ==========================================
// 高校课表管理系统 - 院系输入校验器
// ==========================================
// 职责: 将原始表单字段校验并归一化为写入载荷
// 约定: 聚合所有违规后一次性返回, 不在首个错误处中断
// 副作用: 仅限唯一性/负责人资格的只读查询
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult, FieldError};
use crate::domain::department::DepartmentPayload;
use crate::repository::department_repo::DepartmentRepository;
use crate::repository::roster_repo::RosterRepository;

/// 院系代码长度范围
pub const CODE_MIN_LEN: usize = 2;
pub const CODE_MAX_LEN: usize = 10;
/// 名称/简介长度上限
pub const NAME_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 500;
pub const PHONE_MAX_LEN: usize = 20;

// ==========================================
// DepartmentInput - 原始表单输入
// ==========================================
// 说明: 表现层以字段映射的形式提交, 可选字段的空白串视同未填
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepartmentInput {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub head_id: Option<String>,
    pub established_date: Option<String>,  // YYYY-MM-DD
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub building_location: Option<String>,
    pub budget_allocation: Option<String>, // 十进制数字串
}

/// 空白可选字段折叠为 None
fn normalize_optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 归一化后的代码是否合法: 2-10位大写字母/数字
fn code_format_ok(code: &str) -> bool {
    (CODE_MIN_LEN..=CODE_MAX_LEN).contains(&code.len())
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

// ==========================================
// DepartmentValidator - 院系输入校验器
// ==========================================
pub struct DepartmentValidator {
    department_repo: Arc<DepartmentRepository>,
    roster_repo: Arc<RosterRepository>,
}

impl DepartmentValidator {
    pub fn new(
        department_repo: Arc<DepartmentRepository>,
        roster_repo: Arc<RosterRepository>,
    ) -> Self {
        Self {
            department_repo,
            roster_repo,
        }
    }

    /// 校验原始输入并产出归一化写入载荷
    ///
    /// # 参数
    /// - input: 原始表单字段
    /// - exclude_id: 更新场景下被编辑的院系ID (唯一性/负责人检查时排除自身)
    ///
    /// # 返回
    /// - Ok(DepartmentPayload): 全部字段合法
    /// - Err(ApiError::Validation): 聚合的字段错误列表
    pub fn validate(
        &self,
        input: &DepartmentInput,
        exclude_id: Option<&str>,
    ) -> ApiResult<DepartmentPayload> {
        let mut errors: Vec<FieldError> = Vec::new();

        // ===== code: 必填, 转大写归一化后匹配 [A-Z0-9]{2,10}, 全局唯一 =====
        let code = input.code.trim().to_ascii_uppercase();
        if code.is_empty() {
            errors.push(FieldError::new("code", "院系代码不能为空"));
        } else if !code_format_ok(&code) {
            errors.push(FieldError::new(
                "code",
                format!(
                    "院系代码必须为{}-{}位大写字母或数字",
                    CODE_MIN_LEN, CODE_MAX_LEN
                ),
            ));
        } else if self.department_repo.code_exists(&code, exclude_id)? {
            errors.push(FieldError::new("code", "院系代码已存在"));
        }

        // ===== name: 必填, <=100 =====
        let name = input.name.trim().to_string();
        if name.is_empty() {
            errors.push(FieldError::new("name", "院系名称不能为空"));
        } else if name.chars().count() > NAME_MAX_LEN {
            errors.push(FieldError::new(
                "name",
                format!("院系名称不能超过{}个字符", NAME_MAX_LEN),
            ));
        }

        // ===== description: 可选, <=500 =====
        let description = normalize_optional(&input.description);
        if let Some(desc) = &description {
            if desc.chars().count() > DESCRIPTION_MAX_LEN {
                errors.push(FieldError::new(
                    "description",
                    format!("院系简介不能超过{}个字符", DESCRIPTION_MAX_LEN),
                ));
            }
        }

        // ===== contact_email: 可选, 标准邮箱格式 =====
        let contact_email = normalize_optional(&input.contact_email);
        if let Some(email) = &contact_email {
            if !::validator::validate_email(email.as_str()) {
                errors.push(FieldError::new("contact_email", "联系邮箱格式不正确"));
            }
        }

        // ===== contact_phone: 可选, <=20 =====
        let contact_phone = normalize_optional(&input.contact_phone);
        if let Some(phone) = &contact_phone {
            if phone.chars().count() > PHONE_MAX_LEN {
                errors.push(FieldError::new(
                    "contact_phone",
                    format!("联系电话不能超过{}个字符", PHONE_MAX_LEN),
                ));
            }
        }

        let building_location = normalize_optional(&input.building_location);

        // ===== budget_allocation: 可选, 非负十进制 =====
        let mut budget_allocation: Option<f64> = None;
        if let Some(raw) = normalize_optional(&input.budget_allocation) {
            match raw.parse::<f64>() {
                Ok(v) if !v.is_finite() => {
                    errors.push(FieldError::new("budget_allocation", "预算拨款格式不正确"));
                }
                Ok(v) if v < 0.0 => {
                    errors.push(FieldError::new("budget_allocation", "预算拨款不能为负数"));
                }
                Ok(v) => budget_allocation = Some(v),
                Err(_) => {
                    errors.push(FieldError::new("budget_allocation", "预算拨款格式不正确"));
                }
            }
        }

        // ===== established_date: 可选, ISO日期且不晚于今天 =====
        let mut established_date: Option<NaiveDate> = None;
        if let Some(raw) = normalize_optional(&input.established_date) {
            match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
                Ok(date) => {
                    if date > chrono::Local::now().date_naive() {
                        errors.push(FieldError::new(
                            "established_date",
                            "成立日期不能晚于今天",
                        ));
                    } else {
                        established_date = Some(date);
                    }
                }
                Err(_) => {
                    errors.push(FieldError::new(
                        "established_date",
                        "成立日期必须为 YYYY-MM-DD 格式",
                    ));
                }
            }
        }

        // ===== head_id: 可选, 在职教师且未担任其他启用院系负责人 =====
        let head_id = normalize_optional(&input.head_id);
        if let Some(head) = &head_id {
            match self.roster_repo.find_user(head)? {
                None => {
                    errors.push(FieldError::new("head_id", "指定的负责人不存在"));
                }
                Some(user) if user.role != "faculty" => {
                    errors.push(FieldError::new("head_id", "仅教师可担任院系负责人"));
                }
                Some(user) if !user.is_active => {
                    errors.push(FieldError::new("head_id", "指定的负责人已停用"));
                }
                Some(_) => {
                    if let Some(other) = self.department_repo.head_conflict(head, exclude_id)? {
                        errors.push(FieldError::new(
                            "head_id",
                            format!("该教师已担任「{}」的负责人", other),
                        ));
                    }
                }
            }
        }

        if !errors.is_empty() {
            return Err(ApiError::Validation { errors });
        }

        Ok(DepartmentPayload {
            code,
            name,
            description,
            head_id,
            established_date,
            contact_email,
            contact_phone,
            building_location,
            budget_allocation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_format() {
        assert!(code_format_ok("CS"));
        assert!(code_format_ok("A1"));
        assert!(code_format_ok("MATH2024"));
        assert!(!code_format_ok(""));
        assert!(!code_format_ok("X"));
        assert!(!code_format_ok("TOO-LONG-CODE-123"));
        assert!(!code_format_ok("AB CD"));
        assert!(!code_format_ok("计算机"));
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(&None), None);
        assert_eq!(normalize_optional(&Some("  ".to_string())), None);
        assert_eq!(
            normalize_optional(&Some(" x ".to_string())),
            Some("x".to_string())
        );
    }
}
