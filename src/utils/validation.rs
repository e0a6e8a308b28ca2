use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::{ValidationError, ValidationErrors};

static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

pub const USERNAME_MAX_LENGTH: usize = 150;
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// 带提示信息的校验错误
pub fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// 单字段错误集合，用于服务层返回的表单错误
pub fn single_error(field: &'static str, code: &'static str, message: &'static str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, field_error(code, message));
    errors
}

/// 将校验错误转换为 字段 -> 提示信息 列表，供模板渲染
pub fn form_errors(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            (
                field.to_string(),
                errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| "Invalid value".to_string())
                    })
                    .collect::<Vec<_>>(),
            )
        })
        .collect()
}

/// 必填文本：去除首尾空白后不能为空
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(field_error("required", "This field is required."));
    }
    Ok(())
}

/// 用户名：1-150 个字符，只能包含字母、数字和 @/./+/-/_
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(field_error("required", "This field is required."));
    }

    if username.chars().count() > USERNAME_MAX_LENGTH {
        return Err(field_error(
            "max_length",
            "Ensure this value has at most 150 characters.",
        ));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(field_error(
            "invalid",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }

    Ok(())
}

/// 可选邮箱：为空时跳过校验
pub fn validate_optional_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || validator::validate_email(email) {
        Ok(())
    } else {
        Err(field_error("invalid", "Enter a valid email address."))
    }
}

pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(field_error(
            "password_too_short",
            "This password is too short. It must contain at least 8 characters.",
        ));
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(field_error(
            "password_entirely_numeric",
            "This password is entirely numeric.",
        ));
    }

    Ok(())
}

/// 只允许站内绝对路径作为登录后的跳转目标
pub fn is_safe_redirect(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}
